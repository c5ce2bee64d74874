//! Seed content bodies
//!
//! Post bodies are generated from their title so provisioning runs can be
//! re-entered: the same community produces the same drafts every time. The
//! text itself only has to look like prose to the platform (length checks,
//! feed rendering); it carries no meaning.

const WORDS: &[&str] = &[
    "platform", "community", "launch", "signal", "network", "release", "update", "member",
    "feature", "thread", "report", "digest", "weekly", "meetup", "project", "roadmap", "design",
    "review", "support", "answer", "notice", "survey", "result", "summary", "detail", "moment",
    "story", "change", "growth", "impact",
];

const SENTENCES_PER_PARAGRAPH: usize = 4;

/// Title of seed post `index` in a community
pub fn post_title(community_name: &str, index: u32) -> String {
    format!("{} - Post {}", community_name, index)
}

/// Deterministic prose body for a titled post
///
/// The title leads the body so seeded posts stay recognizable in the feed.
pub fn post_body(title: &str, paragraphs: usize) -> String {
    let seed = title.bytes().fold(0u64, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(u64::from(b))
    });
    let mut rng = fastrand::Rng::with_seed(seed);

    let mut body = String::from(title);
    for _ in 0..paragraphs {
        body.push_str("\n\n");
        body.push_str(&paragraph(&mut rng));
    }
    body
}

fn paragraph(rng: &mut fastrand::Rng) -> String {
    (0..SENTENCES_PER_PARAGRAPH)
        .map(|_| sentence(rng))
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentence(rng: &mut fastrand::Rng) -> String {
    let words = rng.usize(6..=12);
    let mut sentence = String::new();
    for i in 0..words {
        if i > 0 {
            sentence.push(' ');
        }
        sentence.push_str(WORDS[rng.usize(..WORDS.len())]);
    }

    let mut chars = sentence.chars();
    let first = match chars.next() {
        Some(c) => c.to_ascii_uppercase(),
        None => return sentence,
    };
    format!("{}{}.", first, chars.as_str())
}
