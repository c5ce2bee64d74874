//! Data provisioning commands
//!
//! The flows that get an environment ready for a load run: fill a seeded
//! community's group with its expected members, publish the posts the feed
//! scenarios browse and pair generated quizzes with published posts.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use stampede_client::types::{Community, ContentSummary, PublishPost};
use stampede_client::Page;
use stampede_config::StampedeConfig;
use stampede_seed::export::QuizTables;
use stampede_seed::quiz::{DEFAULT_ANSWERS, DEFAULT_QUESTIONS};
use stampede_seed::{content as seed_content, SeedCommunity, SeedQuiz, UserSeeder};
use tracing::{info, warn};

use super::Platform;

/// How many members of a community publish posts
const CONTENT_PUBLISHERS: u32 = 10;

/// Upper bound of the random pause before each parallel platform call
const CALL_JITTER: Duration = Duration::from_secs(10);

/// Paragraphs per seeded post body
const POST_PARAGRAPHS: usize = 3;

/// Random pause so bursts of parallel calls do not land at the same instant
async fn jitter(cap: Duration) {
    let cap_ms = cap.as_millis() as u64;
    if cap_ms > 0 {
        tokio::time::sleep(Duration::from_millis(fastrand::u64(0..cap_ms))).await;
    }
}

/// Join every missing seed user into the community group and approve them
pub async fn members(
    config: &StampedeConfig,
    community_index: u32,
    count: Option<u32>,
) -> Result<()> {
    let platform = Platform::connect(config, None)?;
    let session = platform.admin_session().await?;
    let admin = platform.admin();
    let seeder = UserSeeder::new(
        config.seed.clone(),
        config.identity.default_password.clone(),
    );

    let community_name = SeedCommunity::community_name(&config.seed, community_index);
    let community = admin
        .find_community_by_name(&community_name)
        .await
        .context("Community lookup failed")?
        .with_context(|| format!("Community '{}' not found", community_name))?;

    let expected = count.unwrap_or(config.seed.users);
    let present: HashSet<String> = admin
        .community_members(&community.id, expected)
        .await
        .context("Failed to list community members")?
        .into_iter()
        .map(|member| member.username)
        .collect();

    let missing: Vec<String> = (1..=expected)
        .map(|n| seeder.username(n))
        .filter(|name| !present.contains(name))
        .collect();

    if missing.is_empty() {
        println!(
            "{}",
            format!(
                "All {} members already present in '{}'",
                expected, community_name
            )
            .green()
        );
        return Ok(());
    }

    info!(
        community = community_name.as_str(),
        present = present.len(),
        missing = missing.len(),
        "Filling community membership"
    );

    if community.owner_id.is_empty() {
        bail!(
            "Community '{}' has no owner on record; cannot manage join requests",
            community_name
        );
    }
    let owner = admin
        .find_user_by_id(&community.owner_id)
        .await
        .context("Failed to resolve the community owner")?;
    let owner_actor = platform.actor(&owner.username);

    // Stale pending requests would get approved alongside the new ones
    owner_actor
        .decline_all_join_requests(&community.group_id)
        .await
        .context("Failed to decline pending join requests")?;

    let joins = missing.iter().map(|username| {
        let actor = platform.actor(username);
        let group_id = community.group_id.clone();
        async move {
            jitter(CALL_JITTER).await;
            (username, actor.join_group(&group_id).await)
        }
    });

    let mut failed = 0usize;
    for (username, result) in join_all(joins).await {
        if let Err(err) = result {
            warn!(username = username.as_str(), error = %err, "Join request failed");
            failed += 1;
        }
    }

    // Approve whatever arrived even when some join calls failed; the rerun
    // only has to cover the failures
    owner_actor
        .approve_all_join_requests(&community.group_id)
        .await
        .context("Failed to approve join requests")?;

    println!(
        "{}",
        format!(
            "Joined and approved {} of {} missing members in '{}'",
            missing.len() - failed,
            missing.len(),
            community_name
        )
        .green()
    );
    session.close();
    if failed > 0 {
        bail!("{} join request(s) failed; rerun to retry them", failed);
    }
    Ok(())
}

/// Publish seed posts into consecutive communities
pub async fn content(config: &StampedeConfig, community_index: u32, count: u32) -> Result<()> {
    let platform = Platform::connect(config, None)?;
    let session = platform.admin_session().await?;
    let admin = platform.admin();

    for community_number in community_index..community_index + count {
        let community_name = SeedCommunity::community_name(&config.seed, community_number);
        let Some(community) = admin
            .find_community_by_name(&community_name)
            .await
            .context("Community lookup failed")?
        else {
            warn!(
                community = community_name.as_str(),
                "Community not found, stopping"
            );
            break;
        };

        publish_community_posts(&platform, &community, config.seed.contents_per_member)
            .await
            .with_context(|| format!("Publishing into '{}' failed", community_name))?;
    }

    session.close();
    println!("{}", "Content provisioning finished".green());
    Ok(())
}

/// Ten members each draft and publish their slice of the community's posts
async fn publish_community_posts(
    platform: &Platform,
    community: &Community,
    per_member: u32,
) -> Result<()> {
    let publishers = platform
        .admin()
        .community_members(&community.id, CONTENT_PUBLISHERS)
        .await
        .context("Failed to list publishing members")?;
    if publishers.is_empty() {
        bail!("Community '{}' has no members to publish as", community.name);
    }

    let mut published = 0usize;
    let mut failed = 0usize;
    for (member_index, member) in publishers.iter().enumerate() {
        let actor = platform.actor(&member.username);
        let posts = (0..per_member).map(|offset| {
            let index = member_index as u32 * per_member + offset + 1;
            let title = seed_content::post_title(&community.name, index);
            let body = seed_content::post_body(&title, POST_PARAGRAPHS);
            let actor = actor.clone();
            let group_id = community.group_id.clone();
            async move {
                jitter(CALL_JITTER).await;
                let draft = actor
                    .create_draft_post(std::slice::from_ref(&group_id))
                    .await?;
                let publish = PublishPost {
                    content: body,
                    group_ids: vec![group_id],
                    series_ids: Vec::new(),
                };
                actor.publish_post(&draft.id, &publish).await
            }
        });

        for result in join_all(posts).await {
            match result {
                Ok(()) => published += 1,
                Err(err) => {
                    warn!(error = %err, "Publishing a post failed");
                    failed += 1;
                }
            }
        }
        jitter(CALL_JITTER).await;
    }

    info!(
        community = community.name.as_str(),
        published, failed, "Community content pass done"
    );
    if failed > 0 {
        bail!("{} post(s) failed to publish", failed);
    }
    Ok(())
}

/// Pair generated quizzes with the newest published posts of a group and
/// write the quiz import tables
pub async fn quizzes(
    config: &StampedeConfig,
    group_id: &str,
    count: usize,
    out: &Path,
) -> Result<()> {
    let platform = Platform::connect(config, None)?;
    let session = platform.admin_session().await?;
    let admin = platform.admin();
    let actor = admin.actor();

    let mut contents: Vec<ContentSummary> = Vec::with_capacity(count);
    let mut after: Option<String> = None;
    while contents.len() < count {
        let page = actor
            .timeline(group_id, after.as_deref())
            .await
            .context("Timeline page fetch failed")?;
        let Page { list, meta } = page;
        if list.is_empty() {
            break;
        }
        after = meta.end_cursor;
        contents.extend(list);
        if !meta.has_next_page {
            break;
        }
    }
    if contents.len() < count {
        bail!(
            "Group {} has {} published post(s), need {}; run `stampede provision content` first",
            group_id,
            contents.len(),
            count
        );
    }
    contents.truncate(count);
    session.close();

    let quizzes: Vec<_> = contents
        .iter()
        .enumerate()
        .map(|(i, post)| {
            SeedQuiz::generate(i as u32 + 1, DEFAULT_QUESTIONS, DEFAULT_ANSWERS)
                .publish(post.id.as_str(), post.created_by.as_str())
        })
        .collect();

    std::fs::create_dir_all(out).context("Failed to create output directory")?;
    let tables = QuizTables::new(out);
    tables
        .append(&quizzes)
        .context("Failed to write quiz tables")?;

    println!(
        "{}",
        format!(
            "Wrote {} quizzes to {}, {} and {}",
            quizzes.len(),
            tables.quiz_path().display(),
            tables.question_path().display(),
            tables.answer_path().display()
        )
        .green()
    );
    Ok(())
}
