//! Shared content interactions
//!
//! The feed scenarios act on content through the same small set of moves:
//! react, mark important items read, save through the menu, open the detail
//! view and work the comment thread. Each move carries its own dice roll so
//! only a fraction of encounters turn into requests, which keeps the write
//! load a realistic sliver of the browse load.

use stampede_client::types::{ContentKind, ContentSummary, OwnerReaction};

use crate::context::VuContext;
use crate::errors::ScenarioResult;

/// Reactions a subject cycles through, in placement order
pub(crate) const REACTION_NAMES: [&str; 7] = [
    "react_thumbs_up",
    "react_sparkling_heart",
    "react_partying_face",
    "react_grinning_face_with_smiling_eyes",
    "react_hugging_face",
    "react_clapping_hands",
    "react_fire",
];

/// One-in-six chance to place reactions the subject has not used yet
///
/// Returns whether any reaction was placed.
pub(crate) async fn maybe_react(
    ctx: &VuContext,
    target_id: &str,
    target_kind: &str,
    owned: &[OwnerReaction],
) -> ScenarioResult<bool> {
    if ctx.random(0, 5) != 1 {
        return Ok(false);
    }

    let candidates: Vec<&str> = REACTION_NAMES
        .iter()
        .filter(|name| !owned.iter().any(|placed| placed.reaction_name == **name))
        .copied()
        .collect();
    if candidates.is_empty() {
        return Ok(false);
    }

    let times = ctx.random(1, candidates.len() as u64) as usize;
    for name in candidates.iter().take(times) {
        ctx.pause_between(1, 4).await;
        ctx.observe(ctx.actor().react(target_id, target_kind, name))
            .await?;
    }
    Ok(true)
}

/// One-in-six chance to mark an important item as read
pub(crate) async fn maybe_mark_as_read(ctx: &VuContext, content_id: &str) -> ScenarioResult<bool> {
    if ctx.random(0, 5) != 1 {
        return Ok(false);
    }
    ctx.observe(ctx.actor().mark_as_read(content_id)).await?;
    Ok(true)
}

/// Save a content item unless the menu says it already is
pub(crate) async fn save_from_menu(ctx: &VuContext, content_id: &str) -> ScenarioResult<()> {
    let settings = ctx.observe(ctx.actor().menu_settings(content_id)).await?;
    if !settings.is_save {
        ctx.observe(ctx.actor().save_content(content_id)).await?;
    }
    Ok(())
}

/// One-in-six chance to open a content item and dwell on it
///
/// Reading pulls the detail view, lingers, and for posts and articles works
/// the comment thread and leaves a comment of its own. Returns whether the
/// item was read.
pub(crate) async fn maybe_read_content(
    ctx: &VuContext,
    content: &ContentSummary,
) -> ScenarioResult<bool> {
    if ctx.random(0, 5) != 1 {
        return Ok(false);
    }

    ctx.observe(ctx.actor().content_detail(&content.id, content.kind))
        .await?;
    ctx.pause_between(15, 180).await;

    if matches!(content.kind, ContentKind::Post | ContentKind::Article) {
        browse_comments(ctx, &content.id).await?;
        leave_comment(ctx, &content.id).await?;
    }
    Ok(true)
}

/// Page through a comment thread, reacting and replying along the way
///
/// At most five comments get a reaction and at most one gets a reply per
/// thread visit.
pub(crate) async fn browse_comments(ctx: &VuContext, content_id: &str) -> ScenarioResult<()> {
    let pages = ctx.random(1, 5);
    let mut cursor: Option<String> = None;
    let mut reacted = 0;
    let mut replied = false;

    for _ in 0..pages {
        let page = ctx
            .observe(ctx.actor().comments(content_id, cursor.as_deref()))
            .await?;

        if ctx.random(0, 1) == 1 {
            for comment in &page.list {
                if reacted < 5
                    && maybe_react(ctx, &comment.id, "COMMENT", &comment.owner_reactions).await?
                {
                    reacted += 1;
                }
                if !replied {
                    replied = maybe_reply(ctx, content_id, &comment.id).await?;
                }
            }
        } else {
            ctx.pause_between(2, 20).await;
        }

        if page.meta.has_next_page {
            cursor = page.meta.end_cursor.clone();
        } else {
            break;
        }
    }
    Ok(())
}

/// One-in-six chance to reply to a comment
async fn maybe_reply(ctx: &VuContext, content_id: &str, comment_id: &str) -> ScenarioResult<bool> {
    if ctx.random(0, 5) != 1 {
        return Ok(false);
    }
    ctx.pause_between(3, 10).await;
    ctx.observe(
        ctx.actor()
            .reply_comment(content_id, comment_id, "This is a reply comment"),
    )
    .await?;
    Ok(true)
}

/// Leave a top-level comment of random length
pub(crate) async fn leave_comment(ctx: &VuContext, content_id: &str) -> ScenarioResult<()> {
    ctx.pause_between(3, 10).await;
    let text = ctx.letters(ctx.random(10, 2000) as usize);
    ctx.observe(ctx.actor().comment(content_id, &text)).await?;
    Ok(())
}
