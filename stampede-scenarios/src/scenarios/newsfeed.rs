//! Home newsfeed browsing

use async_trait::async_trait;
use stampede_client::types::ContentKind;

use super::{ratio, Scenario};
use crate::actions;
use crate::context::VuContext;
use crate::errors::ScenarioResult;

/// Scrolls the home newsfeed and acts on a fraction of what it sees
pub struct NewsfeedScenario;

#[async_trait]
impl Scenario for NewsfeedScenario {
    fn name(&self) -> &'static str {
        "newsfeed"
    }

    async fn run(&self, ctx: &VuContext) -> ScenarioResult<()> {
        browse_newsfeed(ctx, 25).await
    }
}

/// Scroll between five and `max_pages` newsfeed pages
///
/// Per page the subject either acts on the loaded content or just keeps
/// scrolling. Action rates are held against everything loaded so far: about
/// 8 in 100 items get a reaction, 5 in 100 important ones a mark-as-read,
/// 5 in 100 a full read, and every fiftieth item is saved.
pub(super) async fn browse_newsfeed(ctx: &VuContext, max_pages: u64) -> ScenarioResult<()> {
    let pages = ctx.random(5, max_pages);
    let mut cursor: Option<String> = None;

    let mut reacted = 0u64;
    let mut marked_read = 0u64;
    let mut read = 0u64;
    let mut loaded = 0u64;

    for page_index in 0..pages {
        let page = ctx.observe(ctx.actor().newsfeed(cursor.as_deref())).await?;
        loaded += page.list.len() as u64;

        if ctx.random(0, 3) == 1 {
            for (item_index, content) in page.list.iter().enumerate() {
                if content.kind != ContentKind::Series
                    && ratio(reacted, loaded) < 0.08
                    && actions::maybe_react(
                        ctx,
                        &content.id,
                        content.kind.as_str(),
                        &content.owner_reactions,
                    )
                    .await?
                {
                    reacted += 1;
                }

                if content.setting.is_important {
                    // Dwell on the important item before deciding on it
                    ctx.pause_secs(3).await;
                    if !content.marked_read_post
                        && ratio(marked_read, loaded) < 0.05
                        && actions::maybe_mark_as_read(ctx, &content.id).await?
                    {
                        marked_read += 1;
                    }
                }

                if (page_index * 20 + item_index as u64) % 50 == 0 {
                    actions::save_from_menu(ctx, &content.id).await?;
                }

                if ratio(read, loaded) < 0.05
                    && actions::maybe_read_content(ctx, content).await?
                {
                    read += 1;
                }
            }
        } else {
            // Keep scrolling without touching anything
            ctx.pause_between(2, 30).await;
        }

        if page.meta.has_next_page {
            cursor = page.meta.end_cursor.clone();
        } else {
            break;
        }
    }
    Ok(())
}
