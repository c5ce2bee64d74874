//! Segmented newsfeed browsing
//!
//! Splits the virtual-user population by id: one in ten browses the
//! important-only feed, two in ten browse a single-kind filtered feed and
//! the rest scroll the normal newsfeed. The segmented feeds fall back to a
//! short normal-feed session once their pages run out.

use async_trait::async_trait;
use stampede_client::types::ContentKind;

use super::newsfeed::browse_newsfeed;
use super::{ratio, Scenario};
use crate::actions;
use crate::context::VuContext;
use crate::errors::ScenarioResult;

pub struct FilterNewsfeedScenario;

#[async_trait]
impl Scenario for FilterNewsfeedScenario {
    fn name(&self) -> &'static str {
        "filter-newsfeed"
    }

    async fn run(&self, ctx: &VuContext) -> ScenarioResult<()> {
        match ctx.vu_id() % 10 {
            1 => important_newsfeed(ctx).await,
            2 | 3 => filtered_newsfeed(ctx).await,
            _ => browse_newsfeed(ctx, 25).await,
        }
    }
}

/// Browse up to five pages of the important-only feed
async fn important_newsfeed(ctx: &VuContext) -> ScenarioResult<()> {
    let pages = ctx.random(0, 5);
    let mut cursor: Option<String> = None;
    let mut exhausted = false;

    let mut acted = 0u64;
    let mut loaded = 0u64;

    for page_index in 0..pages {
        if exhausted {
            return browse_newsfeed(ctx, 10).await;
        }

        let page = ctx
            .observe(ctx.actor().important_newsfeed(cursor.as_deref()))
            .await?;
        loaded += page.list.len() as u64;

        if ctx.random(0, 3) == 1 {
            for (item_index, content) in page.list.iter().enumerate() {
                let mut has_reaction = false;
                let mut has_mark = false;
                let mut has_read = false;

                if content.kind != ContentKind::Series && ratio(acted, loaded) < 0.08 {
                    has_reaction = actions::maybe_react(
                        ctx,
                        &content.id,
                        content.kind.as_str(),
                        &content.owner_reactions,
                    )
                    .await?;
                }

                if content.kind == ContentKind::Post && ratio(acted, loaded) < 0.05 {
                    // Short read of the post body before marking it
                    ctx.pause_secs(5).await;
                    has_mark = actions::maybe_mark_as_read(ctx, &content.id).await?;
                }

                if content.kind == ContentKind::Article && ratio(acted, loaded) < 0.05 {
                    has_read = actions::maybe_read_content(ctx, content).await?;
                    has_mark = actions::maybe_mark_as_read(ctx, &content.id).await?;
                }

                if (page_index * 20 + item_index as u64) % 50 == 0 {
                    actions::save_from_menu(ctx, &content.id).await?;
                }

                if has_reaction || has_mark || has_read {
                    acted += 1;
                }
            }
        } else {
            ctx.pause_between(2, 30).await;
        }

        if page.meta.has_next_page {
            cursor = page.meta.end_cursor.clone();
        } else {
            exhausted = true;
        }
    }
    Ok(())
}

/// Browse up to ten pages of the feed filtered to one content kind
async fn filtered_newsfeed(ctx: &VuContext) -> ScenarioResult<()> {
    let pages = ctx.random(0, 10);
    let filter_kind = if ctx.random(0, 1) == 0 {
        ContentKind::Post
    } else {
        ContentKind::Article
    };

    let mut cursor: Option<String> = None;
    let mut exhausted = false;

    let mut acted = 0u64;
    let mut loaded = 0u64;

    for _ in 0..pages {
        if exhausted {
            return browse_newsfeed(ctx, 10).await;
        }

        let page = ctx
            .observe(ctx.actor().filtered_newsfeed(filter_kind, cursor.as_deref()))
            .await?;
        loaded += page.list.len() as u64;

        if ctx.random(0, 3) == 1 {
            for content in &page.list {
                let mut has_reaction = false;
                let mut has_read = false;

                if ratio(acted, loaded) < 0.1 {
                    has_reaction = actions::maybe_react(
                        ctx,
                        &content.id,
                        content.kind.as_str(),
                        &content.owner_reactions,
                    )
                    .await?;
                }

                // The post branch keys on the feed filter, the article
                // branch on the item's own kind
                if filter_kind == ContentKind::Post && ratio(acted, loaded) < 0.05 {
                    ctx.pause_secs(5).await;
                    if content.setting.is_important
                        && !content.marked_read_post
                        && ratio(acted, loaded) < 0.0025
                    {
                        actions::maybe_mark_as_read(ctx, &content.id).await?;
                    }
                }

                if content.kind == ContentKind::Article && ratio(acted, loaded) < 0.05 {
                    has_read = actions::maybe_read_content(ctx, content).await?;
                    if content.setting.is_important
                        && !content.marked_read_post
                        && ratio(acted, loaded) < 0.0025
                    {
                        actions::maybe_mark_as_read(ctx, &content.id).await?;
                    }
                }

                if has_reaction || has_read {
                    acted += 1;
                }
            }
        } else {
            ctx.pause_between(2, 30).await;
        }

        if page.meta.has_next_page {
            cursor = page.meta.end_cursor.clone();
        } else {
            exhausted = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn empty_feed() -> serde_json::Value {
        json!({
            "code": "api.ok",
            "data": {
                "list": [],
                "meta": { "hasNextPage": false, "endCursor": null }
            }
        })
    }

    #[tokio::test]
    async fn test_population_splits_by_vu_id() {
        let harness = testing::harness().await;
        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_feed()))
            .mount(&harness.server)
            .await;

        let scenario = FilterNewsfeedScenario;

        // VU 11 reads the important feed, VU 12 the filtered one, VU 14 the
        // normal one
        scenario.run(&harness.context(11, 1)).await.unwrap();
        scenario.run(&harness.context(12, 1)).await.unwrap();
        scenario.run(&harness.context(14, 1)).await.unwrap();

        let requests = harness.server.received_requests().await.unwrap();
        let important = requests
            .iter()
            .filter(|r| r.url.query_pairs().any(|(k, v)| k == "is_important" && v == "true"))
            .count();
        let filtered = requests
            .iter()
            .filter(|r| r.url.query_pairs().any(|(k, _)| k == "type"))
            .count();
        let plain = requests.len() - important - filtered;

        // The segmented feeds may roll zero pages; the normal feed always
        // loads at least five or runs dry trying
        assert!(important <= 1);
        assert!(filtered <= 1);
        assert!(plain >= 1);
    }

    #[tokio::test]
    async fn test_exhausted_filtered_feed_falls_back_to_the_normal_feed() {
        let harness = testing::harness().await;
        // Filtered feed claims another page exists so the walk continues,
        // then the cursor-bearing call ends it and the fallback kicks in
        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .and(query_param("after", "deeper"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_feed()))
            .mount(&harness.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "list": [],
                    "meta": { "hasNextPage": true, "endCursor": "deeper" }
                }
            })))
            .mount(&harness.server)
            .await;

        let scenario = FilterNewsfeedScenario;
        let mut fell_back = false;
        for seed in 0..60 {
            scenario.run(&harness.context(12, seed)).await.unwrap();
            fell_back = harness
                .server
                .received_requests()
                .await
                .unwrap()
                .iter()
                .any(|r| {
                    r.url.query_pairs().all(|(k, _)| k != "type")
                        && r.url.path() == "/content/newsfeed"
                });
            if fell_back {
                break;
            }
        }
        // Needs a run that rolls three or more filtered pages; sixty tries
        // make that a near certainty
        assert!(fell_back);
    }
}
