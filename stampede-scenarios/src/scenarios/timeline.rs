//! Group timeline browsing

use async_trait::async_trait;

use super::Scenario;
use crate::context::VuContext;
use crate::errors::ScenarioResult;

/// Pages through the timeline of one configured group
///
/// Pure read pressure on the timeline endpoint; nothing is acted on.
pub struct TimelineScenario {
    group_ids: Vec<String>,
}

impl TimelineScenario {
    pub fn new(group_ids: Vec<String>) -> Self {
        Self { group_ids }
    }
}

#[async_trait]
impl Scenario for TimelineScenario {
    fn name(&self) -> &'static str {
        "timeline"
    }

    async fn run(&self, ctx: &VuContext) -> ScenarioResult<()> {
        let group_id = &self.group_ids[ctx.random_index(self.group_ids.len())];
        let pages = ctx.random(1, 5);
        let mut cursor: Option<String> = None;

        for _ in 0..pages {
            let page = ctx
                .observe(ctx.actor().timeline(group_id, cursor.as_deref()))
                .await?;
            if page.meta.has_next_page {
                cursor = page.meta.end_cursor.clone();
            } else {
                break;
            }
        }
        Ok(())
    }
}
