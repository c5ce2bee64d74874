//! Group churn
//!
//! Discovers open groups, joins a handful and leaves one or two again. Only
//! groups whose settings are all switched off qualify; anything gated by
//! approval or questions would stall a load run on moderator action.

use std::collections::VecDeque;

use async_trait::async_trait;
use stampede_client::types::JoinStatus;

use super::Scenario;
use crate::context::VuContext;
use crate::errors::ScenarioResult;

pub struct JoinLeaveGroupScenario;

#[async_trait]
impl Scenario for JoinLeaveGroupScenario {
    fn name(&self) -> &'static str {
        "join-leave-group"
    }

    async fn run(&self, ctx: &VuContext) -> ScenarioResult<()> {
        let join_times = ctx.random(1, 10) as usize;
        let mut leave_times = ctx.random(1, 2);

        let candidates = discover_joinable(ctx, join_times).await?;
        let mut joined: VecDeque<String> = VecDeque::new();

        for group_id in candidates {
            let mut current = Some(group_id);
            while let Some(id) = current.take() {
                // The discover listing can be stale; the detail view decides
                let detail = ctx.observe(ctx.actor().group_detail(&id)).await?;
                if detail.join_status == JoinStatus::CanJoin {
                    ctx.observe(ctx.actor().join_group(&id)).await?;
                    joined.push_back(id);
                    break;
                }
                current = discover_joinable(ctx, 1).await?.into_iter().next();
            }
        }

        while leave_times > 0 {
            let id = match joined.pop_front() {
                Some(id) => id,
                None => break,
            };
            let detail = ctx.observe(ctx.actor().group_detail(&id)).await?;
            if detail.join_status == JoinStatus::Joined {
                ctx.observe(ctx.actor().leave_group(&id)).await?;
                leave_times -= 1;
            }
        }
        Ok(())
    }
}

/// Walk the discover listing until `wanted` joinable groups are collected
async fn discover_joinable(ctx: &VuContext, wanted: usize) -> ScenarioResult<Vec<String>> {
    let mut collected: Vec<String> = Vec::new();
    let mut offset = 0u64;

    loop {
        let page = ctx.observe(ctx.actor().discover_groups(offset)).await?;
        if page.list.is_empty() {
            break;
        }
        let has_next = page.meta.has_next_page;
        offset = page
            .meta
            .offset
            .unwrap_or(offset + page.list.len() as u64);

        let candidates: Vec<&str> = page
            .list
            .iter()
            .filter(|g| g.join_status == JoinStatus::CanJoin && g.settings_all_off())
            .map(|g| g.group_id.as_str())
            .collect();

        if !candidates.is_empty() {
            let needed = wanted.saturating_sub(collected.len()).min(candidates.len());
            if needed == 0 {
                break;
            }
            collected.extend(candidates.iter().take(needed).map(|id| id.to_string()));
        }

        if !has_next {
            break;
        }
    }
    Ok(collected)
}
