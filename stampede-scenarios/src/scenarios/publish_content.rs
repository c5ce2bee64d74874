//! Draft, edit and publish posts

use async_trait::async_trait;
use stampede_client::types::PublishPost;
use stampede_seed::content::{post_body, post_title};

use super::Scenario;
use crate::context::VuContext;
use crate::errors::{ScenarioError, ScenarioResult};

/// How many incremental draft saves one editing session produces
const DRAFT_SAVES: usize = 50;

/// Writes between one and five posts into the subject's audience groups
///
/// Each post goes through the full editor lifecycle: draft creation against
/// a random slice of the audience, fifty incremental saves while the body is
/// typed out, a review pause and the final publish. One in ten posts also
/// tries to generate a quiz from the published body.
pub struct PublishContentScenario;

#[async_trait]
impl Scenario for PublishContentScenario {
    fn name(&self) -> &'static str {
        "publish-content"
    }

    async fn run(&self, ctx: &VuContext) -> ScenarioResult<()> {
        let publishes = ctx.random(1, 5);

        for round in 0..publishes {
            let title = post_title(
                &ctx.subject().community_name,
                ctx.random(1, 100) as u32,
            );
            let body = post_body(&title, ctx.random(1, 8) as usize);

            let (post_id, group_ids) = create_draft(ctx).await?;
            let series_ids = pick_series(ctx, &group_ids).await?;
            type_out_draft(ctx, &post_id, &group_ids, &body).await?;

            // Review pause before committing the post
            ctx.pause_between(10, 60).await;
            let publish = PublishPost {
                content: body,
                group_ids: group_ids.clone(),
                series_ids,
            };
            ctx.observe(ctx.actor().publish_post(&post_id, &publish))
                .await?;

            if ctx.random(0, 9) == 1 && generate_quiz(ctx, &post_id).await? {
                ctx.metrics().quiz_generated();
            }

            if round < publishes - 1 {
                // Long gap before the next authoring session
                ctx.pause_between(300, 600).await;
            }
        }
        Ok(())
    }
}

/// Create a draft post against a random prefix of the audience groups
async fn create_draft(ctx: &VuContext) -> ScenarioResult<(String, Vec<String>)> {
    let audience = ctx.observe(ctx.actor().post_audience_groups()).await?;
    if audience.is_empty() {
        ctx.metrics().missing_audience();
        return Err(ScenarioError::NoAudienceGroups);
    }

    let take = ctx.random(1, audience.len() as u64) as usize;
    let group_ids: Vec<String> = audience.iter().take(take).map(|g| g.id.clone()).collect();

    let created = ctx
        .observe(ctx.actor().create_draft_post(&group_ids))
        .await?;
    Ok((created.id, group_ids))
}

/// Maybe attach existing series from the chosen groups
async fn pick_series(ctx: &VuContext, group_ids: &[String]) -> ScenarioResult<Vec<String>> {
    let wanted = ctx.random(0, 2) as usize;
    if wanted == 0 {
        return Ok(vec![]);
    }

    let page = ctx
        .observe(ctx.actor().series_for_groups(group_ids))
        .await?;
    let series_ids: Vec<String> = page.list.into_iter().map(|s| s.id).collect();

    if series_ids.len() <= wanted {
        return Ok(series_ids);
    }

    // Draws with replacement, as a user clicking suggestions would
    let picked = (0..wanted)
        .map(|_| series_ids[ctx.random_index(series_ids.len())].clone())
        .collect();
    Ok(picked)
}

/// Save the draft fifty times with a growing prefix of the body
async fn type_out_draft(
    ctx: &VuContext,
    post_id: &str,
    group_ids: &[String],
    body: &str,
) -> ScenarioResult<()> {
    let chars: Vec<char> = body.chars().collect();
    let part_len = (chars.len() + DRAFT_SAVES - 1) / DRAFT_SAVES;

    for save in 0..DRAFT_SAVES {
        ctx.pause_secs(5).await;
        let end = ((save + 1) * part_len).min(chars.len());
        let prefix: String = chars[..end].iter().collect();
        ctx.observe(ctx.actor().save_draft_post(post_id, group_ids, &prefix))
            .await?;
    }
    Ok(())
}

/// Generate a quiz from the post if the menu allows it
async fn generate_quiz(ctx: &VuContext, post_id: &str) -> ScenarioResult<bool> {
    let settings = ctx.observe(ctx.actor().menu_settings(post_id)).await?;
    if !settings.can_create_quiz {
        return Ok(false);
    }
    ctx.observe(ctx.actor().generate_quiz(post_id)).await?;
    Ok(true)
}
