//! Quiz taking
//!
//! Pulls the timeline of one quiz-bearing group, opens a random quiz and
//! answers it under its time limit. Answers are resubmitted cumulatively the
//! way the quiz editor autosaves, and the attempt is either submitted or
//! deliberately left to expire.

use async_trait::async_trait;
use chrono::Utc;
use stampede_client::types::{QuizAnswer, QuizAttempt};

use super::Scenario;
use crate::context::VuContext;
use crate::errors::ScenarioResult;

/// Seconds before the deadline at which no more answers are sent
const TIME_UP_MARGIN_SECS: i64 = 5;

pub struct AnswerQuizScenario {
    group_id: String,
    excluded_vus: Vec<u32>,
}

impl AnswerQuizScenario {
    pub fn new(group_id: String, excluded_vus: Vec<u32>) -> Self {
        Self {
            group_id,
            excluded_vus,
        }
    }
}

#[async_trait]
impl Scenario for AnswerQuizScenario {
    fn name(&self) -> &'static str {
        "answer-quiz"
    }

    async fn run(&self, ctx: &VuContext) -> ScenarioResult<()> {
        // Some accounts are known-bad in the quiz tables; skip them
        if self.excluded_vus.contains(&ctx.vu_id()) {
            return Ok(());
        }

        let page = ctx
            .observe(ctx.actor().timeline(&self.group_id, None))
            .await?;
        let with_quiz: Vec<_> = page.list.iter().filter(|c| c.quiz.is_some()).collect();
        if with_quiz.is_empty() {
            ctx.metrics().missing_quiz();
            return Ok(());
        }

        let picked = with_quiz[ctx.random_index(with_quiz.len())];
        let detail = ctx
            .observe(ctx.actor().content_detail(&picked.id, picked.kind))
            .await?;
        let content = detail.unwrap_or_else(|| (*picked).clone());

        let takes = ctx.random(1, 5);
        for _ in 0..takes {
            // Resume the open attempt if one exists, otherwise start fresh
            let participant_id = match &content.quiz_doing {
                Some(doing) => doing.quiz_participant_id.clone(),
                None => match &content.quiz {
                    Some(quiz) => ctx.observe(ctx.actor().start_quiz(&quiz.id)).await?,
                    None => break,
                },
            };

            let attempt = ctx
                .observe(ctx.actor().quiz_attempt(&participant_id))
                .await?;
            let answers = answer_questions(ctx, &participant_id, &attempt).await?;
            finish_attempt(ctx, &participant_id, &attempt, &answers).await?;
            ctx.observe(ctx.actor().quiz_attempt(&participant_id))
                .await?;

            // Rest before the next go
            ctx.pause_secs(3).await;
        }
        Ok(())
    }
}

/// Answer a random number of questions, resubmitting the growing answer set
async fn answer_questions(
    ctx: &VuContext,
    participant_id: &str,
    attempt: &QuizAttempt,
) -> ScenarioResult<Vec<QuizAnswer>> {
    let mut answers: Vec<QuizAnswer> = Vec::new();
    if attempt.questions.is_empty() {
        return Ok(answers);
    }

    let answering = ctx.random(1, attempt.questions.len() as u64) as usize;
    for question in attempt.questions.iter().take(answering) {
        // Reading and picking takes a few seconds per question
        ctx.pause_between(3, 10).await;
        if attempt.time_up_at(Utc::now(), TIME_UP_MARGIN_SECS) {
            continue;
        }
        if question.answers.is_empty() {
            continue;
        }

        let picked = &question.answers[ctx.random_index(question.answers.len())];
        answers.push(QuizAnswer {
            question_id: question.id.clone(),
            answer_id: picked.id.clone(),
        });
        ctx.observe(ctx.actor().answer_quiz(participant_id, &answers))
            .await?;
    }
    Ok(answers)
}

/// Submit the attempt, or sit out the clock three times in four
async fn finish_attempt(
    ctx: &VuContext,
    participant_id: &str,
    attempt: &QuizAttempt,
    answers: &[QuizAnswer],
) -> ScenarioResult<()> {
    if ctx.random(0, 3) != 0 {
        ctx.pause_between(3, 10).await;
        if !attempt.time_up_at(Utc::now(), TIME_UP_MARGIN_SECS) {
            ctx.observe(ctx.actor().finish_quiz(participant_id, answers))
                .await?;
        }
    } else if !attempt.time_up_at(Utc::now(), TIME_UP_MARGIN_SECS) {
        let elapsed = (Utc::now() - attempt.started_at).num_seconds();
        let remaining = attempt.time_limit as i64 - elapsed;
        if remaining > 0 {
            ctx.pause_secs(remaining as u64).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn scenario() -> AnswerQuizScenario {
        AnswerQuizScenario::new("g-quiz".to_string(), vec![98])
    }

    fn timeline_with_quiz() -> serde_json::Value {
        json!({
            "code": "api.ok",
            "data": {
                "list": [
                    { "id": "c-plain", "type": "POST" },
                    {
                        "id": "c-quiz",
                        "type": "POST",
                        "quiz": { "id": "q-1" }
                    }
                ],
                "meta": { "hasNextPage": false, "endCursor": null }
            }
        })
    }

    async fn mount_quiz_routes(harness: &testing::TestHarness, questions: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/content/timeline/g-quiz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timeline_with_quiz()))
            .mount(&harness.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/posts/c-quiz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "id": "c-quiz",
                    "type": "POST",
                    "quiz": { "id": "q-1" }
                }
            })))
            .mount(&harness.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content/quizzes/q-1/start"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "code": "api.ok", "data": "p-1" })),
            )
            .mount(&harness.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/quiz-participants/p-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "questions": questions,
                    "startedAt": Utc::now().to_rfc3339(),
                    "timeLimit": 1800
                }
            })))
            .mount(&harness.server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/content/quiz-participants/p-1/answers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok", "data": {}
            })))
            .mount(&harness.server)
            .await;
    }

    #[tokio::test]
    async fn test_excluded_vu_does_nothing() {
        let harness = testing::harness().await;
        scenario().run(&harness.context(98, 1)).await.unwrap();
        assert!(harness.server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quizless_timeline_counts_and_ends_quietly() {
        let harness = testing::harness().await;
        Mock::given(method("GET"))
            .and(path("/content/timeline/g-quiz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "list": [{ "id": "c-plain", "type": "POST" }],
                    "meta": { "hasNextPage": false, "endCursor": null }
                }
            })))
            .expect(1)
            .mount(&harness.server)
            .await;

        scenario().run(&harness.context(7, 2)).await.unwrap();
        assert_eq!(harness.metrics.summarize().await.missing_quizzes, 1);
    }

    #[tokio::test]
    async fn test_answers_accumulate_within_one_attempt() {
        let harness = testing::harness().await;
        mount_quiz_routes(
            &harness,
            json!([
                { "id": "qq-1", "answers": [{ "id": "a-1" }, { "id": "a-2" }] },
                { "id": "qq-2", "answers": [{ "id": "b-1" }] },
                { "id": "qq-3", "answers": [{ "id": "c-1" }] }
            ]),
        )
        .await;

        scenario().run(&harness.context(7, 11)).await.unwrap();

        let requests = harness.server.received_requests().await.unwrap();
        let answer_lens: Vec<usize> = requests
            .iter()
            .filter(|r| r.url.path() == "/content/quiz-participants/p-1/answers")
            .filter_map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).ok()?;
                if body.get("is_finished").is_some() {
                    return None;
                }
                Some(body["answers"].as_array().unwrap().len())
            })
            .collect();

        // Each save carries everything answered so far; a new attempt
        // starts the set over
        assert!(!answer_lens.is_empty());
        assert_eq!(answer_lens[0], 1);
        for pair in answer_lens.windows(2) {
            assert!(pair[1] == pair[0] + 1 || pair[1] == 1);
        }

        // The attempt state is read before and after every take
        let attempt_reads = requests
            .iter()
            .filter(|r| r.url.path() == "/content/quiz-participants/p-1")
            .count();
        assert!(attempt_reads >= 2 && attempt_reads % 2 == 0);
    }

    #[tokio::test]
    async fn test_open_attempt_is_resumed_without_starting_again() {
        let harness = testing::harness().await;
        Mock::given(method("GET"))
            .and(path("/content/timeline/g-quiz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timeline_with_quiz()))
            .mount(&harness.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/posts/c-quiz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "id": "c-quiz",
                    "type": "POST",
                    "quiz": { "id": "q-1" },
                    "quizDoing": { "quizParticipantId": "p-1" }
                }
            })))
            .mount(&harness.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/quiz-participants/p-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "questions": [],
                    "startedAt": Utc::now().to_rfc3339(),
                    "timeLimit": 1800
                }
            })))
            .mount(&harness.server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/content/quiz-participants/p-1/answers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok", "data": {}
            })))
            .mount(&harness.server)
            .await;

        scenario().run(&harness.context(7, 5)).await.unwrap();

        let requests = harness.server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| !r.url.path().ends_with("/start")));
        assert!(requests
            .iter()
            .any(|r| r.url.path() == "/content/quiz-participants/p-1"));
    }
}
