//! Seed quizzes
//!
//! Quiz provisioning pairs generated quizzes with already-published posts
//! and hands the result to a database import, so the records here mirror the
//! quiz tables: a quiz row, its question rows and their answer rows, all
//! keyed by fresh UUIDs. Question and answer text is deterministic per
//! index; ids are minted at generation time.

use uuid::Uuid;

/// Default number of questions per generated quiz
pub const DEFAULT_QUESTIONS: u32 = 10;

/// Default number of answers per question
pub const DEFAULT_ANSWERS: u32 = 4;

/// Time limit of generated quizzes, in seconds
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 1800;

/// One quiz with its question tree
#[derive(Debug, Clone)]
pub struct SeedQuiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub gen_status: String,
    pub number_of_questions: u32,
    pub number_of_answers: u32,
    pub number_of_questions_display: u32,
    pub is_random: bool,
    pub time_limit: u32,
    pub questions: Vec<SeedQuestion>,
}

#[derive(Debug, Clone)]
pub struct SeedQuestion {
    pub id: String,
    pub quiz_id: String,
    pub content: String,
    pub answers: Vec<SeedAnswer>,
}

#[derive(Debug, Clone)]
pub struct SeedAnswer {
    pub id: String,
    pub question_id: String,
    pub is_correct: bool,
    pub content: String,
}

/// A seed quiz attached to the post it will be imported under
#[derive(Debug, Clone)]
pub struct PublishedQuiz {
    pub quiz: SeedQuiz,
    pub post_id: String,
    pub created_by: String,
}

impl SeedQuiz {
    /// Generate quiz `index` with `questions` questions of `answers` options
    /// each
    ///
    /// Exactly one answer per question is correct; its position rotates with
    /// the question index.
    pub fn generate(index: u32, questions: u32, answers: u32) -> Self {
        let quiz_id = Uuid::new_v4().to_string();

        let questions: Vec<SeedQuestion> = (1..=questions)
            .map(|q| {
                let question_id = Uuid::new_v4().to_string();
                let correct = q % answers.max(1);
                let answers = (0..answers)
                    .map(|a| SeedAnswer {
                        id: Uuid::new_v4().to_string(),
                        question_id: question_id.clone(),
                        is_correct: a == correct,
                        content: format!("Answer {} of question {}", a + 1, q),
                    })
                    .collect();
                SeedQuestion {
                    id: question_id,
                    quiz_id: quiz_id.clone(),
                    content: format!("Question {} of quiz {}", q, index),
                    answers,
                }
            })
            .collect();

        Self {
            id: quiz_id,
            title: format!("Seed Quiz {}", index),
            description: format!("Generated quiz {} for load runs", index),
            status: "PUBLISHED".to_string(),
            gen_status: "PROCESSED".to_string(),
            number_of_questions: questions.len() as u32,
            number_of_answers: questions.first().map_or(0, |q| q.answers.len() as u32),
            number_of_questions_display: questions.len() as u32,
            is_random: false,
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            questions,
        }
    }

    /// Attach this quiz to a published post for import
    pub fn publish(self, post_id: impl Into<String>, created_by: impl Into<String>) -> PublishedQuiz {
        PublishedQuiz {
            quiz: self,
            post_id: post_id.into(),
            created_by: created_by.into(),
        }
    }
}
