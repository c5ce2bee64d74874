//! CSV export
//!
//! Two artifact families leave this crate as CSV: the account roster, fed to
//! identity-pool imports, and the quiz tables (`quiz.csv`, `question.csv`,
//! `answer.csv`), fed to a database import during quiz provisioning. Quiz
//! tables are appended across provisioning runs; the header is written only
//! when a file is first created.

use crate::errors::SeedResult;
use crate::quiz::PublishedQuiz;
use crate::users::SeedUser;
use chrono::{SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const QUIZ_HEADER: &[&str] = &[
    "id",
    "post_id",
    "title",
    "status",
    "description",
    "number_of_questions",
    "number_of_answers",
    "number_of_questions_display",
    "is_random",
    "meta",
    "gen_status",
    "created_by",
    "updated_by",
    "created_at",
    "updated_at",
    "error",
    "time_limit",
];

const QUESTION_HEADER: &[&str] = &["id", "quiz_id", "content", "created_at", "updated_at"];

const ANSWER_HEADER: &[&str] = &[
    "id",
    "question_id",
    "is_correct",
    "content",
    "created_at",
    "updated_at",
];

/// Write the account roster, replacing any existing file
pub fn write_roster(path: &Path, users: &[SeedUser]) -> SeedResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for user in users {
        writer.serialize(user)?;
    }
    writer.flush()?;
    Ok(())
}

/// The three quiz import tables inside one directory
#[derive(Debug, Clone)]
pub struct QuizTables {
    dir: PathBuf,
}

impl QuizTables {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn quiz_path(&self) -> PathBuf {
        self.dir.join("quiz.csv")
    }

    pub fn question_path(&self) -> PathBuf {
        self.dir.join("question.csv")
    }

    pub fn answer_path(&self) -> PathBuf {
        self.dir.join("answer.csv")
    }

    /// Append the given quizzes to the three tables
    ///
    /// All rows of one call share a single timestamp. The import treats the
    /// `meta` and `error` columns as JSON; they are always the empty object.
    pub fn append(&self, quizzes: &[PublishedQuiz]) -> SeedResult<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let quiz_rows: Vec<Vec<String>> = quizzes
            .iter()
            .map(|p| {
                vec![
                    p.quiz.id.clone(),
                    p.post_id.clone(),
                    p.quiz.title.clone(),
                    p.quiz.status.clone(),
                    p.quiz.description.clone(),
                    p.quiz.number_of_questions.to_string(),
                    p.quiz.number_of_answers.to_string(),
                    p.quiz.number_of_questions_display.to_string(),
                    p.quiz.is_random.to_string(),
                    "{}".to_string(),
                    p.quiz.gen_status.clone(),
                    p.created_by.clone(),
                    p.created_by.clone(),
                    now.clone(),
                    now.clone(),
                    "{}".to_string(),
                    p.quiz.time_limit.to_string(),
                ]
            })
            .collect();

        let question_rows: Vec<Vec<String>> = quizzes
            .iter()
            .flat_map(|p| p.quiz.questions.iter())
            .map(|q| {
                vec![
                    q.id.clone(),
                    q.quiz_id.clone(),
                    q.content.clone(),
                    now.clone(),
                    now.clone(),
                ]
            })
            .collect();

        let answer_rows: Vec<Vec<String>> = quizzes
            .iter()
            .flat_map(|p| p.quiz.questions.iter())
            .flat_map(|q| q.answers.iter())
            .map(|a| {
                vec![
                    a.id.clone(),
                    a.question_id.clone(),
                    a.is_correct.to_string(),
                    a.content.clone(),
                    now.clone(),
                    now.clone(),
                ]
            })
            .collect();

        append_rows(&self.quiz_path(), QUIZ_HEADER, &quiz_rows)?;
        append_rows(&self.question_path(), QUESTION_HEADER, &question_rows)?;
        append_rows(&self.answer_path(), ANSWER_HEADER, &answer_rows)?;
        Ok(())
    }
}

fn append_rows(path: &Path, header: &[&str], rows: &[Vec<String>]) -> SeedResult<()> {
    let new_file = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if new_file {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
