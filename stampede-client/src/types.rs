//! Typed platform payloads
//!
//! Only the fields the scenarios and seeding flows act on are modelled; the
//! rest of each payload is ignored. Services answer in a mix of snake_case
//! and camelCase across versions, so fields accept both spellings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content kinds the feed can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentKind {
    Post,
    Article,
    Series,
    #[serde(other)]
    Unknown,
}

impl ContentKind {
    /// Wire spelling of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "POST",
            ContentKind::Article => "ARTICLE",
            ContentKind::Series => "SERIES",
            ContentKind::Unknown => "UNKNOWN",
        }
    }
}

impl Default for ContentKind {
    fn default() -> Self {
        ContentKind::Unknown
    }
}

/// One item in a newsfeed or timeline page
#[derive(Debug, Clone, Deserialize)]
pub struct ContentSummary {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: ContentKind,

    #[serde(default, alias = "ownerReactions")]
    pub owner_reactions: Vec<OwnerReaction>,

    #[serde(default)]
    pub setting: ContentSetting,

    /// Whether this subject already pressed mark-as-read
    #[serde(default, alias = "markedReadPost")]
    pub marked_read_post: bool,

    #[serde(default)]
    pub quiz: Option<QuizRef>,

    #[serde(default, alias = "quizDoing")]
    pub quiz_doing: Option<QuizDoing>,

    #[serde(default, alias = "createdBy")]
    pub created_by: String,
}

/// Reaction this subject already placed on a target
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerReaction {
    #[serde(alias = "reactionName")]
    pub reaction_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentSetting {
    #[serde(default, alias = "isImportant")]
    pub is_important: bool,
}

/// Quiz attached to a content item
#[derive(Debug, Clone, Deserialize)]
pub struct QuizRef {
    pub id: String,
}

/// A quiz attempt this subject already has open
#[derive(Debug, Clone, Deserialize)]
pub struct QuizDoing {
    #[serde(alias = "quizParticipantId")]
    pub quiz_participant_id: String,
}

/// Quiz state as seen by one participant
#[derive(Debug, Clone, Deserialize)]
pub struct QuizAttempt {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,

    #[serde(alias = "startedAt")]
    pub started_at: DateTime<Utc>,

    /// Seconds the participant has to finish
    #[serde(alias = "timeLimit")]
    pub time_limit: u64,
}

impl QuizAttempt {
    /// Whether the attempt is out of time, with a safety margin so answers
    /// sent right at the deadline are not rejected
    pub fn time_up_at(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        let elapsed = (now - self.started_at).num_seconds();
        elapsed >= self.time_limit as i64 - margin_secs
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    #[serde(default)]
    pub answers: Vec<QuizAnswerOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizAnswerOption {
    pub id: String,
}

/// Answer picked for one question, as sent back to the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: String,
    pub answer_id: String,
}

/// Per-content action menu state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuSettings {
    #[serde(default, alias = "isSave")]
    pub is_save: bool,

    #[serde(default, alias = "canCreateQuiz")]
    pub can_create_quiz: bool,
}

/// One comment under a content item
#[derive(Debug, Clone, Deserialize)]
pub struct CommentSummary {
    pub id: String,

    #[serde(default, alias = "ownerReactions")]
    pub owner_reactions: Vec<OwnerReaction>,
}

/// Membership state of a subject in a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinStatus {
    CanJoin,
    Joined,
    WaitingApproval,
    #[serde(other)]
    Other,
}

/// Group entry from the discover listing
#[derive(Debug, Clone, Deserialize)]
pub struct GroupSummary {
    #[serde(alias = "groupId")]
    pub group_id: String,

    #[serde(alias = "joinStatus")]
    pub join_status: JoinStatus,

    /// Group toggles; joining is only free when every one is off
    #[serde(default)]
    pub settings: Value,
}

impl GroupSummary {
    /// Whether every group setting is switched off
    pub fn settings_all_off(&self) -> bool {
        match self.settings.as_object() {
            Some(map) => map.values().all(|v| v == &Value::Bool(false)),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupDetail {
    #[serde(alias = "joinStatus")]
    pub join_status: JoinStatus,
}

/// Group a draft can be published into
#[derive(Debug, Clone, Deserialize)]
pub struct AudienceGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesSummary {
    pub id: String,
}

/// Identifier handed back when a draft is created
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedContent {
    pub id: String,
}

/// Community as listed by the management endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Community {
    pub id: String,
    pub name: String,

    #[serde(alias = "groupId")]
    pub group_id: String,

    #[serde(default, alias = "ownerId")]
    pub owner_id: String,

    #[serde(default)]
    pub privacy: String,
}

/// Platform user as seen by the management endpoints
///
/// Member listings spell the id `user_id`; the profile endpoint spells it
/// `id`. Both land here.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformUser {
    #[serde(alias = "userId", alias = "user_id")]
    pub id: String,

    pub username: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, alias = "isAdmin")]
    pub is_admin: bool,
}

/// Fields for publishing a draft post
#[derive(Debug, Clone, Default)]
pub struct PublishPost {
    pub content: String,
    pub group_ids: Vec<String>,
    pub series_ids: Vec<String>,
}
