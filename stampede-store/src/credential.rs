//! Credential record shared between virtual users

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One subject's tokens, as issued by the identity provider
///
/// Stored whole: readers see either no credential for a subject or a
/// complete one, never a partially updated record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The username this credential belongs to
    pub subject: String,

    /// Token presented to the platform API on every request
    pub id_token: String,

    /// Access token from the same grant
    pub access_token: String,

    /// Refresh token, absent on refresh grants
    pub refresh_token: Option<String>,

    /// Token type advertised by the provider, usually `Bearer`
    pub token_type: String,

    /// When the tokens were issued
    pub issued_at: DateTime<Utc>,

    /// When the tokens expire
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a provider grant that reports its lifetime in
    /// seconds
    #[allow(clippy::too_many_arguments)]
    pub fn from_grant(
        subject: impl Into<String>,
        id_token: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        token_type: impl Into<String>,
        expires_in_secs: u64,
    ) -> Self {
        let issued_at = Utc::now();
        Self {
            subject: subject.into(),
            id_token: id_token.into(),
            access_token: access_token.into(),
            refresh_token,
            token_type: token_type.into(),
            issued_at,
            expires_at: issued_at + ChronoDuration::seconds(expires_in_secs as i64),
        }
    }

    /// Full lifetime of the grant
    pub fn lifetime(&self) -> Duration {
        (self.expires_at - self.issued_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Half the grant lifetime, the point at which sessions refresh
    pub fn half_life(&self) -> Duration {
        self.lifetime() / 2
    }

    /// Whether the credential has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the credential has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
