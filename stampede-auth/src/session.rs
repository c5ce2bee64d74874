//! Per-virtual-user session with background token refresh

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::AuthResult;
use crate::token_source::TokenSource;
use stampede_store::Credential;

/// A live authenticated identity for one virtual user
///
/// Opening a session authenticates the subject (or picks up its stored
/// credential) and spawns a refresher that re-authenticates at half the
/// token lifetime, keeping long-running scenarios from ever presenting an
/// expired token. The refresher is a scoped resource: it stops when the
/// session is closed or dropped.
pub struct Session {
    subject: String,
    tokens: Arc<TokenSource>,
    refresher: Option<JoinHandle<()>>,
}

impl Session {
    /// Open a session for a subject
    pub async fn open(tokens: Arc<TokenSource>, subject: impl Into<String>) -> AuthResult<Self> {
        let subject = subject.into();
        let credential = tokens.token_for(&subject).await?;

        let refresher = tokio::spawn(refresh_loop(
            tokens.clone(),
            subject.clone(),
            credential.half_life(),
        ));

        Ok(Self {
            subject,
            tokens,
            refresher: Some(refresher),
        })
    }

    /// The subject this session impersonates
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Current credential for this session's subject
    pub async fn credential(&self) -> AuthResult<Credential> {
        self.tokens.token_for(&self.subject).await
    }

    /// Stop the background refresher and consume the session
    pub fn close(mut self) {
        self.stop_refresher();
    }

    fn stop_refresher(&mut self) {
        if let Some(handle) = self.refresher.take() {
            handle.abort();
            debug!("Stopped refresher for {}", self.subject);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_refresher();
    }
}

async fn refresh_loop(tokens: Arc<TokenSource>, subject: String, initial: Duration) {
    // Floor keeps a malformed zero-lifetime grant from spinning the loop
    let mut interval = initial.max(Duration::from_secs(1));
    loop {
        tokio::time::sleep(interval).await;
        match tokens.force_refresh(&subject).await {
            Ok(credential) => {
                interval = credential.half_life().max(Duration::from_secs(1));
                debug!(
                    "Background refresh for {} succeeded, next in {:?}",
                    subject, interval
                );
            }
            Err(e) => {
                warn!("Background refresh failed for {}: {}", subject, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stampede_config::{IdentityConfig, RetryConfig};
    use stampede_store::{CredentialStore, MemoryStore};
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::provider::IdentityProvider;

    fn source_for(server: &MockServer) -> Arc<TokenSource> {
        let identity = IdentityConfig {
            endpoint: server.uri(),
            client_id: "test-client".to_string(),
            ..IdentityConfig::default()
        };
        let mut retry = RetryConfig::default();
        retry.login.delay = Duration::from_millis(5);
        retry.refresh.backoff_base = Duration::from_millis(5);

        let provider = Arc::new(IdentityProvider::with_client(
            reqwest::Client::new(),
            &identity,
            &retry,
        ));
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        Arc::new(TokenSource::new(provider, store, "pw"))
    }

    fn short_grant() -> serde_json::Value {
        // Two-second lifetime puts the first refresh at the 1s floor
        json!({
            "AuthenticationResult": {
                "IdToken": "short-id",
                "AccessToken": "access",
                "RefreshToken": "rt",
                "ExpiresIn": 2,
                "TokenType": "Bearer"
            }
        })
    }

    #[tokio::test]
    async fn test_session_refreshes_in_background() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "AuthFlow": "USER_PASSWORD_AUTH" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(short_grant()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "AuthFlow": "REFRESH_TOKEN_AUTH" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(short_grant()))
            .mount(&server)
            .await;

        let tokens = source_for(&server);
        let session = Session::open(tokens, "user1").await.unwrap();

        tokio::time::sleep(Duration::from_millis(1600)).await;

        let refreshes = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| {
                String::from_utf8_lossy(&r.body).contains("REFRESH_TOKEN_AUTH")
            })
            .count();
        assert!(refreshes >= 1, "expected at least one background refresh");

        session.close();
    }

    #[tokio::test]
    async fn test_closed_session_stops_refreshing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(short_grant()))
            .mount(&server)
            .await;

        let tokens = source_for(&server);
        let session = Session::open(tokens, "user1").await.unwrap();
        session.close();

        tokio::time::sleep(Duration::from_millis(1600)).await;

        // Only the initial login reached the provider
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_surfaces_login_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "NotAuthorizedException",
                "message": "Incorrect username or password."
            })))
            .mount(&server)
            .await;

        let tokens = source_for(&server);
        assert!(Session::open(tokens, "user1").await.is_err());
    }
}
