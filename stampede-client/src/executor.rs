//! Retrying request executor
//!
//! One executor is shared by every virtual user in a run. Each call resolves
//! the subject's credential from the token source, sends the request and
//! classifies the outcome. Retries of one logical call are strictly
//! sequential; concurrency only exists across calls.

use crate::classify::{body_code, Classification, Classifier, TransportKind};
use crate::errors::{ClientError, ClientResult};
use crate::observer::{NoopObserver, RetryObserver};
use crate::request::ApiRequest;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use stampede_auth::TokenSource;
use stampede_config::domains::retry::RequestRetryPolicy;
use stampede_config::PlatformConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Injectable delay, so tests can record backoffs instead of waiting them out
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Default sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Executes [`ApiRequest`]s with classification-driven retries
pub struct RequestExecutor {
    client: reqwest::Client,
    tokens: Arc<TokenSource>,
    classifier: Classifier,
    policy: RequestRetryPolicy,
    version_header: String,
    request_id_header: String,
    observer: Arc<dyn RetryObserver>,
    sleeper: Arc<dyn Sleeper>,
}

impl RequestExecutor {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<TokenSource>,
        classifier: Classifier,
        policy: RequestRetryPolicy,
        platform: &PlatformConfig,
    ) -> Self {
        Self {
            client,
            tokens,
            classifier,
            policy,
            version_header: platform.version_header.clone(),
            request_id_header: platform.request_id_header.clone(),
            observer: Arc::new(NoopObserver),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the retry observer
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the delay implementation
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The shared token source behind this executor
    pub fn tokens(&self) -> &Arc<TokenSource> {
        &self.tokens
    }

    /// Execute one logical call
    ///
    /// Returns the parsed response body on success, or `Ok(None)` when the
    /// platform reported a benign conflict (the action was already applied).
    pub async fn execute(&self, request: &ApiRequest) -> ClientResult<Option<Value>> {
        let mut attempts: u32 = 0;
        let mut refresh_first = false;

        loop {
            let credential = if refresh_first {
                refresh_first = false;
                self.tokens.force_refresh(&request.subject).await?
            } else {
                self.tokens.token_for(&request.subject).await?
            };

            let classification = match self.send(request, &credential.id_token).await {
                Ok((status, body)) => {
                    if status.is_success() {
                        self.observer.cleared();
                        return Ok(Some(body));
                    }

                    let code = body_code(&body);
                    match self.classifier.classify_response(status.as_u16(), code) {
                        Classification::BenignConflict(code) => {
                            debug!(
                                code = %code,
                                method = %request.method,
                                url = %request.url,
                                "Conflict already applied, treating as success"
                            );
                            self.observer.benign_conflict();
                            return Ok(None);
                        }
                        Classification::FatalUnknown { status, code } => {
                            error!(
                                status,
                                code = %code,
                                method = %request.method,
                                url = %request.url,
                                body = %body,
                                "Unknown error code in response"
                            );
                            return Err(ClientError::UnexpectedStatus {
                                status,
                                code,
                                body: body.to_string(),
                            });
                        }
                        retryable => retryable,
                    }
                }
                Err(send_error) => {
                    let kind = TransportKind::from_error(&send_error);
                    if !self.classifier.is_transient(kind) {
                        return Err(ClientError::Transport {
                            kind,
                            message: send_error.to_string(),
                        });
                    }
                    Classification::TransientTransport(kind)
                }
            };

            // Bound check happens before the counter moves, so the bound is
            // the number of retries, not attempts.
            if attempts >= self.policy.max_attempts {
                if let Classification::TransientTransport(kind) = classification {
                    // Escape valve: long outages should not kill provisioning
                    // runs. Back off a random amount and start the count over.
                    let cap = self.policy.valve_sleep_cap.as_millis() as u64;
                    let pause = Duration::from_millis(fastrand::u64(0..cap.max(1)));
                    warn!(
                        kind = %kind,
                        method = %request.method,
                        url = %request.url,
                        pause_ms = pause.as_millis() as u64,
                        "Transport retries exhausted, backing off and starting over"
                    );
                    self.sleeper.sleep(pause).await;
                    attempts = 0;
                    continue;
                }
                return Err(ClientError::RetriesExhausted {
                    attempts,
                    last: classification.to_string(),
                });
            }

            attempts += 1;
            warn!(
                attempt = attempts,
                outcome = %classification,
                method = %request.method,
                url = %request.url,
                "Retrying request"
            );
            self.observer.retry_started();
            self.sleeper.sleep(self.policy.backoff_base * attempts).await;

            if classification == Classification::AuthExpired {
                refresh_first = true;
            }
        }
    }

    /// Send one attempt and read the body
    ///
    /// Non-JSON bodies (gateway error pages) are kept as a JSON string so
    /// classification still sees an empty code instead of failing.
    async fn send(
        &self,
        request: &ApiRequest,
        id_token: &str,
    ) -> Result<(StatusCode, Value), reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            // The platform expects the raw ID token, not a Bearer scheme
            .header(AUTHORIZATION, id_token)
            .header(self.request_id_header.as_str(), Uuid::new_v4().to_string());

        if let Some(version) = &request.version {
            builder = builder.header(self.version_header.as_str(), version);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use stampede_auth::{build_http_client, IdentityProvider, TokenSource};
    use stampede_config::{ClassifierConfig, HttpConfig, IdentityConfig, RetryConfig};
    use stampede_store::{Credential, CredentialStore, MemoryStore};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Sleeper that records requested delays and returns immediately
    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().push(duration);
        }
    }

    impl RecordingSleeper {
        fn slept(&self) -> Vec<Duration> {
            self.slept.lock().clone()
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        retries: Mutex<u32>,
        clears: Mutex<u32>,
    }

    impl RetryObserver for CountingObserver {
        fn retry_started(&self) {
            *self.retries.lock() += 1;
        }
        fn cleared(&self) {
            *self.clears.lock() += 1;
        }
    }

    fn fresh_credential(subject: &str, id_token: &str) -> Credential {
        Credential::from_grant(
            subject,
            id_token,
            "access-token",
            Some("refresh-token".to_string()),
            "Bearer",
            3600,
        )
    }

    struct Harness {
        executor: RequestExecutor,
        sleeper: Arc<RecordingSleeper>,
        observer: Arc<CountingObserver>,
        store: Arc<MemoryStore>,
    }

    async fn harness(provider_uri: &str, policy: RequestRetryPolicy) -> Harness {
        let identity = IdentityConfig {
            endpoint: provider_uri.to_string(),
            ..IdentityConfig::default()
        };
        let client = build_http_client(&HttpConfig::default()).unwrap();
        let provider = IdentityProvider::with_client(
            client.clone(),
            &identity,
            &RetryConfig::default(),
        );
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenSource::new(
            Arc::new(provider),
            store.clone(),
            "hunter2!A",
        ));

        let sleeper = Arc::new(RecordingSleeper::default());
        let observer = Arc::new(CountingObserver::default());
        let executor = RequestExecutor::new(
            client,
            tokens,
            Classifier::from_config(&ClassifierConfig::default()),
            policy,
            &PlatformConfig::default(),
        )
        .with_sleeper(sleeper.clone())
        .with_observer(observer.clone());

        Harness {
            executor,
            sleeper,
            observer,
            store,
        }
    }

    fn default_policy() -> RequestRetryPolicy {
        RequestRetryPolicy {
            max_attempts: 10,
            backoff_base: Duration::from_secs(30),
            valve_sleep_cap: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_success_returns_parsed_body_and_clears_observer() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), default_policy()).await;
        h.store.put(fresh_credential("loaduser1", "tok-1")).await.unwrap();

        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .and(header("authorization", "tok-1"))
            .and(header("x-version-id", "1.12.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "list": [], "meta": { "has_next_page": false } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::get("loaduser1", format!("{}/content/newsfeed", server.uri()))
            .with_version("1.12.0");
        let body = h.executor.execute(&request).await.unwrap().unwrap();
        assert_eq!(body["code"], "api.ok");
        assert_eq!(*h.observer.clears.lock(), 1);
        assert_eq!(*h.observer.retries.lock(), 0);
        assert!(h.sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn test_benign_conflict_absorbed_without_retry() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), default_policy()).await;
        h.store.put(fresh_credential("loaduser1", "tok-1")).await.unwrap();

        Mock::given(method("POST"))
            .and(path("/group/groups/g-1/join"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "group.already_member",
                "meta": { "message": "Already a member" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::post(
            "loaduser1",
            format!("{}/group/groups/g-1/join", server.uri()),
            json!({}),
        );
        let outcome = h.executor.execute(&request).await.unwrap();
        assert!(outcome.is_none());
        // Absorbed conflicts do not count as a success for the ticker
        assert_eq!(*h.observer.clears.lock(), 0);
        assert_eq!(*h.observer.retries.lock(), 0);
    }

    #[tokio::test]
    async fn test_unknown_code_raises_with_zero_retries() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), default_policy()).await;
        h.store.put(fresh_credential("loaduser1", "tok-1")).await.unwrap();

        Mock::given(method("POST"))
            .and(path("/content/posts"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": "content.validation_failed",
                "meta": { "message": "bad audience" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::post(
            "loaduser1",
            format!("{}/content/posts", server.uri()),
            json!({ "audience": { "group_ids": [] } }),
        );
        let err = h.executor.execute(&request).await.unwrap_err();
        match err {
            ClientError::UnexpectedStatus { status, code, .. } => {
                assert_eq!(status, 422);
                assert_eq!(code, "content.validation_failed");
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
        assert!(h.sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn test_server_errors_backoff_grows_linearly() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), default_policy()).await;
        h.store.put(fresh_credential("loaduser1", "tok-1")).await.unwrap();

        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "code": "gateway.bad",
            })))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "list": [], "meta": {} }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::get("loaduser1", format!("{}/content/newsfeed", server.uri()));
        h.executor.execute(&request).await.unwrap().unwrap();

        assert_eq!(
            h.sleeper.slept(),
            vec![
                Duration::from_secs(30),
                Duration::from_secs(60),
                Duration::from_secs(90),
            ]
        );
        assert_eq!(*h.observer.retries.lock(), 3);
        assert_eq!(*h.observer.clears.lock(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_the_bound() {
        let server = MockServer::start().await;
        let mut policy = default_policy();
        policy.max_attempts = 2;
        let h = harness(&server.uri(), policy).await;
        h.store.put(fresh_credential("loaduser1", "tok-1")).await.unwrap();

        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "code": "boom" })))
            .expect(3)
            .mount(&server)
            .await;

        let request = ApiRequest::get("loaduser1", format!("{}/content/newsfeed", server.uri()));
        let err = h.executor.execute(&request).await.unwrap_err();
        match err {
            ClientError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(last, "HTTP 500");
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_auth_expired_forces_one_refresh_with_fresh_token() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), default_policy()).await;
        h.store.put(fresh_credential("loaduser1", "stale-token")).await.unwrap();

        // Refresh grant at the identity provider hands out a new ID token
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(json!({ "AuthFlow": "REFRESH_TOKEN_AUTH" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AuthenticationResult": {
                    "IdToken": "fresh-token",
                    "AccessToken": "fresh-access",
                    "ExpiresIn": 3600,
                    "TokenType": "Bearer"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .and(header("authorization", "stale-token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "code": "auth.unauthorized" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .and(header("authorization", "fresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "list": [], "meta": {} }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::get("loaduser1", format!("{}/content/newsfeed", server.uri()));
        h.executor.execute(&request).await.unwrap().unwrap();

        // One backoff, then the refreshed credential is used
        assert_eq!(h.sleeper.slept(), vec![Duration::from_secs(30)]);
        let stored = h.store.get("loaduser1").await.unwrap().unwrap();
        assert_eq!(stored.id_token, "fresh-token");
        // Refresh grants omit the refresh token; the old one is carried over
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh-token"));
    }

    #[tokio::test]
    async fn test_transport_failures_hit_the_valve_and_reset() {
        // Nothing listens on port 1, so every send is refused
        let server = MockServer::start().await;
        let mut policy = default_policy();
        policy.max_attempts = 2;
        policy.valve_sleep_cap = Duration::from_millis(1);
        let h = harness(&server.uri(), policy).await;
        h.store.put(fresh_credential("loaduser1", "tok-1")).await.unwrap();

        let executor = Arc::new(h.executor);
        let sleeper = h.sleeper.clone();
        let request = ApiRequest::get("loaduser1", "http://127.0.0.1:1/content/newsfeed");

        let run = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.execute(&request).await })
        };

        // Wait until the loop has gone around the valve at least once
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            if sleeper.slept().len() >= 5 {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "valve never engaged");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        run.abort();

        let slept = sleeper.slept();
        // Two growing backoffs, the valve pause, then the count starts over
        assert_eq!(slept[0], Duration::from_secs(30));
        assert_eq!(slept[1], Duration::from_secs(60));
        assert!(slept[2] < Duration::from_secs(30));
        assert_eq!(slept[3], Duration::from_secs(30));
        assert_eq!(slept[4], Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_non_transient_transport_raises_immediately() {
        let server = MockServer::start().await;
        let mut config = ClassifierConfig::default();
        config.transient_transport.clear();

        let h = harness(&server.uri(), default_policy()).await;
        h.store.put(fresh_credential("loaduser1", "tok-1")).await.unwrap();
        let executor = RequestExecutor::new(
            build_http_client(&HttpConfig::default()).unwrap(),
            h.executor.tokens().clone(),
            Classifier::from_config(&config),
            default_policy(),
            &PlatformConfig::default(),
        )
        .with_sleeper(h.sleeper.clone());

        let request = ApiRequest::get("loaduser1", "http://127.0.0.1:1/content/newsfeed");
        let err = executor.execute(&request).await.unwrap_err();
        match err {
            ClientError::Transport { kind, .. } => {
                assert_eq!(kind, TransportKind::ConnectionBusy)
            }
            other => panic!("expected Transport, got {:?}", other),
        }
        assert!(h.sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_triggers_login_before_first_attempt() {
        let server = MockServer::start().await;
        let h = harness(&server.uri(), default_policy()).await;

        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_partial_json(json!({ "AuthFlow": "USER_PASSWORD_AUTH" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AuthenticationResult": {
                    "IdToken": "cold-token",
                    "AccessToken": "cold-access",
                    "RefreshToken": "cold-refresh",
                    "ExpiresIn": 3600,
                    "TokenType": "Bearer"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .and(header("authorization", "cold-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "list": [], "meta": {} }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::get("loaduser1", format!("{}/content/newsfeed", server.uri()));
        h.executor.execute(&request).await.unwrap().unwrap();
        assert!(h.store.get("loaduser1").await.unwrap().is_some());
    }
}
