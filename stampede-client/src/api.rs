//! Actor operations
//!
//! An [`ActorClient`] is one subject's view of the platform. It only maps
//! operations to request shapes; credentials, retries and classification all
//! live in the executor, so scenario code never sees a raw HTTP failure
//! mid-iteration without the retry policy having run first.

use crate::envelope::{self, Page};
use crate::errors::ClientResult;
use crate::executor::RequestExecutor;
use crate::request::ApiRequest;
use crate::types::{
    AudienceGroup, CommentSummary, ContentKind, ContentSummary, CreatedContent, GroupDetail,
    GroupSummary, MenuSettings, PublishPost, QuizAnswer, QuizAttempt, SeriesSummary,
};
use serde_json::json;
use stampede_config::domains::platform::ServicesConfig;
use std::sync::Arc;
use url::Url;

/// Page size used by every cursor-paged listing
const PAGE_LIMIT: u32 = 20;

/// Page size for the group discover listing
const DISCOVER_LIMIT: u32 = 25;

/// Typed client for one subject
#[derive(Clone)]
pub struct ActorClient {
    executor: Arc<RequestExecutor>,
    services: ServicesConfig,
    subject: String,
}

impl ActorClient {
    pub fn new(
        executor: Arc<RequestExecutor>,
        services: ServicesConfig,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            services,
            subject: subject.into(),
        }
    }

    /// Subject this client acts as
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub(crate) fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    pub(crate) fn services(&self) -> &ServicesConfig {
        &self.services
    }

    fn content_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.services.content.host.trim_end_matches('/'),
            path
        )
    }

    pub(crate) fn group_url(&self, path: &str) -> String {
        format!("{}/{}", self.services.group.host.trim_end_matches('/'), path)
    }

    pub(crate) fn user_url(&self, path: &str) -> String {
        format!("{}/{}", self.services.user.host.trim_end_matches('/'), path)
    }

    fn content_get(&self, url: impl Into<String>) -> ApiRequest {
        ApiRequest::get(&self.subject, url).with_version(&self.services.content.version)
    }

    fn content_post(&self, url: impl Into<String>, body: serde_json::Value) -> ApiRequest {
        ApiRequest::post(&self.subject, url, body).with_version(&self.services.content.version)
    }

    fn content_put(&self, url: impl Into<String>, body: serde_json::Value) -> ApiRequest {
        ApiRequest::put(&self.subject, url, body).with_version(&self.services.content.version)
    }

    fn group_get(&self, url: impl Into<String>) -> ApiRequest {
        ApiRequest::get(&self.subject, url).with_version(&self.services.group.version)
    }

    fn group_post(&self, url: impl Into<String>, body: serde_json::Value) -> ApiRequest {
        ApiRequest::post(&self.subject, url, body).with_version(&self.services.group.version)
    }

    fn group_put(&self, url: impl Into<String>, body: serde_json::Value) -> ApiRequest {
        ApiRequest::put(&self.subject, url, body).with_version(&self.services.group.version)
    }

    // --- newsfeed and timeline ---

    /// Newsfeed page for this subject
    pub async fn newsfeed(&self, after: Option<&str>) -> ClientResult<Page<ContentSummary>> {
        self.feed_page("newsfeed", &[], after).await
    }

    /// Newsfeed restricted to important content
    pub async fn important_newsfeed(
        &self,
        after: Option<&str>,
    ) -> ClientResult<Page<ContentSummary>> {
        self.feed_page("newsfeed", &[("is_important", "true")], after)
            .await
    }

    /// Newsfeed restricted to one content kind
    pub async fn filtered_newsfeed(
        &self,
        kind: ContentKind,
        after: Option<&str>,
    ) -> ClientResult<Page<ContentSummary>> {
        let kind = match kind {
            ContentKind::Post => "POST",
            ContentKind::Article => "ARTICLE",
            ContentKind::Series => "SERIES",
            ContentKind::Unknown => "POST",
        };
        self.feed_page("newsfeed", &[("type", kind)], after).await
    }

    /// Timeline of one group
    pub async fn timeline(
        &self,
        group_id: &str,
        after: Option<&str>,
    ) -> ClientResult<Page<ContentSummary>> {
        let path = format!("timeline/{}", group_id);
        self.feed_page(&path, &[], after).await
    }

    async fn feed_page(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        after: Option<&str>,
    ) -> ClientResult<Page<ContentSummary>> {
        let limit = PAGE_LIMIT.to_string();
        let mut params = vec![("limit", limit.as_str())];
        params.extend_from_slice(extra);
        if let Some(cursor) = after {
            params.push(("after", cursor));
        }
        let url = with_params(&self.content_url(path), &params)?;
        let request = self.content_get(url);
        envelope::page_in_data(self.executor.execute(&request).await?, "feed page")
    }

    // --- content ---

    /// Full detail of one content item; unknown kinds resolve to nothing
    pub async fn content_detail(
        &self,
        content_id: &str,
        kind: ContentKind,
    ) -> ClientResult<Option<ContentSummary>> {
        let path = match kind {
            ContentKind::Post => format!("posts/{}", content_id),
            ContentKind::Article => format!("articles/{}", content_id),
            ContentKind::Series => format!("series/{}", content_id),
            ContentKind::Unknown => return Ok(None),
        };
        let request = self.content_get(self.content_url(&path));
        match self.executor.execute(&request).await? {
            Some(body) => Ok(envelope::parse::<ContentSummary>(body)?.data),
            None => Ok(None),
        }
    }

    /// Place one reaction on a content item or comment
    pub async fn react(
        &self,
        target_id: &str,
        target_kind: &str,
        reaction_name: &str,
    ) -> ClientResult<()> {
        let body = json!({
            "target_id": target_id,
            "target": target_kind,
            "reaction_name": reaction_name,
        });
        let request = self.content_post(self.content_url("reactions"), body);
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Mark an important content item as read
    pub async fn mark_as_read(&self, content_id: &str) -> ClientResult<()> {
        let path = format!("contents/{}/mark-as-read", content_id);
        let request = self.content_put(self.content_url(&path), json!({}));
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Action menu state for one content item
    pub async fn menu_settings(&self, content_id: &str) -> ClientResult<MenuSettings> {
        let path = format!("contents/{}/menu-settings", content_id);
        let request = self.content_get(self.content_url(&path));
        envelope::require_data(self.executor.execute(&request).await?, "menu settings")
    }

    /// Save a content item for later
    pub async fn save_content(&self, content_id: &str) -> ClientResult<()> {
        let path = format!("contents/{}/save", content_id);
        let request = self.content_post(self.content_url(&path), json!({}));
        self.executor.execute(&request).await.map(|_| ())
    }

    // --- comments ---

    /// Comments under a content item, newest first
    pub async fn comments(
        &self,
        content_id: &str,
        after: Option<&str>,
    ) -> ClientResult<Page<CommentSummary>> {
        let limit = PAGE_LIMIT.to_string();
        let mut params = vec![("post_id", content_id), ("limit", limit.as_str())];
        if let Some(cursor) = after {
            params.push(("after", cursor));
        }
        let url = with_params(&self.content_url("comments"), &params)?;
        let request = self.content_get(url);
        envelope::page_in_data(self.executor.execute(&request).await?, "comments")
    }

    /// Leave a top-level comment
    pub async fn comment(&self, content_id: &str, content: &str) -> ClientResult<()> {
        let body = json!({ "post_id": content_id, "content": content });
        let request = self.content_post(self.content_url("comments"), body);
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Reply to an existing comment
    pub async fn reply_comment(
        &self,
        content_id: &str,
        comment_id: &str,
        content: &str,
    ) -> ClientResult<()> {
        let path = format!("comments/{}/reply", comment_id);
        let body = json!({ "post_id": content_id, "content": content });
        let request = self.content_post(self.content_url(&path), body);
        self.executor.execute(&request).await.map(|_| ())
    }

    // --- groups ---

    /// Groups this subject could join, offset-paged
    pub async fn discover_groups(&self, offset: u64) -> ClientResult<Page<GroupSummary>> {
        let offset = offset.to_string();
        let limit = DISCOVER_LIMIT.to_string();
        let url = with_params(
            &self.group_url("groups/discover"),
            &[("offset", offset.as_str()), ("limit", limit.as_str())],
        )?;
        let request = self.group_get(url);
        envelope::page_in_envelope(self.executor.execute(&request).await?, "discover groups")
    }

    /// Group detail including this subject's join status
    pub async fn group_detail(&self, group_id: &str) -> ClientResult<GroupDetail> {
        let path = format!("groups/{}", group_id);
        let request = self.group_get(self.group_url(&path));
        envelope::require_data(self.executor.execute(&request).await?, "group detail")
    }

    /// Join a group; an already-sent request or existing membership is
    /// absorbed by the executor as a benign conflict
    pub async fn join_group(&self, group_id: &str) -> ClientResult<()> {
        let path = format!("groups/{}/join", group_id);
        let request = self.group_post(self.group_url(&path), json!({}));
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Leave a group
    pub async fn leave_group(&self, group_id: &str) -> ClientResult<()> {
        let path = format!("groups/{}/leave", group_id);
        let request = self.group_post(self.group_url(&path), json!({}));
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Approve every pending join request of a group this subject manages
    pub async fn approve_all_join_requests(&self, group_id: &str) -> ClientResult<()> {
        let path = format!("groups/{}/join-requests/approve", group_id);
        let request = self.group_put(self.group_url(&path), json!({}));
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Decline every pending join request of a group this subject manages
    pub async fn decline_all_join_requests(&self, group_id: &str) -> ClientResult<()> {
        let path = format!("groups/{}/join-requests/decline", group_id);
        let request = self.group_put(self.group_url(&path), json!({}));
        self.executor.execute(&request).await.map(|_| ())
    }

    // --- publishing ---

    /// Groups this subject may publish into
    pub async fn post_audience_groups(&self) -> ClientResult<Vec<AudienceGroup>> {
        let request = self.content_get(self.content_url("audiences/groups"));
        envelope::require_data(self.executor.execute(&request).await?, "audience groups")
    }

    /// Series available in the given groups
    pub async fn series_for_groups(
        &self,
        group_ids: &[String],
    ) -> ClientResult<Page<SeriesSummary>> {
        let group_ids = group_ids.join(",");
        let url = with_params(
            &self.content_url("series"),
            &[("group_ids", group_ids.as_str())],
        )?;
        let request = self.content_get(url);
        envelope::page_in_data(self.executor.execute(&request).await?, "series")
    }

    /// Create an empty draft post in the given groups
    pub async fn create_draft_post(&self, group_ids: &[String]) -> ClientResult<CreatedContent> {
        let body = json!({ "audience": { "group_ids": group_ids } });
        let request = self.content_post(self.content_url("posts"), body);
        envelope::require_data(self.executor.execute(&request).await?, "create draft post")
    }

    /// Overwrite the draft content, as the editor autosave does
    pub async fn save_draft_post(
        &self,
        post_id: &str,
        group_ids: &[String],
        content: &str,
    ) -> ClientResult<()> {
        let path = format!("posts/{}", post_id);
        let body = json!({
            "audience": { "group_ids": group_ids },
            "content": content,
        });
        let request = self.content_put(self.content_url(&path), body);
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Publish a draft post
    pub async fn publish_post(&self, post_id: &str, publish: &PublishPost) -> ClientResult<()> {
        let path = format!("posts/{}/publish", post_id);
        let mut body = json!({ "content": publish.content });
        if !publish.group_ids.is_empty() {
            body["audience"] = json!({ "group_ids": publish.group_ids });
        }
        if !publish.series_ids.is_empty() {
            body["series"] = json!(publish.series_ids);
        }
        let request = self.content_put(self.content_url(&path), body);
        self.executor.execute(&request).await.map(|_| ())
    }

    // --- quizzes ---

    /// Ask the platform to generate a quiz for a published content item
    pub async fn generate_quiz(&self, content_id: &str) -> ClientResult<()> {
        let body = json!({ "content_id": content_id });
        let request = self.content_post(self.content_url("quizzes"), body);
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Start taking a quiz; returns the participant id of the new attempt
    pub async fn start_quiz(&self, quiz_id: &str) -> ClientResult<String> {
        let path = format!("quizzes/{}/start", quiz_id);
        let request = self.content_post(self.content_url(&path), json!({}));
        envelope::require_data(self.executor.execute(&request).await?, "start quiz")
    }

    /// Current state of a quiz attempt
    pub async fn quiz_attempt(&self, participant_id: &str) -> ClientResult<QuizAttempt> {
        let path = format!("quiz-participants/{}", participant_id);
        let request = self.content_get(self.content_url(&path));
        envelope::require_data(self.executor.execute(&request).await?, "quiz attempt")
    }

    /// Record the answers picked so far
    pub async fn answer_quiz(
        &self,
        participant_id: &str,
        answers: &[QuizAnswer],
    ) -> ClientResult<()> {
        let path = format!("quiz-participants/{}/answers", participant_id);
        let body = json!({ "answers": answers });
        let request = self.content_put(self.content_url(&path), body);
        self.executor.execute(&request).await.map(|_| ())
    }

    /// Submit the attempt with its final answers
    pub async fn finish_quiz(
        &self,
        participant_id: &str,
        answers: &[QuizAnswer],
    ) -> ClientResult<()> {
        let path = format!("quiz-participants/{}/answers", participant_id);
        let body = json!({ "answers": answers, "is_finished": true });
        let request = self.content_put(self.content_url(&path), body);
        self.executor.execute(&request).await.map(|_| ())
    }
}

/// Assemble a URL with encoded query parameters
pub(crate) fn with_params(base: &str, params: &[(&str, &str)]) -> ClientResult<String> {
    let url = Url::parse_with_params(base, params.iter().copied())?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use serde_json::json;
    use stampede_auth::{build_http_client, IdentityProvider, TokenSource};
    use stampede_config::domains::platform::ServiceConfig;
    use stampede_config::{
        ClassifierConfig, HttpConfig, IdentityConfig, PlatformConfig, RetryConfig,
    };
    use stampede_store::{Credential, CredentialStore, MemoryStore};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn actor(server: &MockServer) -> ActorClient {
        let identity = IdentityConfig {
            endpoint: server.uri(),
            ..IdentityConfig::default()
        };
        let client = build_http_client(&HttpConfig::default()).unwrap();
        let provider =
            IdentityProvider::with_client(client.clone(), &identity, &RetryConfig::default());
        let store = Arc::new(MemoryStore::new());
        store
            .put(Credential::from_grant(
                "loaduser1",
                "tok-1",
                "access",
                None,
                "Bearer",
                3600,
            ))
            .await
            .unwrap();
        let tokens = Arc::new(TokenSource::new(Arc::new(provider), store, "hunter2!A"));

        let mut platform = PlatformConfig::default();
        platform.services = ServicesConfig {
            group: ServiceConfig {
                host: format!("{}/group", server.uri()),
                version: "1.1.0".to_string(),
            },
            user: ServiceConfig {
                host: format!("{}/user", server.uri()),
                version: "1.0.0".to_string(),
            },
            notification: ServiceConfig {
                host: format!("{}/notification", server.uri()),
                version: "1.1.0".to_string(),
            },
            content: ServiceConfig {
                host: format!("{}/content", server.uri()),
                version: "1.12.0".to_string(),
            },
        };

        let executor = RequestExecutor::new(
            client,
            tokens,
            Classifier::from_config(&ClassifierConfig::default()),
            stampede_config::domains::retry::RequestRetryPolicy::default(),
            &platform,
        );
        ActorClient::new(Arc::new(executor), platform.services, "loaduser1")
    }

    #[tokio::test]
    async fn test_newsfeed_paginates_with_cursor() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .and(query_param("limit", "20"))
            .and(query_param("after", "cur=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "list": [{ "id": "c1", "type": "POST" }],
                    "meta": { "hasNextPage": true, "endCursor": "cur-2" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client.newsfeed(Some("cur=1")).await.unwrap();
        assert_eq!(page.list.len(), 1);
        assert_eq!(page.list[0].kind, ContentKind::Post);
        assert!(page.meta.has_next_page);
        assert_eq!(page.meta.end_cursor.as_deref(), Some("cur-2"));
    }

    #[tokio::test]
    async fn test_filtered_newsfeed_sends_kind() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("GET"))
            .and(path("/content/newsfeed"))
            .and(query_param("type", "ARTICLE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "list": [], "meta": { "has_next_page": false } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client
            .filtered_newsfeed(ContentKind::Article, None)
            .await
            .unwrap();
        assert!(page.list.is_empty());
    }

    #[tokio::test]
    async fn test_content_detail_routes_by_kind() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("GET"))
            .and(path("/content/articles/a-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "id": "a-1", "type": "ARTICLE" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let detail = client
            .content_detail("a-1", ContentKind::Article)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.id, "a-1");

        // Unknown kinds never hit the network
        assert!(client
            .content_detail("x", ContentKind::Unknown)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_join_group_posts_empty_body_with_group_version() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("POST"))
            .and(path("/group/groups/g-1/join"))
            .and(header("x-version-id", "1.1.0"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "api.ok" })))
            .expect(1)
            .mount(&server)
            .await;

        client.join_group("g-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_join_group_absorbs_already_member() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("POST"))
            .and(path("/group/groups/g-1/join"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "group.already_member"
            })))
            .expect(1)
            .mount(&server)
            .await;

        // No error and no retry; the membership is simply already there
        client.join_group("g-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_discover_groups_reads_envelope_meta() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("GET"))
            .and(path("/group/groups/discover"))
            .and(query_param("offset", "50"))
            .and(query_param("limit", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": [
                    {
                        "group_id": "g-9",
                        "join_status": "CAN_JOIN",
                        "settings": { "is_join_approval": false }
                    }
                ],
                "meta": { "has_next_page": true, "offset": 75 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client.discover_groups(50).await.unwrap();
        assert_eq!(page.list[0].group_id, "g-9");
        assert!(page.list[0].settings_all_off());
        assert_eq!(page.meta.offset, Some(75));
    }

    #[tokio::test]
    async fn test_create_draft_post_returns_id() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("POST"))
            .and(path("/content/posts"))
            .and(body_json(json!({ "audience": { "group_ids": ["g-1"] } })))
            .and(header("x-version-id", "1.12.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "id": "post-7" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client
            .create_draft_post(&["g-1".to_string()])
            .await
            .unwrap();
        assert_eq!(created.id, "post-7");
    }

    #[tokio::test]
    async fn test_publish_post_includes_series_only_when_present() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("PUT"))
            .and(path("/content/posts/post-7/publish"))
            .and(body_json(json!({
                "content": "hello",
                "audience": { "group_ids": ["g-1"] },
                "series": ["s-1"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "api.ok" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/content/posts/post-8/publish"))
            .and(body_json(json!({ "content": "plain" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "api.ok" })))
            .expect(1)
            .mount(&server)
            .await;

        client
            .publish_post(
                "post-7",
                &PublishPost {
                    content: "hello".into(),
                    group_ids: vec!["g-1".into()],
                    series_ids: vec!["s-1".into()],
                },
            )
            .await
            .unwrap();
        client
            .publish_post(
                "post-8",
                &PublishPost {
                    content: "plain".into(),
                    ..PublishPost::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_quiz_flow_shapes() {
        let server = MockServer::start().await;
        let client = actor(&server).await;

        Mock::given(method("POST"))
            .and(path("/content/quizzes/q-1/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": "participant-1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/content/quiz-participants/participant-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": {
                    "questions": [
                        { "id": "qq-1", "answers": [{ "id": "an-1" }, { "id": "an-2" }] }
                    ],
                    "startedAt": "2024-05-01T10:00:00Z",
                    "timeLimit": 300
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/content/quiz-participants/participant-1/answers"))
            .and(body_json(json!({
                "answers": [{ "questionId": "qq-1", "answerId": "an-2" }],
                "is_finished": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "api.ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let participant = client.start_quiz("q-1").await.unwrap();
        assert_eq!(participant, "participant-1");

        let attempt = client.quiz_attempt(&participant).await.unwrap();
        assert_eq!(attempt.time_limit, 300);
        assert_eq!(attempt.questions[0].answers.len(), 2);

        let answers = vec![QuizAnswer {
            question_id: "qq-1".into(),
            answer_id: "an-2".into(),
        }];
        client.finish_quiz(&participant, &answers).await.unwrap();
    }

    #[test]
    fn test_with_params_encodes_values() {
        let url = with_params(
            "https://api.test/group/admin/communities",
            &[("key", "Load Community 7"), ("sort", "name:asc")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://api.test/group/admin/communities?key=Load+Community+7&sort=name%3Aasc"
        );
    }
}
