//! Management operations
//!
//! Provisioning runs as the platform system administrator against the
//! `admin/` surface of the group and user services. Management endpoints
//! predate service versioning, so no version header is attached; requests are
//! otherwise executed exactly like actor traffic, through the same retrying
//! executor.

use crate::api::{with_params, ActorClient};
use crate::envelope;
use crate::errors::ClientResult;
use crate::request::ApiRequest;
use crate::types::{Community, PlatformUser};
use serde_json::json;

/// Page size when resolving a community by name
const COMMUNITY_SEARCH_LIMIT: u32 = 10;

/// Administrative client wrapping a system-administrator actor
#[derive(Clone)]
pub struct AdminClient {
    inner: ActorClient,
}

impl AdminClient {
    /// Wrap an actor authenticated as the system administrator
    pub fn new(inner: ActorClient) -> Self {
        Self { inner }
    }

    /// The underlying actor, for the rare admin flow that also acts as a
    /// regular member
    pub fn actor(&self) -> &ActorClient {
        &self.inner
    }

    fn get(&self, url: impl Into<String>) -> ApiRequest {
        ApiRequest::get(self.inner.subject(), url)
    }

    fn put(&self, url: impl Into<String>, body: serde_json::Value) -> ApiRequest {
        ApiRequest::put(self.inner.subject(), url, body)
    }

    /// Resolve a community by its exact name
    ///
    /// The listing endpoint matches by prefix, so `key=Load Community 1`
    /// also returns `Load Community 10`. Only the exact name counts.
    pub async fn find_community_by_name(&self, name: &str) -> ClientResult<Option<Community>> {
        let limit = COMMUNITY_SEARCH_LIMIT.to_string();
        let url = with_params(
            &self.inner.group_url("admin/communities"),
            &[
                ("key", name),
                ("offset", "0"),
                ("limit", limit.as_str()),
                ("sort", "name:asc"),
            ],
        )?;
        let request = self.get(url);
        let page: envelope::Page<Community> = envelope::page_in_envelope(
            self.inner.executor().execute(&request).await?,
            "community search",
        )?;
        Ok(page.list.into_iter().find(|c| c.name == name))
    }

    /// Members of a community, up to `limit`
    pub async fn community_members(
        &self,
        community_id: &str,
        limit: u32,
    ) -> ClientResult<Vec<PlatformUser>> {
        let limit = limit.to_string();
        let path = format!("admin/communities/{}/members", community_id);
        let url = with_params(&self.inner.group_url(&path), &[("limit", limit.as_str())])?;
        let request = self.get(url);
        let page: envelope::Page<PlatformUser> = envelope::page_in_envelope(
            self.inner.executor().execute(&request).await?,
            "community members",
        )?;
        Ok(page.list)
    }

    /// Profile of one platform user
    pub async fn find_user_by_id(&self, user_id: &str) -> ClientResult<PlatformUser> {
        let path = format!("admin/users/{}/profile", user_id);
        let request = self.get(self.inner.user_url(&path));
        envelope::require_data(
            self.inner.executor().execute(&request).await?,
            "user profile",
        )
    }

    /// Grant community-admin rights to the given users
    pub async fn assign_community_admin(
        &self,
        community_id: &str,
        user_ids: &[String],
    ) -> ClientResult<()> {
        let path = format!("admin/communities/{}/assign-admin", community_id);
        let body = json!({ "user_ids": user_ids });
        let request = self.put(self.inner.group_url(&path), body);
        self.inner.executor().execute(&request).await.map(|_| ())
    }

    /// Revoke community-admin rights from the given users
    pub async fn revoke_community_admin(
        &self,
        community_id: &str,
        user_ids: &[String],
    ) -> ClientResult<()> {
        let path = format!("admin/communities/{}/revoke-admin", community_id);
        let body = json!({ "user_ids": user_ids });
        let request = self.put(self.inner.group_url(&path), body);
        self.inner.executor().execute(&request).await.map(|_| ())
    }

    /// Remove members from a group
    pub async fn remove_group_members(
        &self,
        group_id: &str,
        user_ids: &[String],
    ) -> ClientResult<()> {
        let path = format!("admin/groups/{}/remove-members", group_id);
        let body = json!({ "user_ids": user_ids });
        let request = self.put(self.inner.group_url(&path), body);
        self.inner.executor().execute(&request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::executor::RequestExecutor;
    use serde_json::json;
    use stampede_auth::{build_http_client, IdentityProvider, TokenSource};
    use stampede_config::domains::platform::ServiceConfig;
    use stampede_config::{
        ClassifierConfig, HttpConfig, IdentityConfig, PlatformConfig, RetryConfig,
    };
    use stampede_store::{Credential, CredentialStore, MemoryStore};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn admin(server: &MockServer) -> AdminClient {
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
                "sysadmin",
                "admin-tok",
                "access",
                None,
                "Bearer",
                3600,
            ))
            .await
            .unwrap();
        let tokens = Arc::new(TokenSource::new(Arc::new(provider), store, "hunter2!A"));

        let mut platform = PlatformConfig::default();
        platform.services.group = ServiceConfig {
            host: format!("{}/group", server.uri()),
            version: "1.1.0".to_string(),
        };
        platform.services.user = ServiceConfig {
            host: format!("{}/user", server.uri()),
            version: "1.0.0".to_string(),
        };

        let executor = RequestExecutor::new(
            client,
            tokens,
            Classifier::from_config(&ClassifierConfig::default()),
            stampede_config::domains::retry::RequestRetryPolicy::default(),
            &platform,
        );
        AdminClient::new(ActorClient::new(
            Arc::new(executor),
            platform.services,
            "sysadmin",
        ))
    }

    #[tokio::test]
    async fn test_find_community_matches_exact_name_only() {
        let server = MockServer::start().await;
        let client = admin(&server).await;

        // Management endpoints carry no version header; this guard must
        // never match
        Mock::given(method("GET"))
            .and(path("/group/admin/communities"))
            .and(header_exists("x-version-id"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/group/admin/communities"))
            .and(query_param("key", "Load Community 1"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "10"))
            .and(query_param("sort", "name:asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": [
                    { "id": "com-10", "name": "Load Community 10", "group_id": "g-10" },
                    { "id": "com-1", "name": "Load Community 1", "group_id": "g-1" }
                ],
                "meta": { "has_next_page": false }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let community = client
            .find_community_by_name("Load Community 1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(community.id, "com-1");
        assert_eq!(community.group_id, "g-1");

        // Prefix-only matches resolve to nothing
        assert!(client
            .find_community_by_name("Load Community")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_community_members_reads_bare_array() {
        let server = MockServer::start().await;
        let client = admin(&server).await;

        Mock::given(method("GET"))
            .and(path("/group/admin/communities/com-1/members"))
            .and(query_param("limit", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": [
                    { "user_id": "u-1", "username": "loaduser1" },
                    { "user_id": "u-2", "username": "loaduser2" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let members = client.community_members("com-1", 500).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id, "u-1");
        assert_eq!(members[1].username, "loaduser2");
    }

    #[tokio::test]
    async fn test_find_user_reads_profile() {
        let server = MockServer::start().await;
        let client = admin(&server).await;

        Mock::given(method("GET"))
            .and(path("/user/admin/users/u-7/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "api.ok",
                "data": { "id": "u-7", "username": "loaduser7", "email": "loaduser7@load.test" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client.find_user_by_id("u-7").await.unwrap();
        assert_eq!(user.username, "loaduser7");
    }

    #[tokio::test]
    async fn test_admin_grants_send_user_ids() {
        let server = MockServer::start().await;
        let client = admin(&server).await;

        Mock::given(method("PUT"))
            .and(path("/group/admin/communities/com-1/assign-admin"))
            .and(body_json(json!({ "user_ids": ["u-1", "u-2"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "api.ok" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/group/admin/communities/com-1/revoke-admin"))
            .and(body_json(json!({ "user_ids": ["u-1"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "api.ok" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/group/admin/groups/g-1/remove-members"))
            .and(body_json(json!({ "user_ids": ["u-2"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "api.ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let users = vec!["u-1".to_string(), "u-2".to_string()];
        client.assign_community_admin("com-1", &users).await.unwrap();
        client
            .revoke_community_admin("com-1", &users[..1])
            .await
            .unwrap();
        client
            .remove_group_members("g-1", &users[1..])
            .await
            .unwrap();
    }
}
