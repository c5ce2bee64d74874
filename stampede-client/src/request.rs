//! Request descriptors
//!
//! An [`ApiRequest`] is immutable across retry attempts; only the
//! authorization and correlation headers are re-resolved per attempt by the
//! executor.

use reqwest::Method;
use serde_json::Value;

/// One logical platform call, on behalf of one subject
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including query parameters
    pub url: String,
    /// JSON body, if the method carries one
    pub body: Option<Value>,
    /// Value for the version header; admin endpoints send none
    pub version: Option<String>,
    /// Username whose credential authenticates the call
    pub subject: String,
}

impl ApiRequest {
    pub fn get(subject: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
            version: None,
            subject: subject.into(),
        }
    }

    pub fn post(subject: impl Into<String>, url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: Some(body),
            version: None,
            subject: subject.into(),
        }
    }

    pub fn put(subject: impl Into<String>, url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PUT,
            url: url.into(),
            body: Some(body),
            version: None,
            subject: subject.into(),
        }
    }

    pub fn delete(subject: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            body: None,
            version: None,
            subject: subject.into(),
        }
    }

    /// Attach a service version for the version header
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders_set_method_and_body() {
        let get = ApiRequest::get("loaduser1", "https://api.test/content/newsfeed");
        assert_eq!(get.method, Method::GET);
        assert!(get.body.is_none());
        assert!(get.version.is_none());

        let post = ApiRequest::post("loaduser1", "https://api.test/group/1/join", json!({}));
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.body, Some(json!({})));

        let put = ApiRequest::put("loaduser1", "https://api.test/posts/1", json!({"a": 1}))
            .with_version("1.12.0");
        assert_eq!(put.method, Method::PUT);
        assert_eq!(put.version.as_deref(), Some("1.12.0"));
        assert_eq!(put.subject, "loaduser1");
    }
}
