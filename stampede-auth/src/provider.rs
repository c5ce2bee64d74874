//! Identity-provider client
//!
//! Implements the InitiateAuth token protocol: a JSON POST to a single
//! endpoint, discriminated by the `AuthFlow` field and an `X-Amz-Target`
//! header. Password logins and refresh grants run under separate retry
//! policies; an explicit credential rejection aborts the login loop at once
//! since no number of retries can fix a wrong password.

use serde::{Deserialize, Serialize};
use stampede_config::domains::retry::{LoginRetryPolicy, RefreshRetryPolicy};
use stampede_config::{HttpConfig, IdentityConfig, RetryConfig};
use stampede_store::Credential;
use tracing::{debug, error, warn};

use crate::errors::{AuthError, AuthResult};
use crate::http::build_http_client;

const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const PASSWORD_FLOW: &str = "USER_PASSWORD_AUTH";
const REFRESH_FLOW: &str = "REFRESH_TOKEN_AUTH";

/// Provider error types that mean the credentials themselves are bad
const REJECTION_TYPES: [&str; 4] = [
    "NotAuthorizedException",
    "UserNotFoundException",
    "PasswordResetRequiredException",
    "UserNotConfirmedException",
];

/// Client for the identity provider's token endpoint
pub struct IdentityProvider {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    login_policy: LoginRetryPolicy,
    refresh_policy: RefreshRetryPolicy,
}

/// Token payload of a successful InitiateAuth call
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticationResult {
    #[serde(rename = "IdToken")]
    pub id_token: String,

    #[serde(rename = "AccessToken")]
    pub access_token: String,

    /// Only present on password grants; refresh grants reuse the old one
    #[serde(rename = "RefreshToken")]
    pub refresh_token: Option<String>,

    #[serde(rename = "ExpiresIn")]
    pub expires_in: u64,

    #[serde(rename = "TokenType", default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[derive(Debug, Serialize)]
struct InitiateAuthRequest<'a> {
    #[serde(rename = "AuthParameters")]
    auth_parameters: AuthParameters<'a>,

    #[serde(rename = "AuthFlow")]
    auth_flow: &'a str,

    #[serde(rename = "ClientId")]
    client_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AuthParameters<'a> {
    Password {
        #[serde(rename = "USERNAME")]
        username: &'a str,
        #[serde(rename = "PASSWORD")]
        password: &'a str,
    },
    Refresh {
        #[serde(rename = "REFRESH_TOKEN")]
        refresh_token: &'a str,
    },
}

#[derive(Debug, Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthenticationResult>,
}

/// Error body the provider returns on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,

    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Outcome of a single InitiateAuth attempt
enum AttemptError {
    /// Credentials are wrong; do not retry
    Rejected(String),
    /// Transport or provider hiccup; the policy decides whether to retry
    Retryable(String),
}

impl IdentityProvider {
    /// Build a provider with its own HTTP client
    pub fn from_config(
        identity: &IdentityConfig,
        http: &HttpConfig,
        retry: &RetryConfig,
    ) -> AuthResult<Self> {
        let client = build_http_client(http).map_err(AuthError::ClientBuild)?;
        Ok(Self::with_client(client, identity, retry))
    }

    /// Build a provider on an existing HTTP client
    pub fn with_client(
        client: reqwest::Client,
        identity: &IdentityConfig,
        retry: &RetryConfig,
    ) -> Self {
        Self {
            client,
            endpoint: identity.endpoint.clone(),
            client_id: identity.client_id.clone(),
            login_policy: retry.login.clone(),
            refresh_policy: retry.refresh.clone(),
        }
    }

    /// Authenticate a subject with username and password
    ///
    /// Transient failures are retried under the login policy with a fixed
    /// delay. An explicit rejection short-circuits the loop.
    pub async fn password_auth(&self, username: &str, password: &str) -> AuthResult<Credential> {
        let request = InitiateAuthRequest {
            auth_parameters: AuthParameters::Password { username, password },
            auth_flow: PASSWORD_FLOW,
            client_id: &self.client_id,
        };

        for attempt in 1..=self.login_policy.max_attempts {
            match self.initiate_auth(&request).await {
                Ok(result) => {
                    debug!("Obtained token for {} on attempt {}", username, attempt);
                    return Ok(Credential::from_grant(
                        username,
                        result.id_token,
                        result.access_token,
                        result.refresh_token,
                        result.token_type,
                        result.expires_in,
                    ));
                }
                Err(AttemptError::Rejected(reason)) => {
                    error!("Credentials rejected for {}: {}", username, reason);
                    return Err(AuthError::CredentialsRejected {
                        username: username.to_string(),
                        reason,
                    });
                }
                Err(AttemptError::Retryable(reason)) => {
                    if attempt < self.login_policy.max_attempts {
                        warn!(
                            "Login attempt {} failed for {}, retrying in {:?}: {}",
                            attempt, username, self.login_policy.delay, reason
                        );
                        tokio::time::sleep(self.login_policy.delay).await;
                    } else {
                        error!(
                            "Login attempt {} failed for {}, giving up: {}",
                            attempt, username, reason
                        );
                    }
                }
            }
        }

        Err(AuthError::TokenUnavailable {
            username: username.to_string(),
        })
    }

    /// Exchange a refresh token for fresh id and access tokens
    ///
    /// The provider omits a new refresh token in refresh grants, so the old
    /// one is carried into the returned credential. Delay grows linearly
    /// with the attempt number.
    pub async fn refresh_auth(&self, username: &str, refresh_token: &str) -> AuthResult<Credential> {
        let request = InitiateAuthRequest {
            auth_parameters: AuthParameters::Refresh { refresh_token },
            auth_flow: REFRESH_FLOW,
            client_id: &self.client_id,
        };

        for attempt in 1..=self.refresh_policy.max_attempts {
            match self.initiate_auth(&request).await {
                Ok(result) => {
                    debug!("Refreshed token for {} on attempt {}", username, attempt);
                    let carried_refresh = result
                        .refresh_token
                        .or_else(|| Some(refresh_token.to_string()));
                    return Ok(Credential::from_grant(
                        username,
                        result.id_token,
                        result.access_token,
                        carried_refresh,
                        result.token_type,
                        result.expires_in,
                    ));
                }
                Err(AttemptError::Rejected(reason)) => {
                    error!("Refresh rejected for {}: {}", username, reason);
                    return Err(AuthError::CredentialsRejected {
                        username: username.to_string(),
                        reason,
                    });
                }
                Err(AttemptError::Retryable(reason)) => {
                    if attempt < self.refresh_policy.max_attempts {
                        let delay = self.refresh_policy.backoff_base * attempt;
                        warn!(
                            "Refresh attempt {} failed for {}, retrying in {:?}: {}",
                            attempt, username, delay, reason
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        error!(
                            "Refresh attempt {} failed for {}, giving up: {}",
                            attempt, username, reason
                        );
                    }
                }
            }
        }

        Err(AuthError::RefreshFailed {
            username: username.to_string(),
        })
    }

    async fn initiate_auth(
        &self,
        request: &InitiateAuthRequest<'_>,
    ) -> Result<AuthenticationResult, AttemptError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "*/*")
            .header("X-Amz-Target", INITIATE_AUTH_TARGET)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: InitiateAuthResponse = response
                .json()
                .await
                .map_err(|e| AttemptError::Retryable(format!("invalid response body: {}", e)))?;
            return body.authentication_result.ok_or_else(|| {
                AttemptError::Retryable("response missing AuthenticationResult".to_string())
            });
        }

        let body: ProviderErrorBody = response.json().await.unwrap_or_default();
        let kind = body.kind.unwrap_or_default();
        let reason = match body.message {
            Some(message) => format!("{}: {}", kind, message),
            None => format!("{} (HTTP {})", kind, status.as_u16()),
        };

        // Error types can come namespaced ("service#NotAuthorizedException")
        if status.is_client_error() && REJECTION_TYPES.iter().any(|t| kind.ends_with(t)) {
            Err(AttemptError::Rejected(reason))
        } else {
            Err(AttemptError::Retryable(reason))
        }
    }
}
