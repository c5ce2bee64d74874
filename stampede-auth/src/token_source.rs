//! Store-backed token source with per-subject single flight

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use stampede_store::{Credential, CredentialStore};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::errors::AuthResult;
use crate::provider::IdentityProvider;

/// Get-or-create tokens for any subject, backed by the shared store
///
/// Cache hits never touch the network. On a miss, concurrent callers for the
/// same subject collapse into one provider login: the first caller holds the
/// subject's flight guard while authenticating, the rest wait and then find
/// the credential in the store. Distinct subjects proceed independently.
pub struct TokenSource {
    provider: Arc<IdentityProvider>,
    store: Arc<dyn CredentialStore>,
    password: String,
    // One guard per subject; the population is bounded by the seeded users
    flights: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TokenSource {
    pub fn new(
        provider: Arc<IdentityProvider>,
        store: Arc<dyn CredentialStore>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            password: password.into(),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// The shared credential store
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Credential for a subject; logs in through the provider if the store
    /// has none
    pub async fn token_for(&self, subject: &str) -> AuthResult<Credential> {
        if let Some(credential) = self.store.get(subject).await? {
            return Ok(credential);
        }

        let flight = self.flight_for(subject);
        let _guard = flight.lock().await;

        // Double-check: another caller may have finished the login while we
        // waited for the guard
        if let Some(credential) = self.store.get(subject).await? {
            return Ok(credential);
        }

        debug!("No stored credential for {}, logging in", subject);
        let credential = self.provider.password_auth(subject, &self.password).await?;
        self.store.put(credential.clone()).await?;
        Ok(credential)
    }

    /// Replace a subject's credential after the platform rejected it
    ///
    /// Uses the refresh grant when a refresh token is on file, otherwise a
    /// full password login. The result is written back last-writer-wins.
    pub async fn force_refresh(&self, subject: &str) -> AuthResult<Credential> {
        let flight = self.flight_for(subject);
        let _guard = flight.lock().await;

        let refresh_token = self
            .store
            .get(subject)
            .await?
            .and_then(|credential| credential.refresh_token);

        let credential = match refresh_token {
            Some(token) => self.provider.refresh_auth(subject, &token).await?,
            None => self.provider.password_auth(subject, &self.password).await?,
        };

        self.store.put(credential.clone()).await?;
        Ok(credential)
    }

    fn flight_for(&self, subject: &str) -> Arc<AsyncMutex<()>> {
        let mut flights = self.flights.lock();
        flights
            .entry(subject.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
