// ─── Account Session ───
// Credential exchange against the third-party authentication server and
// the in-memory identity it produces.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::header::USER_AGENT;
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::protocol::{AuthenticateRequest, AuthenticateResponse, CLIENT_IDENTIFIER};
use crate::core::config::ConfigStore;
use crate::core::error::AuthError;

/// Result of a successful exchange. Lives in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub access_token: String,
    pub profile_id: String,
    pub profile_name: String,
    pub signed_in: bool,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("access_token", &"<redacted>")
            .field("profile_id", &self.profile_id)
            .field("profile_name", &self.profile_name)
            .field("signed_in", &self.signed_in)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut { last_error: Option<String> },
    Authenticating,
    SignedIn(Identity),
}

pub struct AuthSession {
    client: Client,
    auth_url: String,
    config: Arc<ConfigStore>,
    state: RwLock<SessionState>,
    // One exchange at a time; the state machine has a single Authenticating slot.
    exchange_lock: Mutex<()>,
    // Bumped under the state write lock by every sign-out.
    sign_outs: AtomicU64,
}

impl AuthSession {
    pub fn new(client: Client, auth_url: impl Into<String>, config: Arc<ConfigStore>) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
            config,
            state: RwLock::new(SessionState::SignedOut { last_error: None }),
            exchange_lock: Mutex::new(()),
            sign_outs: AtomicU64::new(0),
        }
    }

    /// Exchange credentials for an identity.
    ///
    /// Any failure leaves the session signed out with the error recorded.
    /// A `sign_out` while the exchange is in flight wins: the result is
    /// discarded and `AuthError::Cancelled` returned.
    #[instrument(skip(self, password), fields(user = %username))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let _exchange = self.exchange_lock.lock().await;
        let epoch = {
            let mut state = self.state.write().await;
            *state = SessionState::Authenticating;
            self.sign_outs.load(Ordering::SeqCst)
        };

        let result = self.exchange(username, password).await;

        let mut state = self.state.write().await;
        if self.sign_outs.load(Ordering::SeqCst) != epoch {
            info!("Signed out during authentication, discarding the result");
            return Err(AuthError::Cancelled);
        }
        match &result {
            Ok(identity) => {
                info!("Signed in as {}", identity.profile_name);
                *state = SessionState::SignedIn(identity.clone());
            }
            Err(err) => {
                warn!("Authentication failed: {}", err);
                *state = SessionState::SignedOut {
                    last_error: Some(err.to_string()),
                };
            }
        }
        result
    }

    async fn exchange(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let settings = self.config.load().await?;
        let payload = AuthenticateRequest {
            username,
            password,
            client_token: settings.client_token(),
            request_user: true,
        };

        debug!("POST {}", self.auth_url);
        let response = self
            .client
            .post(&self.auth_url)
            .header(USER_AGENT, CLIENT_IDENTIFIER)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) if !body.trim().is_empty() => body,
                _ => status.canonical_reason().unwrap_or_default().to_string(),
            };
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let profile = AuthenticateResponse::parse(&body)?;
        Ok(Identity {
            access_token: profile.access_token,
            profile_id: profile.profile_id,
            profile_name: profile.profile_name,
            signed_in: true,
        })
    }

    pub async fn current_identity(&self) -> Option<Identity> {
        match &*self.state.read().await {
            SessionState::SignedIn(identity) => Some(identity.clone()),
            _ => None,
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Forget the identity. Local only; the server is not contacted.
    pub async fn sign_out(&self) {
        let mut state = self.state.write().await;
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if matches!(*state, SessionState::SignedIn(_)) {
            info!("Signed out");
        }
        *state = SessionState::SignedOut { last_error: None };
    }
}
