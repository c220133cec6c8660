use std::sync::Arc;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use tracing::{info, warn};

use crate::auth::rate_limit::{RateLimitConfig, RateLimiter};
use crate::clock::Clock;
use crate::config::{AuthConfig, MAX_TOKEN_LIFETIME_SECS};
use crate::db::models::{normalize_username, Identity, Role, Session, UserId};
use crate::db::{AccountStore, SessionRegistry};
use crate::error::{AppError, AuthError};

/// Issues, rotates and reclaims session tokens.
pub struct AuthService {
    accounts: Arc<AccountStore>,
    sessions: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
    login_limiter: RateLimiter,
    token_lifetime: Duration,
    token_bytes: usize,
}

impl AuthService {
    pub fn new(
        accounts: Arc<AccountStore>,
        sessions: Arc<SessionRegistry>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            accounts,
            sessions,
            clock,
            login_limiter: RateLimiter::new(RateLimitConfig::from(config)),
            token_lifetime: Duration::seconds(
                config.token_lifetime_secs.clamp(1, MAX_TOKEN_LIFETIME_SECS),
            ),
            token_bytes: config.token_bytes,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        credential_secret: &str,
        role: Role,
    ) -> Result<Identity, AppError> {
        self.accounts
            .register(username, credential_secret, role, self.clock.now())
            .await
    }

    /// Checks credentials and opens a new session for the matching identity.
    ///
    /// Failed attempts are counted per client address and username, so one
    /// client's guesses never lock another client out. A success clears the
    /// count.
    pub async fn login(
        &self,
        username: &str,
        credential_secret: &str,
        client: Option<&str>,
    ) -> Result<(Session, Identity), AppError> {
        let now = self.clock.now();
        let key = throttle_key(client, username);
        if self.login_limiter.is_limited(&key, now).await {
            warn!("Login throttled for {}", key);
            return Err(AuthError::RateLimited.into());
        }

        let identity = match self.accounts.verify(username, credential_secret).await {
            Ok(identity) => identity,
            Err(e) => {
                self.login_limiter.record_failure(&key, now).await;
                return Err(e.into());
            }
        };
        self.login_limiter.reset(&key).await;

        let session = self.issue(&identity).await;
        info!("User {} logged in (id: {})", identity.username, identity.id);
        Ok((session, identity))
    }

    pub async fn issue(&self, identity: &Identity) -> Session {
        let now = self.clock.now();
        loop {
            let session = self.mint(identity.id, now);
            if self.sessions.insert(&session).await {
                return session;
            }
        }
    }

    /// Trades a live token for a new one. The old token is dead once this
    /// returns, whether or not the caller ever receives the replacement.
    pub async fn refresh(&self, existing_token: &str) -> Result<Session, AuthError> {
        let now = self.clock.now();
        let session = self
            .sessions
            .rotate(existing_token, now, |owner_id| self.mint(owner_id, now))
            .await?;
        info!("Token refreshed for user {}", session.owner_id);
        Ok(session)
    }

    /// Drops every session that expired before `now`, along with idle login
    /// throttle windows.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let removed = self.sessions.sweep(now).await;
        self.login_limiter.cleanup(now).await;
        if removed > 0 {
            info!("Sweep removed {} expired session(s)", removed);
        }
        removed
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn mint(&self, owner_id: UserId, now: DateTime<Utc>) -> Session {
        Session {
            token: self.generate_token(),
            owner_id,
            expires_at: now + self.token_lifetime,
        }
    }

    fn generate_token(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

fn throttle_key(client: Option<&str>, username: &str) -> String {
    format!("{}|{}", client.unwrap_or("unknown"), normalize_username(username))
}
