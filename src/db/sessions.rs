//! Session registry: the single authority on which tokens are live.
//!
//! Entries are keyed by the SHA-256 digest of the token, so a raw credential
//! only exists in the response that delivered it. Every read-then-decide
//! sequence runs under one write guard, which makes lookup-and-evict,
//! rotation and sweeping atomic with respect to each other.

use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::models::{Session, UserId};
use crate::error::AuthError;

type TokenDigest = [u8; 32];

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    owner_id: UserId,
    expires_at: DateTime<Utc>,
}

fn digest(token: &str) -> TokenDigest {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(token.as_bytes()));
    out
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<TokenDigest, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `session` unless its token is already present. Returns whether
    /// the insert happened.
    pub async fn insert(&self, session: &Session) -> bool {
        let mut sessions = self.sessions.write().await;
        Self::insert_locked(&mut sessions, session)
    }

    fn insert_locked(sessions: &mut HashMap<TokenDigest, SessionEntry>, session: &Session) -> bool {
        let key = digest(&session.token);
        if sessions.contains_key(&key) {
            return false;
        }
        sessions.insert(
            key,
            SessionEntry {
                owner_id: session.owner_id,
                expires_at: session.expires_at,
            },
        );
        true
    }

    /// Resolves `token` to its owner. An expired entry is removed before the
    /// error is returned, so it can never authenticate again.
    pub async fn lookup(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let mut sessions = self.sessions.write().await;
        Self::check_locked(&mut sessions, &digest(token), now)
    }

    fn check_locked(
        sessions: &mut HashMap<TokenDigest, SessionEntry>,
        key: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<UserId, AuthError> {
        let entry = *sessions.get(key).ok_or(AuthError::InvalidToken)?;
        if now > entry.expires_at {
            sessions.remove(key);
            debug!("Evicted expired session of user {} on lookup", entry.owner_id);
            return Err(AuthError::TokenExpired);
        }
        Ok(entry.owner_id)
    }

    /// Replaces the session behind `old_token` with one produced by `mint`
    /// for the same owner. `mint` is retried if it yields a token that is
    /// already registered. The old token stops validating before the guard
    /// is released.
    pub async fn rotate<F>(
        &self,
        old_token: &str,
        now: DateTime<Utc>,
        mut mint: F,
    ) -> Result<Session, AuthError>
    where
        F: FnMut(UserId) -> Session,
    {
        let mut sessions = self.sessions.write().await;
        let old_key = digest(old_token);
        let owner_id = Self::check_locked(&mut sessions, &old_key, now)?;
        sessions.remove(&old_key);

        loop {
            let session = mint(owner_id);
            if Self::insert_locked(&mut sessions, &session) {
                return Ok(session);
            }
        }
    }

    /// Removes every entry with `expires_at < now` in one pass and returns how
    /// many were dropped.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let keep = entry.expires_at >= now;
            if !keep {
                debug!("Swept expired session of user {}", entry.owner_id);
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn contains(&self, token: &str) -> bool {
        self.sessions.read().await.contains_key(&digest(token))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Earliest expiry still held, if any.
    pub async fn oldest_expiry(&self) -> Option<DateTime<Utc>> {
        self.sessions.read().await.values().map(|e| e.expires_at).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(token: &str, owner_id: UserId, expires_at: DateTime<Utc>) -> Session {
        Session {
            token: token.to_string(),
            owner_id,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_lookup_live_session() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        assert!(registry.insert(&session("abc", 1, now + Duration::minutes(30))).await);

        assert_eq!(registry.lookup("abc", now).await, Ok(1));
        assert_eq!(registry.lookup("abc", now + Duration::minutes(30)).await, Ok(1));
    }

    #[tokio::test]
    async fn test_duplicate_token_not_inserted() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        assert!(registry.insert(&session("abc", 1, now + Duration::minutes(30))).await);
        assert!(!registry.insert(&session("abc", 2, now + Duration::minutes(30))).await);

        assert_eq!(registry.lookup("abc", now).await, Ok(1));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.lookup("missing", Utc::now()).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_expired_lookup_evicts() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        registry.insert(&session("old", 1, now - Duration::seconds(1))).await;

        assert_eq!(registry.lookup("old", now).await, Err(AuthError::TokenExpired));
        assert!(!registry.contains("old").await);
        assert_eq!(registry.lookup("old", now).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_rotate_replaces_session() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        registry.insert(&session("t1", 7, now + Duration::minutes(30))).await;

        let new = registry
            .rotate("t1", now, |owner| session("t2", owner, now + Duration::minutes(30)))
            .await
            .unwrap();

        assert_eq!(new.owner_id, 7);
        assert_eq!(registry.lookup("t1", now).await, Err(AuthError::InvalidToken));
        assert_eq!(registry.lookup("t2", now).await, Ok(7));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_rotate_retries_on_collision() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        registry.insert(&session("t1", 1, now + Duration::minutes(30))).await;
        registry.insert(&session("taken", 2, now + Duration::minutes(30))).await;

        let mut candidates = vec!["fresh", "taken"];
        let new = registry
            .rotate("t1", now, |owner| {
                session(candidates.pop().unwrap(), owner, now + Duration::minutes(30))
            })
            .await
            .unwrap();

        assert_eq!(new.token, "fresh");
        assert_eq!(registry.lookup("taken", now).await, Ok(2));
    }

    #[tokio::test]
    async fn test_rotate_expired_fails_and_evicts() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        registry.insert(&session("t1", 1, now - Duration::seconds(5))).await;

        let result = registry
            .rotate("t1", now, |owner| session("t2", owner, now + Duration::minutes(30)))
            .await;

        assert_eq!(result.unwrap_err(), AuthError::TokenExpired);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        registry.insert(&session("past", 1, now - Duration::seconds(1))).await;
        registry.insert(&session("edge", 2, now)).await;
        registry.insert(&session("future", 3, now + Duration::minutes(1))).await;

        assert_eq!(registry.sweep(now).await, 1);
        assert!(!registry.contains("past").await);
        assert!(registry.contains("edge").await);
        assert!(registry.contains("future").await);
        assert!(registry.oldest_expiry().await.map_or(true, |t| t >= now));
    }
}
