use std::sync::Arc;
use tracing::warn;

use crate::clock::Clock;
use crate::db::models::UserId;
use crate::db::SessionRegistry;
use crate::error::AuthError;

/// Turns a presented token into the caller's user id.
pub struct Authenticator {
    sessions: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn new(sessions: Arc<SessionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    /// `None` means no credential was presented at all. An expired token is
    /// evicted as part of the failed lookup, so it fails as `InvalidToken`
    /// from then on.
    pub async fn resolve(&self, presented: Option<&str>) -> Result<UserId, AuthError> {
        let token = presented.ok_or(AuthError::MissingToken)?;
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        self.sessions
            .lookup(token, self.clock.now())
            .await
            .map_err(|e| {
                warn!("Rejected token: {}", e);
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{MockClock, SystemClock};
    use crate::db::models::Session;
    use chrono::{Duration, Utc};

    fn authenticator() -> (Authenticator, Arc<SessionRegistry>) {
        let sessions = Arc::new(SessionRegistry::new());
        (Authenticator::new(sessions.clone(), Arc::new(SystemClock)), sessions)
    }

    #[tokio::test]
    async fn test_missing_and_unknown_tokens() {
        let (auth, _) = authenticator();
        assert_eq!(auth.resolve(None).await, Err(AuthError::MissingToken));
        assert_eq!(auth.resolve(Some("")).await, Err(AuthError::InvalidToken));
        assert_eq!(auth.resolve(Some("nope")).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_resolves_live_token() {
        let (auth, sessions) = authenticator();
        sessions
            .insert(&Session {
                token: "live".into(),
                owner_id: 4,
                expires_at: Utc::now() + Duration::minutes(30),
            })
            .await;

        assert_eq!(auth.resolve(Some("live")).await, Ok(4));
        assert_eq!(auth.resolve(Some("live")).await, Ok(4));
    }

    #[tokio::test]
    async fn test_expired_token_fails_then_disappears() {
        let (auth, sessions) = authenticator();
        sessions
            .insert(&Session {
                token: "stale".into(),
                owner_id: 1,
                expires_at: Utc::now() - Duration::seconds(1),
            })
            .await;

        assert_eq!(auth.resolve(Some("stale")).await, Err(AuthError::TokenExpired));
        assert!(!sessions.contains("stale").await);
        assert_eq!(auth.resolve(Some("stale")).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_no_resurrection_after_expiry() {
        let sessions = Arc::new(SessionRegistry::new());
        let start = Utc::now();
        let mut clock = MockClock::new();
        let mut ticks = vec![start + Duration::hours(1), start + Duration::minutes(31)];
        clock.expect_now().returning(move || ticks.pop().unwrap_or(start));
        let auth = Authenticator::new(sessions.clone(), Arc::new(clock));

        sessions
            .insert(&Session {
                token: "t".into(),
                owner_id: 1,
                expires_at: start + Duration::minutes(30),
            })
            .await;

        assert_eq!(auth.resolve(Some("t")).await, Err(AuthError::TokenExpired));
        // Later lookups fail too, even with a clock that reads earlier.
        assert!(auth.resolve(Some("t")).await.is_err());
        assert!(auth.resolve(Some("t")).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolve_of_expired_token() {
        let sessions = Arc::new(SessionRegistry::new());
        let auth = Arc::new(Authenticator::new(sessions.clone(), Arc::new(SystemClock)));
        sessions
            .insert(&Session {
                token: "stale".into(),
                owner_id: 1,
                expires_at: Utc::now() - Duration::seconds(1),
            })
            .await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let auth = auth.clone();
                tokio::spawn(async move { auth.resolve(Some("stale")).await })
            })
            .collect();

        let mut expired = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => panic!("expired token authenticated"),
                Err(AuthError::TokenExpired) => expired += 1,
                Err(e) => assert_eq!(e, AuthError::InvalidToken),
            }
        }
        assert_eq!(expired, 1);
    }
}
