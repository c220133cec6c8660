use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::db::models::{normalize_username, Identity, Role, UserId};
use crate::error::{AppError, AuthError};

/// Registered identities in signup order. Ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct AccountStore {
    users: Arc<RwLock<Vec<Identity>>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(
        &self,
        username: &str,
        credential_secret: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Identity, AppError> {
        let normalized = normalize_username(username);
        if normalized.is_empty() {
            return Err(AppError::ValidationError("username is required".into()));
        }

        // Check and insert under one write guard so two signups racing on the
        // same name cannot both succeed.
        let mut users = self.users.write().await;
        if users.iter().any(|u| normalize_username(&u.username) == normalized) {
            return Err(AppError::ConflictError("Username already exists".into()));
        }

        let identity = Identity {
            id: users.len() as UserId + 1,
            username: username.trim().to_string(),
            credential_secret: credential_secret.to_string(),
            role,
            created_at: now,
        };
        users.push(identity.clone());

        info!("Registered user {} (id: {}, role: {})", identity.username, identity.id, identity.role);
        Ok(identity)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Identity, AppError> {
        let normalized = normalize_username(username);
        self.users
            .read()
            .await
            .iter()
            .find(|u| normalize_username(&u.username) == normalized)
            .cloned()
            .ok_or_else(|| AppError::NotFoundError("User not found".into()))
    }

    pub async fn exists(&self, id: UserId) -> bool {
        self.users.read().await.iter().any(|u| u.id == id)
    }

    /// Unknown username and wrong secret collapse into the same error.
    pub async fn verify(&self, username: &str, credential_secret: &str) -> Result<Identity, AuthError> {
        match self.find_by_username(username).await {
            Ok(identity) if identity.credential_secret == credential_secret => Ok(identity),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}
