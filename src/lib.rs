pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod messaging;

use std::sync::Arc;
use actix_web::{web, HttpResponse};
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, Authenticator, AuthenticatedUser, RateLimiter, RateLimitConfig};
pub use clock::{Clock, SystemClock};
pub use db::{AccountStore, Identity, Message, MessageLog, Role, Session, SessionRegistry};
pub use messaging::ConversationService;

/// Accounts the original bulletin board always shipped with, registered
/// only when `accounts.seed_demo_users` is set.
const DEMO_USERS: [(&str, &str, Role); 2] = [
    ("errorTeam", "123", Role::Donor),
    ("errorTeam2", "123", Role::Donor),
];

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and live session count
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "activeSessions": state.sessions.len().await,
    }))
}

/// Rejects an absent or blank request field, naming it in the error.
pub(crate) fn required_field(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::ValidationError(format!("{} is required", field))),
    }
}

/// Registers every route plus the extractor configs that turn malformed
/// bodies and query strings into validation errors.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .route("/health", web::get().to(health_check))
    .service(
        web::scope("/api")
            .route("/signup", web::post().to(auth::handlers::signup))
            .route("/login", web::post().to(auth::handlers::login))
            .route("/refresh", web::post().to(auth::handlers::refresh))
            .route("/user", web::get().to(auth::handlers::find_user))
            .route("/messages", web::post().to(messaging::handlers::send_message))
            .route("/messages", web::get().to(messaging::handlers::list_conversation)),
    );
}

/// Application state shared across all components. Every store is created
/// here exactly once and reaches the services by handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub accounts: Arc<AccountStore>,
    pub sessions: Arc<SessionRegistry>,
    pub messages: Arc<MessageLog>,
    pub auth_service: Arc<AuthService>,
    pub authenticator: Arc<Authenticator>,
    pub conversations: Arc<ConversationService>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(config: Settings, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let accounts = Arc::new(AccountStore::new());
        let sessions = Arc::new(SessionRegistry::new());
        let messages = Arc::new(MessageLog::new());

        let auth_service = Arc::new(AuthService::new(
            accounts.clone(),
            sessions.clone(),
            clock.clone(),
            &config.auth,
        ));
        let authenticator = Arc::new(Authenticator::new(sessions.clone(), clock.clone()));
        let conversations = Arc::new(ConversationService::new(
            accounts.clone(),
            messages.clone(),
            clock,
        ));

        if config.accounts.seed_demo_users {
            for (username, secret, role) in DEMO_USERS {
                auth_service.register(username, secret, role).await?;
            }
            info!("Seeded {} demo accounts", DEMO_USERS.len());
        }

        Ok(Self {
            config: Arc::new(config),
            accounts,
            sessions,
            messages,
            auth_service,
            authenticator,
            conversations,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        // Nothing is persisted; report what is being dropped.
        info!(
            "Shutting down with {} users, {} live sessions, {} messages",
            self.accounts.count().await,
            self.sessions.len().await,
            self.messages.len().await,
        );
        Ok(())
    }
}
