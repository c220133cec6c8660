use actix_web::{web, HttpResponse, HttpRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::middleware::bearer_token;
use crate::db::models::{Identity, Role};
use crate::error::{AppError, AuthError};
use crate::{required_field, AppState};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: Identity,
}

pub async fn signup(
    req: web::Json<SignupRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let username = required_field("username", req.username)?;
    let password = required_field("password", req.password)?;
    let role: Role = required_field("role", req.role)?
        .parse()
        .map_err(AppError::ValidationError)?;

    match state.auth_service.register(&username, &password, role).await {
        Ok(user) => {
            info!("Signup successful for username: {}", user.username);
            Ok(HttpResponse::Created().json(SignupResponse {
                message: "Signup successful",
                user,
            }))
        }
        Err(e) => {
            warn!("Signup failed for username: {}: {}", username.trim(), e);
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

pub async fn login(
    http_req: HttpRequest,
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let username = required_field("username", req.username)?;
    let password = required_field("password", req.password)?;
    let client = http_req.peer_addr().map(|addr| addr.ip().to_string());

    match state
        .auth_service
        .login(&username, &password, client.as_deref())
        .await
    {
        Ok((session, user)) => Ok(HttpResponse::Ok().json(LoginResponse {
            message: "Login successful",
            token: session.token,
            expires_at: session.expires_at,
            user,
        })),
        Err(e) => {
            warn!("Login failed for username: {}: {}", username.trim(), e);
            Err(e)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub message: &'static str,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req).ok_or(AuthError::MissingToken)?;

    let session = state.auth_service.refresh(&token).await.map_err(|e| {
        warn!("Token refresh rejected: {}", e);
        AppError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        message: "Token refreshed",
        token: session.token,
        expires_at: session.expires_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub username: Option<String>,
}

pub async fn find_user(
    query: web::Query<UserQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = required_field("username", query.into_inner().username)?;
    let user = state.accounts.find_by_username(&username).await?;
    Ok(HttpResponse::Ok().json(user))
}
