use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::db::models::UserId;
use crate::error::AppError;
use crate::AppState;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
///
/// `None` only when the header is absent. A header that is present but holds
/// no usable bearer token yields an empty string, which resolves as an
/// invalid token rather than a missing one.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| {
            let (scheme, rest) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| rest.trim())
        })
        .unwrap_or_default();
    Some(token.to_string())
}

/// The caller as established by the session registry. Handlers that take
/// this extractor never see a request whose token failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("application state not configured".into()))?;
            let id = state.authenticator.resolve(token.as_deref()).await?;
            Ok(AuthenticatedUser { id })
        })
    }
}
