use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{Error, Result};
use crate::utils::token::{decode_session_token, Claims};
use crate::AppState;

/// Claims from an `Authorization: Bearer <jwt>` header.
pub fn verify_bearer(headers: &HeaderMap, secret: &str) -> Result<Claims> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(Error::Unauthorized("missing_authorization".to_string()));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(Error::Unauthorized("bad_authorization".to_string()));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(Error::Unauthorized("unsupported_scheme".to_string()));
    };
    decode_session_token(token.trim(), secret)
}

pub fn require_admin(claims: &Claims) -> Result<()> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden("forbidden".to_string()))
    }
}

/// Route layer for endpoints outside the action router. A no-op unless
/// `REQUIRE_AUTH` is on.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(req).await;
    }
    match verify_bearer(req.headers(), &state.config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
