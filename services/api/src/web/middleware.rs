//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::RequestError;
use crate::web::state::AppState;

/// The caller, as established by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Middleware that validates the bearer token and extracts the caller.
///
/// If valid, inserts an `AuthenticatedUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, RequestError> {
    // 1. Extract the token from the Authorization header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or(RequestError::MissingToken)?;

    // 2. Verify it against the identity provider's keys
    let claims = state.verifier.verify(token).await.map_err(|rejection| {
        debug!("Rejected bearer token: {}", rejection);
        RequestError::TokenInvalid
    })?;

    // 3. Insert the caller into request extensions
    req.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
    });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Extracts the token from a `Bearer <token>` header value. The scheme is case-insensitive.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_accepts_any_scheme_case() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_blanks() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}
