//! Session resolution.
//!
//! The `jwt` cookie is handed to the user service as-is; whatever profile it
//! resolves to is attached to the request. Routes that need a user sit
//! behind [`require_session`]; the rest call [`current_user`] and treat a
//! missing or rejected session as anonymous.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::backend::UserProfile;
use crate::http::request::session_token;
use crate::http::response::GatewayError;
use crate::http::server::AppState;

/// Profile of the user behind the request, set by [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionUser(pub UserProfile);

/// Reject requests without a resolvable session (401).
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = session_token(req.headers()) else {
        return GatewayError::Unauthorized.into_response();
    };

    match state.users.validate_session(&token).await {
        Ok(profile) => {
            tracing::debug!(user_id = profile.user_id, "Session resolved");
            req.extensions_mut().insert(SessionUser(profile));
            next.run(req).await
        }
        Err(e) if e.is_not_found() || e.is_unauthorized() => {
            tracing::debug!(error = %e, "Session rejected");
            GatewayError::Unauthorized.into_response()
        }
        Err(e) => GatewayError::Upstream(e).into_response(),
    }
}

/// Resolve the session if there is one. Failures are logged and read as
/// "anonymous".
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<UserProfile> {
    let token = session_token(headers)?;
    match state.users.validate_session(&token).await {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::debug!(error = %e, "Treating request as anonymous");
            None
        }
    }
}
