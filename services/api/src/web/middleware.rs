//! services/api/src/web/middleware.rs
//!
//! Caller-identity middleware for protecting routes.

use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user id, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, available to handlers as an `Extension`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Middleware that reads the caller's user id from the `x-user-id` header.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, ApiError> {
    // 1. Extract the header
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("{USER_ID_HEADER} header is required")))?;

    // 2. Parse the user id
    let user_id = Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::Unauthorized(format!("Invalid {USER_ID_HEADER} format")))?;

    // 3. Insert the caller into request extensions
    req.extensions_mut().insert(CurrentUser(user_id));

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
