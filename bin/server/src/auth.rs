//! Registration, login, and the bearer-token gate.
//!
//! Every mutating handler calls [`authenticate`] before touching the
//! store. The token in the `Authorization` header is resolved against the
//! server-side session table; nothing the client sends beyond the token
//! itself is trusted. Registration over HTTP always creates a regular
//! member account.

use crate::handlers::{acquire_write_lock, ApiError, AuthorView, SharedForumState};
use crate::persistence::PersistentForumState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use verigeek::auth::{Role, User};
use verigeek::error::{Result, VeriGeekError};

/// Resolves the caller's identity from the `Authorization: Bearer` header.
pub fn authenticate(state: &PersistentForumState, headers: &HeaderMap) -> Result<User> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| VeriGeekError::unauthorized("Authentication required"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| VeriGeekError::unauthorized("Malformed authorization header"))?;

    state
        .resolve_token(token)
        .ok_or_else(|| VeriGeekError::unauthorized("Invalid or expired session"))
}

// =============================================================================
// Request / Response DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response to a successful register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthorView,
}

fn auth_response(user: &User, token: String) -> AuthResponse {
    AuthResponse {
        token,
        user: AuthorView {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
        },
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new member account and open a session for it.
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<SharedForumState>,
    Json(request): Json<RegisterRequest>,
) -> std::result::Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut forum = acquire_write_lock(&state);

    let (user, token) = forum.register_user(
        request.name,
        request.email,
        &request.password,
        Role::Member,
    )?;

    info!("Registered user {} ({})", user.name, user.email);

    Ok((
        StatusCode::CREATED,
        Json(auth_response(&user, token.as_str().to_string())),
    ))
}

/// Verify credentials and open a session.
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<SharedForumState>,
    Json(request): Json<LoginRequest>,
) -> std::result::Result<Json<AuthResponse>, ApiError> {
    let mut forum = acquire_write_lock(&state);

    let (user, token) = forum.login(&request.email, &request.password)?;

    info!("User {} logged in", user.name);

    Ok(Json(auth_response(&user, token.as_str().to_string())))
}
