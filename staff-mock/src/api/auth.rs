use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use shared::client::{AuthUser, Session, SignInRequest};
use shared::error::{AppError, AppResult};

use crate::auth::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    grant_type: String,
}

/// POST /auth/v1/token?grant_type=password
pub async fn token(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Query(params): Query<TokenParams>,
    Json(req): Json<SignInRequest>,
) -> AppResult<Json<Session>> {
    if params.grant_type != "password" {
        return Err(AppError::invalid_request(format!(
            "Unsupported grant type: {}",
            params.grant_type
        )));
    }
    let Some(user) = state.authenticate(&req.email, &req.password) else {
        tracing::warn!(email = %req.email, "Password sign-in rejected");
        return Err(AppError::invalid_credentials());
    };
    let session = state.jwt.issue(AuthUser {
        id: user.id.clone(),
        email: user.email.clone(),
    })?;
    tracing::info!(user_id = %user.id, "Signed in");
    Ok(Json(session))
}

/// GET /auth/v1/user
pub async fn user(caller: Caller) -> AppResult<Json<AuthUser>> {
    let (id, email) = caller.require_user()?;
    Ok(Json(AuthUser {
        id: id.to_string(),
        email: email.to_string(),
    }))
}

/// POST /auth/v1/logout
pub async fn logout(State(state): State<Arc<AppState>>, caller: Caller) -> AppResult<StatusCode> {
    match &caller {
        Caller::User { id, token, .. } => {
            state.revoke(token);
            tracing::info!(user_id = %id, "Signed out");
            Ok(StatusCode::NO_CONTENT)
        }
        Caller::Anonymous => Err(AppError::not_authenticated()),
    }
}
