//! Token issuing and caller extraction

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::client::{AuthUser, Session};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 signing keys
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issues a session for `user`
    pub fn issue(&self, user: AuthUser) -> Result<Session, AppError> {
        let now = Utc::now();
        let expires_at = (now + Duration::seconds(self.ttl_secs)).timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            exp: expires_at,
            iat: now.timestamp(),
        };
        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;
        Ok(Session {
            access_token,
            token_type: "bearer".into(),
            expires_in: self.ttl_secs,
            expires_at,
            user,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
                _ => AppError::invalid_token("Invalid token"),
            })
    }
}

/// Who is calling, resolved from the `apikey` and bearer headers
///
/// A bearer equal to the project key is an anonymous call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User { id: String, email: String, token: String },
}

impl Caller {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User { id, .. } => Some(id.as_str()),
            Self::Anonymous => None,
        }
    }

    /// Signed-in user or 401
    pub fn require_user(&self) -> Result<(&str, &str), AppError> {
        match self {
            Self::User { id, email, .. } => Ok((id.as_str(), email.as_str())),
            Self::Anonymous => Err(AppError::not_authenticated()),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get("apikey")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");
        if api_key != state.config.api_key {
            tracing::warn!(uri = %parts.uri, "Missing or wrong apikey");
            return Err(AppError::with_message(
                ErrorCode::NotAuthenticated,
                "No API key found in request",
            ));
        }

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));
        let token = match token {
            None => return Ok(Self::Anonymous),
            Some(t) if t == state.config.api_key => return Ok(Self::Anonymous),
            Some(t) => t,
        };

        if state.is_revoked(token) {
            return Err(AppError::new(ErrorCode::SessionExpired));
        }
        let claims = state.jwt.verify(token).inspect_err(|e| {
            tracing::warn!(error = %e, uri = %parts.uri, "Bearer token rejected");
        })?;
        if state.user(&claims.sub).is_none() {
            return Err(AppError::invalid_token("Unknown subject"));
        }
        Ok(Self::User {
            id: claims.sub,
            email: claims.email,
            token: token.to_string(),
        })
    }
}
