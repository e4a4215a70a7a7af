//! Who is making the request. Handlers ask for a session explicitly through
//! one of the extractors below.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::error::ApiError;
use crate::models::{Claims, Session};
use crate::state::AppState;

/// The session carried by the bearer token, if any. A missing, malformed or
/// expired token is simply no session.
pub fn current_session(headers: &HeaderMap, secret: &str) -> Option<Session> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => Some(Session::from(data.claims)),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring invalid bearer token");
            None
        }
    }
}

pub fn issue_token(
    session: &Session,
    secret: &str,
    valid_for: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + valid_for).timestamp().max(0) as usize;
    let claims = Claims {
        sub: session.user_id.clone(),
        email: session.email.clone(),
        is_admin: session.is_admin,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub struct MaybeSession(pub Option<Session>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(current_session(&parts.headers, &state.secret_key)))
    }
}

pub struct RequireSession(pub Session);

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        current_session(&parts.headers, &state.secret_key)
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}
