use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use base64ct::{Base64, Encoding};
use time::OffsetDateTime;

use super::{repo_types::User, services};
use crate::{
    error::{AppError, AuthScheme},
    state::AppState,
};

/// Identity resolved from HTTP Basic credentials. Only the token endpoint
/// accepts this.
pub struct BasicAuthUser(pub User);

/// Identity resolved from a live bearer token.
pub struct TokenAuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for BasicAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = authorization(parts, AuthScheme::Basic)?;
        let (username, password) = parse_basic(header).ok_or_else(|| {
            AppError::unauthenticated(AuthScheme::Basic, "Invalid Authorization header")
        })?;

        let mut conn = state.db.acquire().await?;
        let user = services::authenticate_password(&mut conn, &username, &password).await?;
        Ok(BasicAuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TokenAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = authorization(parts, AuthScheme::Bearer)?;
        let token = parse_bearer(header).ok_or_else(|| {
            AppError::unauthenticated(AuthScheme::Bearer, "Invalid Authorization header")
        })?;

        let mut conn = state.db.acquire().await?;
        let user = services::authenticate_token(&mut conn, token, OffsetDateTime::now_utc()).await?;
        Ok(TokenAuthUser(user))
    }
}

fn authorization(parts: &Parts, scheme: AuthScheme) -> Result<&str, AppError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthenticated(scheme, "Missing Authorization header"))
}

fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let (given, rest) = header.split_once(' ')?;
    given.eq_ignore_ascii_case(scheme).then(|| rest.trim())
}

/// `Basic base64(username:password)`; the password may itself contain ':'.
pub(crate) fn parse_basic(header: &str) -> Option<(String, String)> {
    let encoded = strip_scheme(header, "Basic")?;
    let decoded = Base64::decode_vec(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub(crate) fn parse_bearer(header: &str) -> Option<&str> {
    strip_scheme(header, "Bearer").filter(|t| !t.is_empty())
}
