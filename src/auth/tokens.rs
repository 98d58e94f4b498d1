use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sqlx::PgConnection;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::{auth::repo_types::User, config::TokenConfig, error::AppError};

/// Bytes of entropy in a bearer token; hex-encoded to twice as many chars.
pub const TOKEN_BYTES: usize = 16;

/// A bearer token as handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub token_expiration: OffsetDateTime,
}

/// Token lifetime and reuse guard band.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub ttl: Duration,
    pub reuse_window: Duration,
}

impl From<&TokenConfig> for TokenPolicy {
    fn from(cfg: &TokenConfig) -> Self {
        Self {
            ttl: Duration::minutes(cfg.ttl_minutes),
            reuse_window: Duration::seconds(cfg.reuse_window_seconds),
        }
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        TokenPolicy::from(&TokenConfig::default())
    }
}

impl TokenPolicy {
    /// The user's current token, if it outlives `now` by more than the reuse window.
    pub fn reusable(&self, user: &User, now: OffsetDateTime) -> Option<IssuedToken> {
        match (&user.token, user.token_expiration) {
            (Some(token), Some(exp)) if exp > now + self.reuse_window => Some(IssuedToken {
                token: token.clone(),
                token_expiration: exp,
            }),
            _ => None,
        }
    }

    pub fn mint(&self, now: OffsetDateTime) -> IssuedToken {
        IssuedToken {
            token: generate_token(),
            token_expiration: to_micros(now + self.ttl),
        }
    }
}

/// Postgres keeps microseconds; trimming up front makes the value handed to
/// the client identical to the one read back later.
fn to_micros(t: OffsetDateTime) -> OffsetDateTime {
    t.replace_nanosecond(t.nanosecond() / 1_000 * 1_000).unwrap_or(t)
}

/// 128 random bits from the OS, lowercase hex.
pub fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// A stored token authenticates only while its expiry is strictly after `now`.
pub fn is_live(user: &User, now: OffsetDateTime) -> bool {
    user.token_expiration.is_some_and(|exp| exp > now)
}

/// Hand back the user's token, minting and persisting a fresh one unless the
/// current one is still comfortably inside its lifetime. The user row is
/// locked so concurrent calls for the same user serialize.
pub async fn issue_or_reuse(
    conn: &mut PgConnection,
    policy: &TokenPolicy,
    user_id: i64,
    now: OffsetDateTime,
) -> Result<IssuedToken, AppError> {
    let user = User::lock_by_id(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {user_id} does not exist")))?;

    if let Some(existing) = policy.reusable(&user, now) {
        debug!(user_id, "reusing bearer token");
        return Ok(existing);
    }

    let fresh = policy.mint(now);
    User::store_token(&mut *conn, user.id, &fresh.token, fresh.token_expiration).await?;
    info!(user_id, expires = %fresh.token_expiration, "bearer token minted");
    Ok(fresh)
}
