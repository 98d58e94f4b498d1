use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgConnection;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::RegisterRequest,
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
        tokens,
    },
    db::is_unique_violation,
    error::{AppError, AuthScheme},
};

const DUPLICATE_USER: &str = "A user with that username and/or email already exists";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Usernames are stored and looked up without surrounding whitespace.
pub(crate) fn normalize_username(raw: &str) -> &str {
    raw.trim()
}

/// Create a user. The pre-check gives the common case a clean error; the
/// unique constraints catch whatever races past it.
pub async fn register(conn: &mut PgConnection, mut req: RegisterRequest) -> Result<User, AppError> {
    req.email = req.email.trim().to_lowercase();
    req.username = normalize_username(&req.username).to_string();

    if req.username.is_empty() {
        return Err(AppError::validation("username must not be empty"));
    }
    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    if User::exists_with_username_or_email(&mut *conn, &req.username, &req.email).await? {
        warn!(username = %req.username, email = %req.email, "username or email already registered");
        return Err(AppError::conflict(DUPLICATE_USER));
    }

    let hash = hash_password(&req.password)?;
    let new = NewUser {
        first_name: &req.first_name,
        last_name: &req.last_name,
        email: &req.email,
        username: &req.username,
        password_hash: &hash,
    };

    match User::create(&mut *conn, &new).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user registered");
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %req.username, "registration lost a uniqueness race");
            Err(AppError::conflict(DUPLICATE_USER))
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve basic credentials to a user. Unknown usernames and bad passwords
/// are indistinguishable to the caller.
pub async fn authenticate_password(
    conn: &mut PgConnection,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let username = normalize_username(username);
    let Some(user) = User::find_by_username(conn, username).await? else {
        warn!(%username, "login unknown username");
        return Err(invalid_credentials());
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    Ok(user)
}

/// Resolve a bearer token to its user. Does not extend or rotate the token.
pub async fn authenticate_token(
    conn: &mut PgConnection,
    token: &str,
    now: OffsetDateTime,
) -> Result<User, AppError> {
    let Some(user) = User::find_by_token(conn, token).await? else {
        warn!("unknown bearer token");
        return Err(invalid_token());
    };

    if !tokens::is_live(&user, now) {
        warn!(user_id = user.id, "expired bearer token");
        return Err(invalid_token());
    }

    Ok(user)
}

fn invalid_credentials() -> AppError {
    AppError::unauthenticated(AuthScheme::Basic, "Invalid credentials")
}

fn invalid_token() -> AppError {
    AppError::unauthenticated(AuthScheme::Bearer, "Invalid or expired token")
}
