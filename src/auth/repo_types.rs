use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,               // Argon2 PHC string, never exposed
    pub date_created: OffsetDateTime,
    pub token: Option<String>,               // current bearer token, if any
    pub token_expiration: Option<OffsetDateTime>,
}

/// Fields needed to insert a user; the hash is computed before this exists.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
}
