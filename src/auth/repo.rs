use crate::auth::repo_types::{NewUser, User};
use sqlx::PgConnection;
use time::OffsetDateTime;

const USER_COLUMNS: &str = "id, first_name, last_name, email, username, password_hash, \
                            date_created, token, token_expiration";

impl User {
    /// Find a user by id.
    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a user by username.
    pub async fn find_by_username(
        conn: &mut PgConnection,
        username: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(conn)
        .await
    }

    /// Find the user currently holding `token`, regardless of its expiry.
    pub async fn find_by_token(conn: &mut PgConnection, token: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE token = $1"))
            .bind(token)
            .fetch_optional(conn)
            .await
    }

    /// Lock the user row for the rest of the transaction.
    pub async fn lock_by_id(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// True if any user already has this username or this email.
    pub async fn exists_with_username_or_email(
        conn: &mut PgConnection,
        username: &str,
        email: &str,
    ) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)"#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(conn)
        .await
    }

    /// Insert a new user.
    pub async fn create(conn: &mut PgConnection, new: &NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, username, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.username)
        .bind(new.password_hash)
        .fetch_one(conn)
        .await
    }

    /// Overwrite the stored bearer token and its expiry.
    pub async fn store_token(
        conn: &mut PgConnection,
        id: i64,
        token: &str,
        expiration: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(r#"UPDATE users SET token = $2, token_expiration = $3 WHERE id = $1"#)
            .bind(id)
            .bind(token)
            .bind(expiration)
            .execute(conn)
            .await?;
        Ok(())
    }
}

impl User {
    /// Fetch several users at once; missing ids are simply absent.
    pub async fn find_many(conn: &mut PgConnection, ids: &[i64]) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(conn)
        .await
    }
}
