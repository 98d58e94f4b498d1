use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use crate::config::AppConfig;

/// Unit of work handed to every mutating service call. Dropping it without
/// `commit` rolls the whole operation back.
pub type Tx<'a> = Transaction<'a, Postgres>;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

/// SQLSTATE 23505.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
