use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{
        dto::{PublicUser, RegisterRequest, REGISTER_FIELDS},
        extractors::{BasicAuthUser, TokenAuthUser},
        services,
        tokens::{self, IssuedToken, TokenPolicy},
    },
    error::AppResult,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/token", get(get_token))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: JsonBody,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let req: RegisterRequest = body.parse(REGISTER_FIELDS)?;

    let mut tx = state.db.begin().await?;
    let user = services::register(&mut tx, req).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn get_token(
    State(state): State<AppState>,
    BasicAuthUser(user): BasicAuthUser,
) -> AppResult<Json<IssuedToken>> {
    let policy = TokenPolicy::from(&state.config.token);

    let mut tx = state.db.begin().await?;
    let issued = tokens::issue_or_reuse(&mut tx, &policy, user.id, OffsetDateTime::now_utc()).await?;
    tx.commit().await?;

    Ok(Json(issued))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn get_me(TokenAuthUser(user): TokenAuthUser) -> Json<PublicUser> {
    Json(user.into())
}
