use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::TokenAuthUser,
    error::AppResult,
    extract::{JsonBody, Path},
    recipes::{
        dto::{
            CommentView, Deleted, IngredientPatch, InstructionPatch, NewComment, NewIngredient,
            NewInstruction, NewRecipe, RecipePatch, RecipeView, COMMENT_FIELDS, INGREDIENT_FIELDS,
            INSTRUCTION_FIELDS, RECIPE_FIELDS,
        },
        repo_types::{Ingredient, Instruction, Save},
        services,
    },
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
        .route("/recipes/:id/ingredients/:ingredient_id", get(get_ingredient))
        .route("/recipes/:id/instructions/:instruction_id", get(get_instruction))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/:id", axum::routing::put(update_recipe).delete(delete_recipe))
        .route("/recipes/:id/comments", post(create_comment))
        .route(
            "/recipes/:id/comments/:comment_id",
            axum::routing::delete(delete_comment),
        )
        .route("/recipes/:id/ingredients", post(create_ingredient))
        .route(
            "/recipes/:id/ingredients/:ingredient_id",
            axum::routing::put(update_ingredient).delete(delete_ingredient),
        )
        .route("/recipes/:id/instructions", post(create_instruction))
        .route(
            "/recipes/:id/instructions/:instruction_id",
            axum::routing::put(update_instruction).delete(delete_instruction),
        )
        .route("/recipes/:id/saves", post(create_save))
        .route("/recipes/:id/saves/:save_id", axum::routing::delete(delete_save))
        .route("/users/me/saves", get(list_my_saves))
}

// --- reads ---

#[instrument(skip(state))]
pub async fn list_recipes(State(state): State<AppState>) -> AppResult<Json<Vec<RecipeView>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(services::list_recipes(&mut conn).await?))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RecipeView>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(services::get_recipe(&mut conn, id).await?))
}

#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path((id, ingredient_id)): Path<(i64, i64)>,
) -> AppResult<Json<Ingredient>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(services::get_ingredient(&mut conn, id, ingredient_id).await?))
}

#[instrument(skip(state))]
pub async fn get_instruction(
    State(state): State<AppState>,
    Path((id, instruction_id)): Path<(i64, i64)>,
) -> AppResult<Json<Instruction>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(services::get_instruction(&mut conn, id, instruction_id).await?))
}

// --- recipes ---

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    body: JsonBody,
) -> AppResult<(StatusCode, Json<RecipeView>)> {
    let new: NewRecipe = body.parse(RECIPE_FIELDS)?;

    let mut tx = state.db.begin().await?;
    let view = services::create_recipe(&mut tx, &user, new).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path(id): Path<i64>,
    body: JsonBody,
) -> AppResult<Json<RecipeView>> {
    let patch: RecipePatch = body.decode()?;

    let mut tx = state.db.begin().await?;
    let view = services::update_recipe(&mut tx, &user, id, patch).await?;
    tx.commit().await?;

    Ok(Json(view))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Deleted>> {
    let mut tx = state.db.begin().await?;
    let (recipe, _counts) = services::delete_recipe(&mut tx, &user, id).await?;
    tx.commit().await?;

    Ok(Json(Deleted::new(format!(
        "'{}' was successfully deleted",
        recipe.name
    ))))
}

// --- comments ---

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path(id): Path<i64>,
    body: JsonBody,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    let new: NewComment = body.parse(COMMENT_FIELDS)?;

    let mut tx = state.db.begin().await?;
    let comment = services::create_comment(&mut tx, &user, id, new).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path((id, comment_id)): Path<(i64, i64)>,
) -> AppResult<Json<Deleted>> {
    let mut tx = state.db.begin().await?;
    services::delete_comment(&mut tx, &user, id, comment_id).await?;
    tx.commit().await?;

    Ok(Json(Deleted::new(format!(
        "Comment {comment_id} was successfully deleted."
    ))))
}

// --- ingredients ---

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path(id): Path<i64>,
    body: JsonBody,
) -> AppResult<(StatusCode, Json<Ingredient>)> {
    let new: NewIngredient = body.parse(INGREDIENT_FIELDS)?;

    let mut tx = state.db.begin().await?;
    let ingredient = services::create_ingredient(&mut tx, &user, id, new).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path((id, ingredient_id)): Path<(i64, i64)>,
    body: JsonBody,
) -> AppResult<Json<Ingredient>> {
    let patch: IngredientPatch = body.decode()?;

    let mut tx = state.db.begin().await?;
    let ingredient = services::update_ingredient(&mut tx, &user, id, ingredient_id, patch).await?;
    tx.commit().await?;

    Ok(Json(ingredient))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path((id, ingredient_id)): Path<(i64, i64)>,
) -> AppResult<Json<Deleted>> {
    let mut tx = state.db.begin().await?;
    let ingredient = services::delete_ingredient(&mut tx, &user, id, ingredient_id).await?;
    tx.commit().await?;

    Ok(Json(Deleted::new(format!(
        "'{}' was successfully deleted",
        ingredient.name
    ))))
}

// --- instructions ---

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn create_instruction(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path(id): Path<i64>,
    body: JsonBody,
) -> AppResult<(StatusCode, Json<Instruction>)> {
    let new: NewInstruction = body.parse(INSTRUCTION_FIELDS)?;

    let mut tx = state.db.begin().await?;
    let instruction = services::create_instruction(&mut tx, &user, id, new).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(instruction)))
}

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn update_instruction(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path((id, instruction_id)): Path<(i64, i64)>,
    body: JsonBody,
) -> AppResult<Json<Instruction>> {
    let patch: InstructionPatch = body.decode()?;

    let mut tx = state.db.begin().await?;
    let instruction =
        services::update_instruction(&mut tx, &user, id, instruction_id, patch).await?;
    tx.commit().await?;

    Ok(Json(instruction))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_instruction(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path((id, instruction_id)): Path<(i64, i64)>,
) -> AppResult<Json<Deleted>> {
    let mut tx = state.db.begin().await?;
    let instruction = services::delete_instruction(&mut tx, &user, id, instruction_id).await?;
    tx.commit().await?;

    Ok(Json(Deleted::new(format!(
        "Step {} was successfully deleted",
        instruction.step_number
    ))))
}

// --- saves ---

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn create_save(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<Save>)> {
    let mut tx = state.db.begin().await?;
    let save = services::create_save(&mut tx, &user, id).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(save)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_save(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
    Path((id, save_id)): Path<(i64, i64)>,
) -> AppResult<Json<Deleted>> {
    let mut tx = state.db.begin().await?;
    services::delete_save(&mut tx, &user, id, save_id).await?;
    tx.commit().await?;

    Ok(Json(Deleted::new(format!("Save {save_id} was successfully deleted."))))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_my_saves(
    State(state): State<AppState>,
    TokenAuthUser(user): TokenAuthUser,
) -> AppResult<Json<Vec<Save>>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(services::list_saves(&mut conn, &user).await?))
}
