//! Create, update and delete across the recipe graph.
//!
//! Every mutating call takes the caller's open transaction and runs its checks
//! in a fixed order: resolve the recipe, resolve the child, confirm the child
//! belongs to that recipe, authorize, then write. Any error leaves the
//! transaction uncommitted.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::{info, warn};

use crate::{
    auth::{dto::PublicUser, repo_types::User},
    db::is_unique_violation,
    error::AppError,
    ownership::{authorize, Target},
    recipes::{
        dto::{
            CommentView, IngredientPatch, InstructionPatch, NewComment, NewIngredient,
            NewInstruction, NewRecipe, RecipePatch, RecipeView,
        },
        repo_types::{CascadeCounts, Comment, Ingredient, Instruction, Recipe, Save},
    },
};

pub async fn load_recipe(conn: &mut PgConnection, id: i64) -> Result<Recipe, AppError> {
    Recipe::find(conn, id)
        .await?
        .ok_or_else(|| recipe_not_found(id))
}

async fn lock_recipe(conn: &mut PgConnection, id: i64) -> Result<Recipe, AppError> {
    Recipe::lock(conn, id)
        .await?
        .ok_or_else(|| recipe_not_found(id))
}

fn recipe_not_found(id: i64) -> AppError {
    AppError::not_found(format!("Recipe with an ID of {id} does not exist"))
}

fn ensure_child_of(kind: &str, child_id: i64, child_recipe: i64, recipe_id: i64) -> Result<(), AppError> {
    if child_recipe == recipe_id {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "{kind} #{child_id} is not associated with recipe #{recipe_id}"
        )))
    }
}

// ---- projections ----

/// Build full projections for `recipes`, batching the child lookups.
pub async fn materialize(
    conn: &mut PgConnection,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeView>, AppError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();

    let comments = Comment::list_for_recipes(&mut *conn, &ids).await?;
    let ingredients = Ingredient::list_for_recipes(&mut *conn, &ids).await?;
    let instructions = Instruction::list_for_recipes(&mut *conn, &ids).await?;
    let save_counts: HashMap<i64, i64> = Save::counts_for_recipes(&mut *conn, &ids)
        .await?
        .into_iter()
        .collect();

    let mut user_ids: Vec<i64> = recipes
        .iter()
        .map(|r| r.user_id)
        .chain(comments.iter().map(|c| c.user_id))
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users: HashMap<i64, PublicUser> = User::find_many(&mut *conn, &user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, PublicUser::from(u)))
        .collect();
    let user = |id: i64| {
        users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {id} referenced but missing")))
    };

    let mut comments_by: HashMap<i64, Vec<CommentView>> = HashMap::new();
    for c in comments {
        let author = user(c.user_id)?;
        comments_by.entry(c.recipe_id).or_default().push(CommentView::new(c, author));
    }
    let mut ingredients_by: HashMap<i64, Vec<Ingredient>> = HashMap::new();
    for i in ingredients {
        ingredients_by.entry(i.recipe_id).or_default().push(i);
    }
    let mut instructions_by: HashMap<i64, Vec<Instruction>> = HashMap::new();
    for i in instructions {
        instructions_by.entry(i.recipe_id).or_default().push(i);
    }

    recipes
        .into_iter()
        .map(|r| -> Result<RecipeView, AppError> {
            Ok(RecipeView {
                author: user(r.user_id)?,
                comments: comments_by.remove(&r.id).unwrap_or_default(),
                ingredients: ingredients_by.remove(&r.id).unwrap_or_default(),
                instructions: instructions_by.remove(&r.id).unwrap_or_default(),
                saves: save_counts.get(&r.id).copied().unwrap_or(0),
                id: r.id,
                name: r.name,
                description: r.description,
                cuisine: r.cuisine,
                cook_time: r.cook_time,
                servings: r.servings,
                date_created: r.date_created,
                user_id: r.user_id,
            })
        })
        .collect()
}

pub async fn view(conn: &mut PgConnection, recipe: Recipe) -> Result<RecipeView, AppError> {
    materialize(conn, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("recipe projection vanished")))
}

pub async fn list_recipes(conn: &mut PgConnection) -> Result<Vec<RecipeView>, AppError> {
    let recipes = Recipe::list(&mut *conn).await?;
    materialize(conn, recipes).await
}

pub async fn get_recipe(conn: &mut PgConnection, id: i64) -> Result<RecipeView, AppError> {
    let recipe = load_recipe(&mut *conn, id).await?;
    view(conn, recipe).await
}

// ---- recipes ----

pub async fn create_recipe(
    conn: &mut PgConnection,
    actor: &User,
    new: NewRecipe,
) -> Result<RecipeView, AppError> {
    let recipe = Recipe::insert(&mut *conn, actor.id, &new).await?;
    info!(recipe_id = recipe.id, user_id = actor.id, "recipe created");
    view(conn, recipe).await
}

pub async fn update_recipe(
    conn: &mut PgConnection,
    actor: &User,
    id: i64,
    patch: RecipePatch,
) -> Result<RecipeView, AppError> {
    let mut recipe = lock_recipe(&mut *conn, id).await?;
    authorize(actor.id, Target::Recipe(&recipe))?;

    patch.apply(&mut recipe);
    let recipe = Recipe::update(&mut *conn, &recipe).await?;
    info!(recipe_id = recipe.id, "recipe updated");
    view(conn, recipe).await
}

/// Remove a recipe and everything hanging off it: ingredients, instructions,
/// comments and saves go first, then the recipe row.
pub async fn delete_recipe(
    conn: &mut PgConnection,
    actor: &User,
    id: i64,
) -> Result<(Recipe, CascadeCounts), AppError> {
    let recipe = lock_recipe(&mut *conn, id).await?;
    authorize(actor.id, Target::Recipe(&recipe))?;

    let counts = CascadeCounts {
        ingredients: Ingredient::delete_for_recipe(&mut *conn, id).await?,
        instructions: Instruction::delete_for_recipe(&mut *conn, id).await?,
        comments: Comment::delete_for_recipe(&mut *conn, id).await?,
        saves: Save::delete_for_recipe(&mut *conn, id).await?,
    };
    Recipe::delete(&mut *conn, id).await?;

    info!(recipe_id = id, ?counts, "recipe deleted");
    Ok((recipe, counts))
}

// ---- ingredients ----

async fn load_ingredient(
    conn: &mut PgConnection,
    recipe: &Recipe,
    id: i64,
) -> Result<Ingredient, AppError> {
    let ingredient = Ingredient::find(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Ingredient with an ID of {id} does not exist")))?;
    ensure_child_of("Ingredient", id, ingredient.recipe_id, recipe.id)?;
    Ok(ingredient)
}

pub async fn get_ingredient(
    conn: &mut PgConnection,
    recipe_id: i64,
    id: i64,
) -> Result<Ingredient, AppError> {
    let recipe = load_recipe(&mut *conn, recipe_id).await?;
    load_ingredient(conn, &recipe, id).await
}

pub async fn create_ingredient(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    new: NewIngredient,
) -> Result<Ingredient, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    authorize(actor.id, Target::Recipe(&recipe))?;
    let ingredient = Ingredient::insert(conn, recipe.id, actor.id, &new).await?;
    info!(ingredient_id = ingredient.id, recipe_id, "ingredient created");
    Ok(ingredient)
}

pub async fn update_ingredient(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    id: i64,
    patch: IngredientPatch,
) -> Result<Ingredient, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    let mut ingredient = load_ingredient(&mut *conn, &recipe, id).await?;
    authorize(actor.id, Target::Ingredient(&ingredient, &recipe))?;

    patch.apply(&mut ingredient);
    Ok(Ingredient::update(conn, &ingredient).await?)
}

pub async fn delete_ingredient(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    id: i64,
) -> Result<Ingredient, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    let ingredient = load_ingredient(&mut *conn, &recipe, id).await?;
    authorize(actor.id, Target::Ingredient(&ingredient, &recipe))?;

    Ingredient::delete(conn, id).await?;
    info!(ingredient_id = id, recipe_id, "ingredient deleted");
    Ok(ingredient)
}

// ---- instructions ----

async fn load_instruction(
    conn: &mut PgConnection,
    recipe: &Recipe,
    id: i64,
) -> Result<Instruction, AppError> {
    let instruction = Instruction::find(conn, id).await?.ok_or_else(|| {
        AppError::not_found(format!("Instruction with an ID of {id} does not exist"))
    })?;
    ensure_child_of("Instruction", id, instruction.recipe_id, recipe.id)?;
    Ok(instruction)
}

pub async fn get_instruction(
    conn: &mut PgConnection,
    recipe_id: i64,
    id: i64,
) -> Result<Instruction, AppError> {
    let recipe = load_recipe(&mut *conn, recipe_id).await?;
    load_instruction(conn, &recipe, id).await
}

pub async fn create_instruction(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    new: NewInstruction,
) -> Result<Instruction, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    authorize(actor.id, Target::Recipe(&recipe))?;
    let instruction = Instruction::insert(conn, recipe.id, actor.id, &new).await?;
    info!(instruction_id = instruction.id, recipe_id, "instruction created");
    Ok(instruction)
}

pub async fn update_instruction(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    id: i64,
    patch: InstructionPatch,
) -> Result<Instruction, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    let mut instruction = load_instruction(&mut *conn, &recipe, id).await?;
    authorize(actor.id, Target::Instruction(&instruction, &recipe))?;

    patch.apply(&mut instruction);
    Ok(Instruction::update(conn, &instruction).await?)
}

pub async fn delete_instruction(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    id: i64,
) -> Result<Instruction, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    let instruction = load_instruction(&mut *conn, &recipe, id).await?;
    authorize(actor.id, Target::Instruction(&instruction, &recipe))?;

    Instruction::delete(conn, id).await?;
    info!(instruction_id = id, recipe_id, "instruction deleted");
    Ok(instruction)
}

// ---- comments ----

pub async fn create_comment(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    new: NewComment,
) -> Result<CommentView, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    let comment = Comment::insert(conn, recipe.id, actor.id, &new.body).await?;
    info!(comment_id = comment.id, recipe_id, "comment created");
    Ok(CommentView::new(comment, PublicUser::from(actor)))
}

pub async fn delete_comment(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    id: i64,
) -> Result<Comment, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    let comment = Comment::find(&mut *conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Comment {id} does not exist.")))?;
    ensure_child_of("Comment", id, comment.recipe_id, recipe.id)?;
    authorize(actor.id, Target::Comment(&comment, &recipe))?;

    Comment::delete(conn, id).await?;
    info!(comment_id = id, recipe_id, "comment deleted");
    Ok(comment)
}

// ---- saves ----

pub async fn create_save(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
) -> Result<Save, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;

    if Save::exists(&mut *conn, actor.id, recipe.id).await? {
        warn!(user_id = actor.id, recipe_id, "duplicate save");
        return Err(already_saved(recipe_id));
    }

    match Save::insert(conn, actor.id, recipe.id).await {
        Ok(save) => {
            info!(save_id = save.id, recipe_id, user_id = actor.id, "recipe saved");
            Ok(save)
        }
        Err(e) if is_unique_violation(&e) => Err(already_saved(recipe_id)),
        Err(e) => Err(e.into()),
    }
}

fn already_saved(recipe_id: i64) -> AppError {
    AppError::conflict(format!("Recipe {recipe_id} is already saved"))
}

pub async fn delete_save(
    conn: &mut PgConnection,
    actor: &User,
    recipe_id: i64,
    id: i64,
) -> Result<Save, AppError> {
    let recipe = lock_recipe(&mut *conn, recipe_id).await?;
    let save = Save::find(&mut *conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Save {id} does not exist.")))?;
    ensure_child_of("Save", id, save.recipe_id, recipe.id)?;
    authorize(actor.id, Target::Save(&save))?;

    Save::delete(conn, id).await?;
    info!(save_id = id, recipe_id, "save removed");
    Ok(save)
}

pub async fn list_saves(conn: &mut PgConnection, actor: &User) -> Result<Vec<Save>, AppError> {
    Ok(Save::list_for_user(conn, actor.id).await?)
}
