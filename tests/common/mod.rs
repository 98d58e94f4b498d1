//! Shared fixtures for database-backed tests.
#![allow(dead_code)]

use cookbook::{
    auth::{dto::RegisterRequest, repo_types::User, services},
    recipes::{
        dto::{NewIngredient, NewInstruction, NewRecipe},
        repo_types::Recipe,
    },
};
use sqlx::PgPool;

pub fn register_request(username: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        first_name: "Test".into(),
        last_name: username.into(),
        username: username.into(),
        email: email.into(),
        password: format!("{username}-password"),
    }
}

pub async fn user(pool: &PgPool, username: &str) -> User {
    let mut conn = pool.acquire().await.unwrap();
    services::register(&mut conn, register_request(username, &format!("{username}@example.com")))
        .await
        .expect("register user")
}

pub fn new_recipe(name: &str) -> NewRecipe {
    NewRecipe {
        name: name.into(),
        description: Some("family favourite".into()),
        cuisine: "Italian".into(),
        cook_time: "45 min".into(),
        servings: Some("4".into()),
    }
}

pub fn new_ingredient(name: &str) -> NewIngredient {
    NewIngredient {
        name: name.into(),
        quantity: 1,
        unit: "cup".into(),
    }
}

pub fn new_instruction(step: i32) -> NewInstruction {
    NewInstruction {
        step_number: step,
        body: Some(format!("step {step}")),
    }
}

pub async fn recipe_row(pool: &PgPool, id: i64) -> Option<Recipe> {
    let mut conn = pool.acquire().await.unwrap();
    Recipe::find(&mut conn, id).await.unwrap()
}

pub async fn count_rows(pool: &PgPool, table: &str, recipe_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table} WHERE recipe_id = $1"))
        .bind(recipe_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
