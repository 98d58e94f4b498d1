use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cuisine: String,
    pub cook_time: String,
    pub servings: Option<String>,
    pub date_created: OffsetDateTime,
    pub user_id: i64, // author, fixed at creation
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
    pub recipe_id: i64,
    pub user_id: i64, // creator; informational, authority comes from the recipe
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub id: i64,
    pub step_number: i32,
    pub body: Option<String>,
    pub recipe_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub date_created: OffsetDateTime,
    pub user_id: i64,
    pub recipe_id: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Save {
    pub id: i64,
    pub recipe_id: i64,
    pub user_id: i64,
}

/// Rows removed alongside a recipe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeCounts {
    pub ingredients: u64,
    pub instructions: u64,
    pub comments: u64,
    pub saves: u64,
}
