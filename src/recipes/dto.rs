use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    auth::dto::PublicUser,
    extract::nullable,
    recipes::repo_types::{Comment, Ingredient, Instruction, Recipe},
};

pub const RECIPE_FIELDS: &[&str] = &["name", "description", "cuisine", "cookTime", "servings"];
pub const INGREDIENT_FIELDS: &[&str] = &["name", "quantity", "unit"];
pub const INSTRUCTION_FIELDS: &[&str] = &["stepNumber", "body"];
pub const COMMENT_FIELDS: &[&str] = &["body"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub name: String,
    pub description: Option<String>,
    pub cuisine: String,
    pub cook_time: String,
    pub servings: Option<String>,
}

/// Editable recipe fields. Keys outside this set are dropped by serde.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub cuisine: Option<String>,
    pub cook_time: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub servings: Option<Option<String>>,
}

impl RecipePatch {
    pub fn apply(self, r: &mut Recipe) {
        if let Some(v) = self.name {
            r.name = v;
        }
        if let Some(v) = self.description {
            r.description = v;
        }
        if let Some(v) = self.cuisine {
            r.cuisine = v;
        }
        if let Some(v) = self.cook_time {
            r.cook_time = v;
        }
        if let Some(v) = self.servings {
            r.servings = v;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: i64,
    pub unit: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
}

impl IngredientPatch {
    pub fn apply(self, i: &mut Ingredient) {
        if let Some(v) = self.name {
            i.name = v;
        }
        if let Some(v) = self.quantity {
            i.quantity = v;
        }
        if let Some(v) = self.unit {
            i.unit = v;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstruction {
    pub step_number: i32,
    pub body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionPatch {
    pub step_number: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub body: Option<Option<String>>,
}

impl InstructionPatch {
    pub fn apply(self, i: &mut Instruction) {
        if let Some(v) = self.step_number {
            i.step_number = v;
        }
        if let Some(v) = self.body {
            i.body = v;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
    pub recipe_id: i64,
    pub user: PublicUser,
}

impl CommentView {
    pub fn new(c: Comment, user: PublicUser) -> Self {
        Self {
            id: c.id,
            body: c.body,
            date_created: c.date_created,
            recipe_id: c.recipe_id,
            user,
        }
    }
}

/// Full external projection of a recipe.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cuisine: String,
    pub cook_time: String,
    pub servings: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
    pub user_id: i64,
    pub author: PublicUser,
    pub comments: Vec<CommentView>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    pub saves: i64,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: String,
}

impl Deleted {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { success: msg.into() }
    }
}
