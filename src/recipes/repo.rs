use sqlx::PgConnection;

use crate::recipes::{
    dto::{NewIngredient, NewInstruction, NewRecipe},
    repo_types::{Comment, Ingredient, Instruction, Recipe, Save},
};

const RECIPE_COLUMNS: &str =
    "id, name, description, cuisine, cook_time, servings, date_created, user_id";

impl Recipe {
    pub async fn find(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<Recipe>> {
        sqlx::query_as::<_, Recipe>(&format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lock the recipe row so concurrent child mutations and deletes serialize.
    pub async fn lock(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<Recipe>> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list(conn: &mut PgConnection) -> sqlx::Result<Vec<Recipe>> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY date_created DESC, id DESC"
        ))
        .fetch_all(conn)
        .await
    }

    pub async fn insert(
        conn: &mut PgConnection,
        author_id: i64,
        new: &NewRecipe,
    ) -> sqlx::Result<Recipe> {
        sqlx::query_as::<_, Recipe>(&format!(
            r#"
            INSERT INTO recipes (name, description, cuisine, cook_time, servings, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.cuisine)
        .bind(&new.cook_time)
        .bind(&new.servings)
        .bind(author_id)
        .fetch_one(conn)
        .await
    }

    /// Write back the editable columns. `user_id` is never touched.
    pub async fn update(conn: &mut PgConnection, r: &Recipe) -> sqlx::Result<Recipe> {
        sqlx::query_as::<_, Recipe>(&format!(
            r#"
            UPDATE recipes
               SET name = $2, description = $3, cuisine = $4, cook_time = $5, servings = $6
             WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(r.id)
        .bind(&r.name)
        .bind(&r.description)
        .bind(&r.cuisine)
        .bind(&r.cook_time)
        .bind(&r.servings)
        .fetch_one(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }
}

const INGREDIENT_COLUMNS: &str = "id, name, quantity, unit, recipe_id, user_id";

impl Ingredient {
    pub async fn find(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<Ingredient>> {
        sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_for_recipes(
        conn: &mut PgConnection,
        recipe_ids: &[i64],
    ) -> sqlx::Result<Vec<Ingredient>> {
        sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE recipe_id = ANY($1) ORDER BY id"
        ))
        .bind(recipe_ids)
        .fetch_all(conn)
        .await
    }

    pub async fn insert(
        conn: &mut PgConnection,
        recipe_id: i64,
        creator_id: i64,
        new: &NewIngredient,
    ) -> sqlx::Result<Ingredient> {
        sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            INSERT INTO ingredients (name, quantity, unit, recipe_id, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.quantity)
        .bind(&new.unit)
        .bind(recipe_id)
        .bind(creator_id)
        .fetch_one(conn)
        .await
    }

    pub async fn update(conn: &mut PgConnection, i: &Ingredient) -> sqlx::Result<Ingredient> {
        sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            UPDATE ingredients SET name = $2, quantity = $3, unit = $4
             WHERE id = $1
            RETURNING {INGREDIENT_COLUMNS}
            "#
        ))
        .bind(i.id)
        .bind(&i.name)
        .bind(i.quantity)
        .bind(&i.unit)
        .fetch_one(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_for_recipe(conn: &mut PgConnection, recipe_id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }
}

const INSTRUCTION_COLUMNS: &str = "id, step_number, body, recipe_id, user_id";

impl Instruction {
    pub async fn find(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<Instruction>> {
        sqlx::query_as::<_, Instruction>(&format!(
            "SELECT {INSTRUCTION_COLUMNS} FROM instructions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_for_recipes(
        conn: &mut PgConnection,
        recipe_ids: &[i64],
    ) -> sqlx::Result<Vec<Instruction>> {
        sqlx::query_as::<_, Instruction>(&format!(
            r#"
            SELECT {INSTRUCTION_COLUMNS} FROM instructions
             WHERE recipe_id = ANY($1)
             ORDER BY step_number, id
            "#
        ))
        .bind(recipe_ids)
        .fetch_all(conn)
        .await
    }

    pub async fn insert(
        conn: &mut PgConnection,
        recipe_id: i64,
        creator_id: i64,
        new: &NewInstruction,
    ) -> sqlx::Result<Instruction> {
        sqlx::query_as::<_, Instruction>(&format!(
            r#"
            INSERT INTO instructions (step_number, body, recipe_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {INSTRUCTION_COLUMNS}
            "#
        ))
        .bind(new.step_number)
        .bind(&new.body)
        .bind(recipe_id)
        .bind(creator_id)
        .fetch_one(conn)
        .await
    }

    pub async fn update(conn: &mut PgConnection, i: &Instruction) -> sqlx::Result<Instruction> {
        sqlx::query_as::<_, Instruction>(&format!(
            r#"
            UPDATE instructions SET step_number = $2, body = $3
             WHERE id = $1
            RETURNING {INSTRUCTION_COLUMNS}
            "#
        ))
        .bind(i.id)
        .bind(i.step_number)
        .bind(&i.body)
        .fetch_one(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM instructions WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_for_recipe(conn: &mut PgConnection, recipe_id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM instructions WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }
}

const COMMENT_COLUMNS: &str = "id, body, date_created, user_id, recipe_id";

impl Comment {
    pub async fn find(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_for_recipes(
        conn: &mut PgConnection,
        recipe_ids: &[i64],
    ) -> sqlx::Result<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM comments
             WHERE recipe_id = ANY($1)
             ORDER BY date_created, id
            "#
        ))
        .bind(recipe_ids)
        .fetch_all(conn)
        .await
    }

    pub async fn insert(
        conn: &mut PgConnection,
        recipe_id: i64,
        author_id: i64,
        body: &str,
    ) -> sqlx::Result<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (body, user_id, recipe_id)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(body)
        .bind(author_id)
        .bind(recipe_id)
        .fetch_one(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_for_recipe(conn: &mut PgConnection, recipe_id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM comments WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }
}

impl Save {
    pub async fn find(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<Save>> {
        sqlx::query_as::<_, Save>("SELECT id, recipe_id, user_id FROM saves WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn exists(conn: &mut PgConnection, user_id: i64, recipe_id: i64) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM saves WHERE user_id = $1 AND recipe_id = $2)",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(conn)
        .await
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: i64) -> sqlx::Result<Vec<Save>> {
        sqlx::query_as::<_, Save>(
            "SELECT id, recipe_id, user_id FROM saves WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    /// `(recipe_id, count)` for every listed recipe that has at least one save.
    pub async fn counts_for_recipes(
        conn: &mut PgConnection,
        recipe_ids: &[i64],
    ) -> sqlx::Result<Vec<(i64, i64)>> {
        sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT recipe_id, COUNT(*) FROM saves
             WHERE recipe_id = ANY($1)
             GROUP BY recipe_id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(conn)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, user_id: i64, recipe_id: i64) -> sqlx::Result<Save> {
        sqlx::query_as::<_, Save>(
            r#"
            INSERT INTO saves (user_id, recipe_id)
            VALUES ($1, $2)
            RETURNING id, recipe_id, user_id
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(conn)
        .await
    }

    pub async fn delete(conn: &mut PgConnection, id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM saves WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_for_recipe(conn: &mut PgConnection, recipe_id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM saves WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(conn)
            .await?;
        Ok(res.rows_affected())
    }
}
