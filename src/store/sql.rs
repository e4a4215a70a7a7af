use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{CommentStore, RecipeFilter, RecipeStore};
use crate::error::StoreError;
use crate::models::{
    CommentRecord, IngredientInput, IngredientRow, InstructionInput, InstructionRow, NewComment,
    RecipeFields, RecipeRow, RecipeRows, RecipeSummary,
};
use crate::recipes::RatingAggregate;

const SUMMARY_COLUMNS: &str =
    "id, title, image_url, ready_in_minutes, servings, meal_type, aggregate_rating, rating_count";

#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for SqlStore {
    async fn list_comments(&self, recipe_id: &str) -> Result<Vec<CommentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, recipe_id, parent_comment_id, author_name, comment_text, created_at, updated_at
            FROM recipe_comments
            WHERE recipe_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO recipe_comments (id, recipe_id, parent_comment_id, author_name, comment_text, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&comment.recipe_id)
        .bind(&comment.parent_comment_id)
        .bind(&comment.author_name)
        .bind(&comment.comment_text)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let record = sqlx::query_as::<_, CommentRecord>(
            "SELECT id, recipe_id, parent_comment_id, author_name, comment_text, created_at, updated_at FROM recipe_comments WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_comments_by_parent(&self, parent_comment_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM recipe_comments WHERE parent_comment_id = ?")
            .bind(parent_comment_id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(
            parent_comment_id,
            deleted = result.rows_affected(),
            "deleted direct replies"
        );

        Ok(())
    }

    async fn delete_comment_by_id(&self, comment_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM recipe_comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl RecipeStore for SqlStore {
    async fn fetch_recipe(&self, recipe_id: &str) -> Result<Option<RecipeRows>, StoreError> {
        let Some(recipe) = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let ingredients = sqlx::query_as::<_, IngredientRow>(
            "SELECT id, recipe_id, name, amount, unit, original, order_index FROM ingredients WHERE recipe_id = ? ORDER BY order_index ASC",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        let instructions = sqlx::query_as::<_, InstructionRow>(
            "SELECT id, recipe_id, step_number, step_text, instruction_group FROM instructions WHERE recipe_id = ? ORDER BY step_number ASC",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RecipeRows {
            recipe,
            ingredients,
            instructions,
        }))
    }

    async fn search_recipes(&self, filter: &RecipeFilter) -> Result<Vec<RecipeSummary>, StoreError> {
        let keyword = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("%{k}%"));
        let meal_type = filter
            .meal_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        // SQLite LIKE is case-insensitive for ASCII, which matches the
        // catalog's `ilike` title search.
        let sql = format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM recipes
            WHERE (?1 IS NULL OR title LIKE ?1)
              AND (?2 IS NULL OR meal_type = ?2)
            ORDER BY created_at DESC
            LIMIT ?3 OFFSET ?4
            "#
        );

        let rows = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(keyword)
            .bind(meal_type)
            .bind(filter.per_page)
            .bind(filter.page * filter.per_page)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn popular_recipes(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<RecipeSummary>, StoreError> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM recipes ORDER BY COALESCE(aggregate_rating, 0) DESC LIMIT ? OFFSET ?"
        );

        let rows = sqlx::query_as::<_, RecipeSummary>(&sql)
            .bind(per_page)
            .bind((page - 1).max(0) * per_page)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn update_rating(&self, recipe_id: &str, rating: RatingAggregate) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE recipes SET aggregate_rating = ?, rating_count = ?, updated_at = ? WHERE id = ?",
        )
        .bind(rating.average)
        .bind(rating.count)
        .bind(Utc::now())
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_recipe(
        &self,
        fields: &RecipeFields,
        user_id: Option<&str>,
    ) -> Result<RecipeRow, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO recipes (id, user_id, title, summary, ready_in_minutes, servings, image_url, meal_type, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&fields.title)
        .bind(&fields.summary)
        .bind(fields.ready_in_minutes)
        .bind(fields.servings)
        .bind(&fields.image_url)
        .bind(&fields.meal_type)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let recipe = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?;

        Ok(recipe)
    }

    async fn update_recipe_fields(
        &self,
        recipe_id: &str,
        fields: &RecipeFields,
    ) -> Result<Option<RecipeRow>, StoreError> {
        let result = sqlx::query(
            "UPDATE recipes SET title = ?, summary = ?, ready_in_minutes = ?, servings = ?, image_url = ?, meal_type = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&fields.title)
        .bind(&fields.summary)
        .bind(fields.ready_in_minutes)
        .bind(fields.servings)
        .bind(&fields.image_url)
        .bind(&fields.meal_type)
        .bind(Utc::now())
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let recipe = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(recipe)
    }

    async fn insert_ingredients(
        &self,
        recipe_id: &str,
        ingredients: &[IngredientInput],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for (order_index, ingredient) in ingredients.iter().enumerate() {
            sqlx::query(
                "INSERT INTO ingredients (id, recipe_id, name, amount, unit, original, order_index) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(recipe_id)
            .bind(&ingredient.name)
            .bind(ingredient.amount)
            .bind(&ingredient.unit)
            .bind(&ingredient.original)
            .bind(order_index as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_instructions(
        &self,
        recipe_id: &str,
        instructions: &[InstructionInput],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for instruction in instructions {
            sqlx::query(
                "INSERT INTO instructions (id, recipe_id, step_number, step_text, instruction_group) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(recipe_id)
            .bind(instruction.step_number)
            .bind(&instruction.step_text)
            .bind(&instruction.instruction_group)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_ingredients(&self, recipe_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM ingredients WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_instructions(&self, recipe_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM instructions WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_recipe_comments(&self, recipe_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM recipe_comments WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(recipe_id, deleted = result.rows_affected(), "deleted recipe comments");

        Ok(())
    }

    async fn delete_recipe_row(&self, recipe_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
