//! Backend collaborators: the opaque data service the catalog reads from and
//! writes to. Everything above this module only sees these traits.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{
    CommentRecord, IngredientInput, InstructionInput, NewComment, RecipeFields, RecipeRow,
    RecipeRows, RecipeSummary,
};
use crate::recipes::RatingAggregate;

#[cfg(test)]
pub mod memory;
mod sql;

pub use sql::SqlStore;

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// All comments of a recipe, ascending by `created_at`.
    async fn list_comments(&self, recipe_id: &str) -> Result<Vec<CommentRecord>, StoreError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<CommentRecord, StoreError>;

    /// Deletes direct children of `parent_comment_id` only.
    async fn delete_comments_by_parent(&self, parent_comment_id: &str) -> Result<(), StoreError>;

    async fn delete_comment_by_id(&self, comment_id: &str) -> Result<(), StoreError>;
}

/// Filters for the recipe search listing. Pages are zero-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub keyword: Option<String>,
    pub meal_type: Option<String>,
    pub page: i64,
    pub per_page: i64,
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn fetch_recipe(&self, recipe_id: &str) -> Result<Option<RecipeRows>, StoreError>;

    async fn search_recipes(&self, filter: &RecipeFilter) -> Result<Vec<RecipeSummary>, StoreError>;

    /// Highest rated first. `page` is one-based.
    async fn popular_recipes(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<RecipeSummary>, StoreError>;

    async fn update_rating(&self, recipe_id: &str, rating: RatingAggregate) -> Result<(), StoreError>;

    async fn insert_recipe(
        &self,
        fields: &RecipeFields,
        user_id: Option<&str>,
    ) -> Result<RecipeRow, StoreError>;

    /// `None` when there is no such recipe.
    async fn update_recipe_fields(
        &self,
        recipe_id: &str,
        fields: &RecipeFields,
    ) -> Result<Option<RecipeRow>, StoreError>;

    /// All or nothing; `order_index` is the position in `ingredients`.
    async fn insert_ingredients(
        &self,
        recipe_id: &str,
        ingredients: &[IngredientInput],
    ) -> Result<(), StoreError>;

    /// All or nothing.
    async fn insert_instructions(
        &self,
        recipe_id: &str,
        instructions: &[InstructionInput],
    ) -> Result<(), StoreError>;

    async fn delete_ingredients(&self, recipe_id: &str) -> Result<(), StoreError>;

    async fn delete_instructions(&self, recipe_id: &str) -> Result<(), StoreError>;

    async fn delete_recipe_comments(&self, recipe_id: &str) -> Result<(), StoreError>;

    /// False when there was no such recipe.
    async fn delete_recipe_row(&self, recipe_id: &str) -> Result<bool, StoreError>;
}
