//! Creating, replacing and deleting recipes.
//!
//! A recipe is written as three separate requests: the recipe row, its
//! ingredients, then its instructions. When a later request of a create
//! fails, the rows already written are deleted again. That undo is best
//! effort; if it fails too the leftovers are logged and the original error
//! is returned. Updates replace both lists wholesale and do not roll back.

use crate::comments::ForestCache;
use crate::error::{StoreError, ValidationError};
use crate::models::{RecipeForm, RecipeRows};
use crate::store::RecipeStore;

impl RecipeForm {
    /// Trims text, turns blank optional text into `None` and checks the
    /// numeric fields.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        let fields = &mut self.fields;
        fields.title = fields.title.trim().to_string();
        if fields.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if fields.ready_in_minutes < 0 {
            return Err(ValidationError::OutOfRange {
                field: "ready_in_minutes",
            });
        }
        if fields.servings < 1 {
            return Err(ValidationError::OutOfRange { field: "servings" });
        }

        blank_to_none(&mut fields.summary);
        blank_to_none(&mut fields.image_url);
        blank_to_none(&mut fields.meal_type);
        for ingredient in &mut self.ingredients {
            blank_to_none(&mut ingredient.unit);
        }
        for instruction in &mut self.instructions {
            blank_to_none(&mut instruction.instruction_group);
        }

        Ok(self)
    }
}

fn blank_to_none(value: &mut Option<String>) {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
    }
}

pub async fn create_recipe(
    store: &dyn RecipeStore,
    form: &RecipeForm,
    user_id: Option<&str>,
) -> Result<RecipeRows, StoreError> {
    let recipe = store.insert_recipe(&form.fields, user_id).await?;
    let recipe_id = recipe.id.as_str();

    if !form.ingredients.is_empty() {
        if let Err(err) = store.insert_ingredients(recipe_id, &form.ingredients).await {
            tracing::warn!(recipe_id, error = %err, "ingredients not saved, removing recipe");
            undo_create(store, recipe_id, false).await;
            return Err(err);
        }
    }

    if !form.instructions.is_empty() {
        if let Err(err) = store.insert_instructions(recipe_id, &form.instructions).await {
            tracing::warn!(recipe_id, error = %err, "instructions not saved, removing recipe");
            undo_create(store, recipe_id, true).await;
            return Err(err);
        }
    }

    tracing::info!(recipe_id, "recipe created");
    written(store, recipe_id).await
}

async fn undo_create(store: &dyn RecipeStore, recipe_id: &str, ingredients_written: bool) {
    if ingredients_written {
        if let Err(err) = store.delete_ingredients(recipe_id).await {
            tracing::error!(recipe_id, error = %err, "could not remove ingredients of failed recipe");
        }
    }

    if let Err(err) = store.delete_recipe_row(recipe_id).await {
        tracing::error!(recipe_id, error = %err, "could not remove failed recipe");
    }
}

/// `None` when there is no such recipe.
pub async fn update_recipe(
    store: &dyn RecipeStore,
    recipe_id: &str,
    form: &RecipeForm,
) -> Result<Option<RecipeRows>, StoreError> {
    if store
        .update_recipe_fields(recipe_id, &form.fields)
        .await?
        .is_none()
    {
        return Ok(None);
    }

    store.delete_ingredients(recipe_id).await?;
    store.delete_instructions(recipe_id).await?;

    if !form.ingredients.is_empty() {
        store.insert_ingredients(recipe_id, &form.ingredients).await?;
    }
    if !form.instructions.is_empty() {
        store
            .insert_instructions(recipe_id, &form.instructions)
            .await?;
    }

    tracing::info!(recipe_id, "recipe updated");
    written(store, recipe_id).await.map(Some)
}

/// Removes the recipe with its ingredients, instructions and comments.
/// Returns false when there was no such recipe.
pub async fn delete_recipe(
    store: &dyn RecipeStore,
    forests: &ForestCache,
    recipe_id: &str,
) -> Result<bool, StoreError> {
    store.delete_ingredients(recipe_id).await?;
    store.delete_instructions(recipe_id).await?;
    store.delete_recipe_comments(recipe_id).await?;
    forests.invalidate(recipe_id).await;

    let deleted = store.delete_recipe_row(recipe_id).await?;
    if deleted {
        tracing::info!(recipe_id, "recipe deleted");
    }
    Ok(deleted)
}

async fn written(store: &dyn RecipeStore, recipe_id: &str) -> Result<RecipeRows, StoreError> {
    store.fetch_recipe(recipe_id).await?.ok_or_else(|| {
        StoreError::Unavailable(format!("recipe {recipe_id} missing right after it was written"))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use sqlx::SqlitePool;

    use super::*;
    use crate::db::memory_db;
    use crate::models::{
        IngredientInput, InstructionInput, NewComment, RecipeFields, RecipeRow, RecipeSummary,
    };
    use crate::recipes::RatingAggregate;
    use crate::store::{CommentStore, RecipeFilter, SqlStore};

    /// The SQL store with switchable failures on the list inserts.
    struct FlakyStore {
        inner: SqlStore,
        fail_ingredients: AtomicBool,
        fail_instructions: AtomicBool,
    }

    impl FlakyStore {
        fn new(pool: SqlitePool) -> Self {
            Self {
                inner: SqlStore::new(pool),
                fail_ingredients: AtomicBool::new(false),
                fail_instructions: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl RecipeStore for FlakyStore {
        async fn fetch_recipe(&self, recipe_id: &str) -> Result<Option<RecipeRows>, StoreError> {
            self.inner.fetch_recipe(recipe_id).await
        }

        async fn search_recipes(&self, filter: &RecipeFilter) -> Result<Vec<RecipeSummary>, StoreError> {
            self.inner.search_recipes(filter).await
        }

        async fn popular_recipes(
            &self,
            page: i64,
            per_page: i64,
        ) -> Result<Vec<RecipeSummary>, StoreError> {
            self.inner.popular_recipes(page, per_page).await
        }

        async fn update_rating(&self, recipe_id: &str, rating: RatingAggregate) -> Result<(), StoreError> {
            self.inner.update_rating(recipe_id, rating).await
        }

        async fn insert_recipe(
            &self,
            fields: &RecipeFields,
            user_id: Option<&str>,
        ) -> Result<RecipeRow, StoreError> {
            self.inner.insert_recipe(fields, user_id).await
        }

        async fn update_recipe_fields(
            &self,
            recipe_id: &str,
            fields: &RecipeFields,
        ) -> Result<Option<RecipeRow>, StoreError> {
            self.inner.update_recipe_fields(recipe_id, fields).await
        }

        async fn insert_ingredients(
            &self,
            recipe_id: &str,
            ingredients: &[IngredientInput],
        ) -> Result<(), StoreError> {
            if self.fail_ingredients.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("insert ingredients failed".to_string()));
            }
            self.inner.insert_ingredients(recipe_id, ingredients).await
        }

        async fn insert_instructions(
            &self,
            recipe_id: &str,
            instructions: &[InstructionInput],
        ) -> Result<(), StoreError> {
            if self.fail_instructions.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("insert instructions failed".to_string()));
            }
            self.inner.insert_instructions(recipe_id, instructions).await
        }

        async fn delete_ingredients(&self, recipe_id: &str) -> Result<(), StoreError> {
            self.inner.delete_ingredients(recipe_id).await
        }

        async fn delete_instructions(&self, recipe_id: &str) -> Result<(), StoreError> {
            self.inner.delete_instructions(recipe_id).await
        }

        async fn delete_recipe_comments(&self, recipe_id: &str) -> Result<(), StoreError> {
            self.inner.delete_recipe_comments(recipe_id).await
        }

        async fn delete_recipe_row(&self, recipe_id: &str) -> Result<bool, StoreError> {
            self.inner.delete_recipe_row(recipe_id).await
        }
    }

    fn form(title: &str) -> RecipeForm {
        RecipeForm {
            fields: RecipeFields {
                title: title.to_string(),
                summary: Some("  ".to_string()),
                ready_in_minutes: 30,
                servings: 4,
                image_url: None,
                meal_type: Some("dinner".to_string()),
            },
            ingredients: vec![
                IngredientInput {
                    name: "rice".to_string(),
                    amount: Some(2.0),
                    unit: Some("cup".to_string()),
                    original: "2 cups rice".to_string(),
                },
                IngredientInput {
                    name: "salt".to_string(),
                    amount: None,
                    unit: Some(String::new()),
                    original: "salt".to_string(),
                },
            ],
            instructions: vec![
                InstructionInput {
                    step_number: 1,
                    step_text: "Rinse".to_string(),
                    instruction_group: Some("Prep".to_string()),
                },
                InstructionInput {
                    step_number: 2,
                    step_text: "Boil".to_string(),
                    instruction_group: None,
                },
            ],
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn form_validation() {
        let valid = form("  Rice  ").validate().unwrap();
        assert_eq!(valid.fields.title, "Rice");
        assert_eq!(valid.fields.summary, None);
        assert_eq!(valid.ingredients[1].unit, None);

        assert_eq!(form(" ").validate(), Err(ValidationError::EmptyTitle));

        let mut no_servings = form("Rice");
        no_servings.fields.servings = 0;
        assert_eq!(
            no_servings.validate().unwrap_err().field(),
            "servings"
        );
    }

    #[tokio::test]
    async fn create_writes_all_three_parts() {
        let pool = memory_db().await;
        let store = FlakyStore::new(pool.clone());

        let rows = create_recipe(&store, &form("Rice"), Some("user-1")).await.unwrap();

        assert_eq!(rows.recipe.user_id.as_deref(), Some("user-1"));
        assert_eq!(rows.ingredients.len(), 2);
        assert_eq!(rows.instructions.len(), 2);
        assert_eq!(count(&pool, "recipes").await, 1);
    }

    #[tokio::test]
    async fn failed_instructions_remove_recipe_and_ingredients() {
        let pool = memory_db().await;
        let store = FlakyStore::new(pool.clone());
        store.fail_instructions.store(true, Ordering::SeqCst);

        let res = create_recipe(&store, &form("Rice"), None).await;

        assert!(matches!(res, Err(StoreError::Unavailable(_))));
        assert_eq!(count(&pool, "recipes").await, 0);
        assert_eq!(count(&pool, "ingredients").await, 0);
        assert_eq!(count(&pool, "instructions").await, 0);
    }

    #[tokio::test]
    async fn failed_ingredients_remove_recipe() {
        let pool = memory_db().await;
        let store = FlakyStore::new(pool.clone());
        store.fail_ingredients.store(true, Ordering::SeqCst);

        assert!(create_recipe(&store, &form("Rice"), None).await.is_err());
        assert_eq!(count(&pool, "recipes").await, 0);
    }

    #[tokio::test]
    async fn update_replaces_lists() {
        let pool = memory_db().await;
        let store = FlakyStore::new(pool.clone());
        let created = create_recipe(&store, &form("Rice"), None).await.unwrap();
        let id = created.recipe.id;

        let mut edited = form("Fried Rice");
        edited.ingredients.truncate(1);
        edited.instructions.clear();
        let rows = update_recipe(&store, &id, &edited).await.unwrap().unwrap();

        assert_eq!(rows.recipe.title, "Fried Rice");
        assert_eq!(rows.ingredients.len(), 1);
        assert!(rows.instructions.is_empty());
        assert!(update_recipe(&store, "missing", &edited).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_comments_and_invalidates_the_thread() {
        let pool = memory_db().await;
        let store = FlakyStore::new(pool.clone());
        let forests = ForestCache::new(Duration::from_secs(30), Duration::from_secs(300));
        let id = create_recipe(&store, &form("Rice"), None)
            .await
            .unwrap()
            .recipe
            .id;

        let root = store
            .inner
            .insert_comment(NewComment {
                recipe_id: id.clone(),
                comment_text: "tasty".to_string(),
                author_name: None,
                parent_comment_id: None,
            })
            .await
            .unwrap();
        store
            .inner
            .insert_comment(NewComment {
                recipe_id: id.clone(),
                comment_text: "agreed".to_string(),
                author_name: None,
                parent_comment_id: Some(root.id),
            })
            .await
            .unwrap();
        assert_eq!(forests.forest(&id, &store.inner).await.unwrap().len(), 2);

        assert!(delete_recipe(&store, &forests, &id).await.unwrap());

        assert_eq!(count(&pool, "recipe_comments").await, 0);
        assert_eq!(count(&pool, "ingredients").await, 0);
        assert!(forests.forest(&id, &store.inner).await.unwrap().is_empty());
        assert!(!delete_recipe(&store, &forests, &id).await.unwrap());
    }
}
