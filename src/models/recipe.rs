use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RecipeRow {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub ready_in_minutes: i64,
    pub servings: i64,
    pub image_url: Option<String>,
    pub meal_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub aggregate_rating: Option<f64>,
    pub rating_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct IngredientRow {
    pub id: String,
    pub recipe_id: String,
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub original: String,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InstructionRow {
    pub id: String,
    pub recipe_id: String,
    pub step_number: i64,
    pub step_text: String,
    pub instruction_group: Option<String>,
}

/// Everything the store returns for a single recipe page, still flat.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRows {
    pub recipe: RecipeRow,
    pub ingredients: Vec<IngredientRow>,
    pub instructions: Vec<InstructionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RecipeSummary {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub ready_in_minutes: i64,
    pub servings: i64,
    pub meal_type: Option<String>,
    pub aggregate_rating: Option<f64>,
    pub rating_count: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub meal_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PopularQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RateRecipe {
    pub rating: u8,
    pub previous_rating: Option<u8>,
}

/// Recipe columns a user edits through the recipe form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecipeFields {
    pub title: String,
    pub summary: Option<String>,
    pub ready_in_minutes: i64,
    pub servings: i64,
    pub image_url: Option<String>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub original: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstructionInput {
    pub step_number: i64,
    pub step_text: String,
    pub instruction_group: Option<String>,
}

/// Create/update payload. Ingredient order is list order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecipeForm {
    #[serde(flatten)]
    pub fields: RecipeFields,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub instructions: Vec<InstructionInput>,
}
