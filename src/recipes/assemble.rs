//! Flat recipe rows to the nested recipe page view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rating::RatingAggregate;
use crate::models::{IngredientRow, InstructionRow, RecipeRows};

pub const DEFAULT_GROUP: &str = "Instructions";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub id: String,
    pub original: String,
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub number: i64,
    pub step: String,
    pub instruction_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionGroup {
    pub name: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeView {
    pub id: String,
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: i64,
    pub servings: i64,
    pub summary: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instruction_groups: Vec<InstructionGroup>,
    pub meal_type: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub rating: RatingAggregate,
}

impl From<RecipeRows> for RecipeView {
    fn from(rows: RecipeRows) -> Self {
        let RecipeRows {
            recipe,
            ingredients,
            instructions,
        } = rows;

        Self {
            rating: RatingAggregate::from_stored(recipe.aggregate_rating, recipe.rating_count),
            id: recipe.id,
            title: recipe.title,
            image: recipe.image_url,
            ready_in_minutes: recipe.ready_in_minutes,
            servings: recipe.servings,
            summary: recipe.summary,
            ingredients: ingredients.into_iter().map(Ingredient::from).collect(),
            instruction_groups: group_instructions(instructions),
            meal_type: recipe.meal_type,
            user_id: recipe.user_id,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: row.id,
            original: row.original,
            name: row.name,
            amount: row.amount,
            unit: row.unit,
            order_index: row.order_index,
        }
    }
}

/// Groups steps by their group name; ungrouped steps go under
/// [`DEFAULT_GROUP`]. Groups appear in the order they are first seen and
/// steps keep their input order.
pub fn group_instructions(instructions: Vec<InstructionRow>) -> Vec<InstructionGroup> {
    let mut groups: Vec<InstructionGroup> = Vec::new();

    for row in instructions {
        let name = row.instruction_group.as_deref().unwrap_or(DEFAULT_GROUP);
        let step = Step {
            number: row.step_number,
            step: row.step_text,
            instruction_group: row.instruction_group.clone(),
        };

        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.steps.push(step),
            None => groups.push(InstructionGroup {
                name: name.to_string(),
                steps: vec![step],
            }),
        }
    }

    groups
}
