//! Recipe pages, ratings and recipe writes.

pub mod assemble;
pub mod rating;
pub mod write;

pub use assemble::{InstructionGroup, RecipeView, group_instructions};
pub use rating::RatingAggregate;
pub use write::{create_recipe, delete_recipe, update_recipe};
