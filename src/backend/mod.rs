//! Recipe backend collaborator.
//!
//! The session only talks to the backend through [`RecipeBackend`], so the
//! HTTP client can be swapped for an in-memory fake in tests.

mod client;

pub use client::HttpBackend;

use crate::error::CollaboratorError;
use crate::model::{GeneratedRecipe, Ingredient, SavedRecipe};
use async_trait::async_trait;

#[async_trait]
pub trait RecipeBackend: Send + Sync {
    /// `POST /generate`
    async fn generate(&self, ingredients: &[Ingredient])
        -> Result<GeneratedRecipe, CollaboratorError>;

    /// `GET /recipes`
    async fn list_recipes(&self) -> Result<Vec<SavedRecipe>, CollaboratorError>;

    /// `POST /recipes`
    async fn save_recipe(&self, recipe: &GeneratedRecipe)
        -> Result<SavedRecipe, CollaboratorError>;

    /// `DELETE /recipes/{id}`
    async fn delete_recipe(&self, id: &str) -> Result<(), CollaboratorError>;
}
