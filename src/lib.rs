//! Terminal client for a recipe generation backend.
//!
//! The [`session::Session`] owns all client state: the pending
//! [`ingredients::IngredientList`], the generate/save
//! [`workflow::RecipeWorkflow`], the saved recipe cache
//! ([`library::SavedRecipeStore`]) and the active view
//! ([`view::ViewCoordinator`]). The backend is reached through
//! [`backend::RecipeBackend`].

pub mod backend;
pub mod cli;
pub mod error;
pub mod ingredients;
pub mod library;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod session;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
pub mod view;
pub mod workflow;
