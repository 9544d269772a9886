//! Error taxonomy for the recipe session.
//!
//! Validation errors are raised before any request is issued, collaborator
//! errors come back from the backend, and concurrency errors guard against
//! overlapping operations. None of them are fatal.

use std::fmt;
use thiserror::Error;

/// Backend operation an error or request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    ListRecipes,
    SaveRecipe,
    DeleteRecipe,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Generate => "generate recipe",
            Operation::ListRecipes => "list saved recipes",
            Operation::SaveRecipe => "save recipe",
            Operation::DeleteRecipe => "delete recipe",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ingredient name must not be empty")]
    EmptyIngredientName,
    #[error("add at least one ingredient")]
    NoIngredients,
    #[error("no generated recipe to save")]
    NoCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("{operation} failed: {message}")]
    Transport { operation: Operation, message: String },
    #[error("{operation} failed with HTTP {status}: {detail}")]
    Status {
        operation: Operation,
        status: u16,
        detail: String,
    },
    #[error("{operation} returned an unreadable response: {message}")]
    Decode { operation: Operation, message: String },
}

impl CollaboratorError {
    pub fn operation(&self) -> Operation {
        match self {
            CollaboratorError::Transport { operation, .. }
            | CollaboratorError::Status { operation, .. }
            | CollaboratorError::Decode { operation, .. } => *operation,
        }
    }

    /// HTTP status reported by the backend, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            CollaboratorError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcurrencyError {
    #[error("cannot {0} while another request is in flight")]
    Busy(Operation),
    #[error("ignored a stale {0} response")]
    StaleResponse(Operation),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
