//! Generate → review → save state machine.
//!
//! Each operation is split into a `begin_*` call that validates and moves the
//! machine into its in-flight phase, and a `finish_*` call that applies the
//! backend's answer. The ticket returned by `begin_*` carries everything the
//! caller needs to issue the request, plus a sequence number that ties the
//! completion back to the request it answers.

use crate::error::{
    CollaboratorError, ConcurrencyError, Operation, ValidationError, WorkflowError,
    WorkflowResult,
};
use crate::model::{GeneratedRecipe, Ingredient, SavedRecipe};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Generating,
    Ready,
    Saving,
    Failed,
}

/// Request to issue for an accepted generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateTicket {
    pub seq: u64,
    pub ingredients: Vec<Ingredient>,
}

/// Request to issue for an accepted save call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub seq: u64,
    pub recipe: GeneratedRecipe,
}

#[derive(Debug, Default)]
pub struct RecipeWorkflow {
    phase: WorkflowPhase,
    candidate: Option<GeneratedRecipe>,
    last_error: Option<CollaboratorError>,
    next_seq: u64,
    in_flight: Option<(Operation, u64)>,
}

impl RecipeWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn candidate(&self) -> Option<&GeneratedRecipe> {
        self.candidate.as_ref()
    }

    /// Error from the most recent failed generate or save, cleared by the
    /// next success.
    pub fn last_error(&self) -> Option<&CollaboratorError> {
        self.last_error.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn ensure_idle(&self, op: Operation) -> WorkflowResult<()> {
        if let Some((running, _)) = self.in_flight {
            debug!(requested = %op, %running, "rejecting overlapping request");
            return Err(ConcurrencyError::Busy(op).into());
        }
        Ok(())
    }

    fn start(&mut self, op: Operation, phase: WorkflowPhase) -> u64 {
        self.next_seq += 1;
        self.in_flight = Some((op, self.next_seq));
        self.phase = phase;
        self.next_seq
    }

    fn complete(&mut self, op: Operation, seq: u64) -> WorkflowResult<()> {
        match self.in_flight {
            Some((running, s)) if running == op && s == seq => {
                self.in_flight = None;
                Ok(())
            }
            _ => {
                warn!(operation = %op, seq, "dropping response for a request that is not in flight");
                Err(ConcurrencyError::StaleResponse(op).into())
            }
        }
    }

    /// Accept a generate call for `ingredients`.
    ///
    /// Rejected without touching state when the list is empty or another
    /// generate/save is still running.
    pub fn begin_generate(&mut self, ingredients: &[Ingredient]) -> WorkflowResult<GenerateTicket> {
        if ingredients.is_empty() {
            return Err(ValidationError::NoIngredients.into());
        }
        self.ensure_idle(Operation::Generate)?;
        let seq = self.start(Operation::Generate, WorkflowPhase::Generating);
        info!(seq, count = ingredients.len(), "generate requested");
        Ok(GenerateTicket {
            seq,
            ingredients: ingredients.to_vec(),
        })
    }

    /// Apply the outcome of the generate request `seq`.
    ///
    /// On success the candidate is replaced as a whole. On failure the
    /// previous candidate, if any, is kept and the error is returned.
    pub fn finish_generate(
        &mut self,
        seq: u64,
        result: Result<GeneratedRecipe, CollaboratorError>,
    ) -> WorkflowResult<&GeneratedRecipe> {
        self.complete(Operation::Generate, seq)?;
        match result {
            Ok(recipe) => {
                info!(seq, dish = %recipe.dish_name, "recipe generated");
                self.last_error = None;
                self.phase = WorkflowPhase::Ready;
                Ok(self.candidate.insert(recipe))
            }
            Err(e) => {
                warn!(seq, error = %e, "recipe generation failed");
                self.phase = WorkflowPhase::Failed;
                self.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Accept a save call for the current candidate.
    pub fn begin_save(&mut self) -> WorkflowResult<SaveTicket> {
        let recipe = self
            .candidate
            .clone()
            .ok_or(WorkflowError::Validation(ValidationError::NoCandidate))?;
        self.ensure_idle(Operation::SaveRecipe)?;
        let seq = self.start(Operation::SaveRecipe, WorkflowPhase::Saving);
        info!(seq, dish = %recipe.dish_name, "save requested");
        Ok(SaveTicket { seq, recipe })
    }

    /// Apply the outcome of the save request `seq`.
    ///
    /// Success clears the candidate. Failure keeps it so the save can be
    /// retried without generating again.
    pub fn finish_save(
        &mut self,
        seq: u64,
        result: Result<SavedRecipe, CollaboratorError>,
    ) -> WorkflowResult<SavedRecipe> {
        self.complete(Operation::SaveRecipe, seq)?;
        match result {
            Ok(saved) => {
                info!(seq, id = %saved.id, "recipe saved");
                self.candidate = None;
                self.last_error = None;
                self.phase = WorkflowPhase::Idle;
                Ok(saved)
            }
            Err(e) => {
                warn!(seq, error = %e, "save failed, keeping candidate");
                self.phase = WorkflowPhase::Ready;
                self.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }
}
