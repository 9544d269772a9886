//! Applying request completions to the session.
//!
//! Shared by every presentation layer that drives the controller, so the
//! state transition for a completion lives in one place.

use super::controller::{AppEvent, UiCommand};
use crate::error::{ConcurrencyError, WorkflowError};
use crate::session::Session;
use tracing::debug;

/// Outcome of applying one completion.
#[derive(Debug, Default)]
pub struct AppliedEvent {
    /// Status line for the user.
    pub message: Option<String>,
    /// Request to issue next, e.g. the refresh a save or delete triggers.
    pub follow_up: Option<UiCommand>,
}

impl AppliedEvent {
    fn message(msg: impl Into<String>) -> Self {
        Self {
            message: Some(msg.into()),
            follow_up: None,
        }
    }
}

fn describe(e: &WorkflowError) -> Option<String> {
    match e {
        // A completion nobody is waiting for; nothing to tell the user.
        WorkflowError::Concurrency(ConcurrencyError::StaleResponse(_)) => None,
        other => Some(other.to_string()),
    }
}

/// Apply `ev` to `session`. Each completion changes state exactly once.
pub fn apply_event(session: &mut Session, ev: AppEvent) -> AppliedEvent {
    match ev {
        AppEvent::Generated { seq, result } => match session.finish_generate(seq, result) {
            Ok(recipe) => AppliedEvent::message(format!("Generated: {}", recipe.dish_name)),
            Err(e) => AppliedEvent {
                message: describe(&e),
                follow_up: None,
            },
        },
        AppEvent::Saved { seq, result } => match session.finish_save(seq, result) {
            Ok((saved, refresh)) => AppliedEvent {
                message: Some(format!("Saved: {} ({})", saved.dish_name(), saved.id)),
                follow_up: Some(UiCommand::Refresh(refresh)),
            },
            Err(e) => AppliedEvent {
                message: describe(&e),
                follow_up: None,
            },
        },
        AppEvent::Refreshed { ticket, result } => match session.finish_refresh(ticket, result) {
            Ok(count) => {
                debug!(count, "library refreshed");
                AppliedEvent::message(format!("Refreshed: {count} saved recipe(s)"))
            }
            Err(e) => AppliedEvent {
                message: describe(&e).map(|msg| format!("Refresh failed: {msg}")),
                follow_up: None,
            },
        },
        AppEvent::Deleted { ticket, result } => match session.finish_delete(&ticket, result) {
            Ok(refresh) => AppliedEvent {
                message: Some("Deleted".into()),
                follow_up: Some(UiCommand::Refresh(refresh)),
            },
            Err(e) => AppliedEvent::message(format!("Delete failed: {e}")),
        },
        AppEvent::Info(msg) => AppliedEvent::message(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollaboratorError, Operation};
    use crate::model::{GeneratedRecipe, Ingredient, SavedRecipe, ViewState};

    fn soup() -> GeneratedRecipe {
        GeneratedRecipe {
            dish_name: "Soup".into(),
            ingredients: vec![Ingredient::new("leek", None)],
            instructions: vec!["Boil".into()],
        }
    }

    #[test]
    fn save_completion_requests_library_refresh() {
        let mut s = Session::new();
        s.ingredients.add("leek", None).unwrap();
        let g = s.begin_generate().unwrap();
        apply_event(
            &mut s,
            AppEvent::Generated {
                seq: g.seq,
                result: Ok(soup()),
            },
        );
        let t = s.begin_save().unwrap();
        let applied = apply_event(
            &mut s,
            AppEvent::Saved {
                seq: t.seq,
                result: Ok(SavedRecipe {
                    id: "42".into(),
                    recipe: soup(),
                }),
            },
        );
        assert_eq!(s.view.active(), ViewState::Library);
        assert!(matches!(applied.follow_up, Some(UiCommand::Refresh(_))));
        assert_eq!(applied.message.as_deref(), Some("Saved: Soup (42)"));
    }

    #[test]
    fn save_landing_on_open_library_still_refreshes() {
        let mut s = Session::new();
        s.ingredients.add("leek", None).unwrap();
        let g = s.begin_generate().unwrap();
        s.finish_generate(g.seq, Ok(soup())).unwrap();
        let t = s.begin_save().unwrap();
        let entry = s.select_view(ViewState::Library).unwrap();

        let applied = apply_event(
            &mut s,
            AppEvent::Saved {
                seq: t.seq,
                result: Ok(SavedRecipe {
                    id: "42".into(),
                    recipe: soup(),
                }),
            },
        );
        let Some(UiCommand::Refresh(confirm)) = applied.follow_up else {
            panic!("save must be confirmed by a refresh");
        };
        assert!(confirm.seq > entry.seq);

        // The older entry fetch is dropped without a status message.
        let stale = apply_event(
            &mut s,
            AppEvent::Refreshed {
                ticket: entry,
                result: Ok(vec![]),
            },
        );
        assert!(stale.message.is_none());
    }

    #[test]
    fn delete_completion_requests_confirmation_refresh() {
        let mut s = Session::new();
        let d = s.begin_delete("42");
        let applied = apply_event(
            &mut s,
            AppEvent::Deleted {
                ticket: d,
                result: Ok(()),
            },
        );
        assert!(matches!(applied.follow_up, Some(UiCommand::Refresh(_))));
    }

    #[test]
    fn failed_delete_has_no_follow_up() {
        let mut s = Session::new();
        let d = s.begin_delete("42");
        let applied = apply_event(
            &mut s,
            AppEvent::Deleted {
                ticket: d,
                result: Err(CollaboratorError::Status {
                    operation: Operation::DeleteRecipe,
                    status: 404,
                    detail: "Recipe not found".into(),
                }),
            },
        );
        assert!(applied.follow_up.is_none());
        assert_eq!(
            applied.message.as_deref(),
            Some("Delete failed: delete recipe failed with HTTP 404: Recipe not found")
        );
    }

    #[test]
    fn stale_generate_completion_is_silent() {
        let mut s = Session::new();
        let applied = apply_event(
            &mut s,
            AppEvent::Generated {
                seq: 99,
                result: Ok(soup()),
            },
        );
        assert!(applied.message.is_none());
        assert!(s.workflow.candidate().is_none());
    }
}
