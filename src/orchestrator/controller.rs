//! Request controller.
//!
//! Runs backend requests issued by the UI and emits one completion event per
//! request for presentation layers to apply.

use crate::backend::RecipeBackend;
use crate::error::{CollaboratorError, Operation};
use crate::library::{DeleteTicket, RefreshTicket};
use crate::model::{GeneratedRecipe, SavedRecipe};
use crate::workflow::{GenerateTicket, SaveTicket};
use anyhow::Result;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Commands emitted by UI layers. Each carries the ticket the session handed
/// out when it accepted the operation.
#[derive(Debug, Clone)]
pub enum UiCommand {
    Generate(GenerateTicket),
    Save(SaveTicket),
    Refresh(RefreshTicket),
    Delete(DeleteTicket),
    Quit,
}

/// Completion of a request started by a [`UiCommand`].
#[derive(Debug, Clone)]
pub enum AppEvent {
    Generated {
        seq: u64,
        result: Result<GeneratedRecipe, CollaboratorError>,
    },
    Saved {
        seq: u64,
        result: Result<SavedRecipe, CollaboratorError>,
    },
    Refreshed {
        ticket: RefreshTicket,
        result: Result<Vec<SavedRecipe>, CollaboratorError>,
    },
    Deleted {
        ticket: DeleteTicket,
        result: Result<(), CollaboratorError>,
    },
    Info(String),
}

/// Turn a panicking backend call into a failure of `operation`, so the
/// completion still carries its ticket back to the session.
async fn guarded<T>(
    operation: Operation,
    call: impl Future<Output = Result<T, CollaboratorError>>,
) -> Result<T, CollaboratorError> {
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(_) => {
            warn!(%operation, "request task panicked");
            Err(CollaboratorError::Transport {
                operation,
                message: "request task panicked".into(),
            })
        }
    }
}

fn spawn_request(tasks: &mut JoinSet<AppEvent>, backend: Arc<dyn RecipeBackend>, cmd: UiCommand) {
    match cmd {
        UiCommand::Generate(ticket) => {
            tasks.spawn(async move {
                let result = guarded(Operation::Generate, backend.generate(&ticket.ingredients)).await;
                AppEvent::Generated {
                    seq: ticket.seq,
                    result,
                }
            });
        }
        UiCommand::Save(ticket) => {
            tasks.spawn(async move {
                let result = guarded(Operation::SaveRecipe, backend.save_recipe(&ticket.recipe)).await;
                AppEvent::Saved {
                    seq: ticket.seq,
                    result,
                }
            });
        }
        UiCommand::Refresh(ticket) => {
            tasks.spawn(async move {
                let result = guarded(Operation::ListRecipes, backend.list_recipes()).await;
                AppEvent::Refreshed { ticket, result }
            });
        }
        UiCommand::Delete(ticket) => {
            tasks.spawn(async move {
                let result = guarded(Operation::DeleteRecipe, backend.delete_recipe(&ticket.id)).await;
                AppEvent::Deleted { ticket, result }
            });
        }
        UiCommand::Quit => {}
    }
}

/// Run requests as they arrive and forward their completions.
///
/// Requests run concurrently; completions are forwarded in the order they
/// finish. Quit (or the command channel closing) aborts whatever is still in
/// flight.
pub async fn run_controller(
    backend: Arc<dyn RecipeBackend>,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut tasks: JoinSet<AppEvent> = JoinSet::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Quit) | None => {
                        if !tasks.is_empty() {
                            debug!(in_flight = tasks.len(), "aborting in-flight requests");
                        }
                        tasks.abort_all();
                        break;
                    }
                    Some(cmd) => {
                        debug!(?cmd, "dispatching request");
                        spawn_request(&mut tasks, backend.clone(), cmd);
                    }
                }
            }
            // JoinSet::join_next resolves to None immediately when empty; park
            // instead so the select does not spin.
            done = async {
                if tasks.is_empty() {
                    futures::future::pending().await
                } else {
                    tasks.join_next().await
                }
            } => {
                match done {
                    Some(Ok(ev)) => {
                        if event_tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "request task failed");
                        let _ = event_tx.send(AppEvent::Info(format!("Request task failed: {e}")));
                    }
                    None => {}
                }
            }
        }
    }

    Ok(())
}
