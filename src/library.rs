//! Client-side cache of saved recipes.
//!
//! The backend is the source of truth. The cache is replaced wholesale by
//! every successful refresh; deletes and saves apply the matching local edit
//! and are followed by a confirmation refresh issued by the session.

use crate::error::{CollaboratorError, ConcurrencyError, Operation, WorkflowResult};
use crate::model::SavedRecipe;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTicket {
    pub id: String,
}

#[derive(Debug, Default)]
enum Cache {
    #[default]
    NotLoaded,
    Loaded(Vec<SavedRecipe>),
}

/// What the library view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryStatus<'a> {
    /// Never fetched and nothing in flight (e.g. the first fetch failed).
    NotLoaded,
    /// First fetch still running.
    Loading,
    /// Fetched, and the backend has no saved recipes.
    Empty,
    Recipes(&'a [SavedRecipe]),
}

#[derive(Debug, Default)]
pub struct SavedRecipeStore {
    cache: Cache,
    next_seq: u64,
    refreshes_in_flight: usize,
    // Refreshes issued before this seq predate the latest completed mutation.
    confirmed_from: u64,
    refreshed_at: Option<OffsetDateTime>,
    last_error: Option<CollaboratorError>,
}

impl SavedRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LibraryStatus<'_> {
        match &self.cache {
            Cache::NotLoaded if self.refreshes_in_flight > 0 => LibraryStatus::Loading,
            Cache::NotLoaded => LibraryStatus::NotLoaded,
            Cache::Loaded(list) if list.is_empty() => LibraryStatus::Empty,
            Cache::Loaded(list) => LibraryStatus::Recipes(list),
        }
    }

    pub fn recipes(&self) -> &[SavedRecipe] {
        match &self.cache {
            Cache::NotLoaded => &[],
            Cache::Loaded(list) => list,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.refreshes_in_flight > 0
    }

    pub fn len(&self) -> usize {
        self.recipes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SavedRecipe> {
        self.recipes().get(index)
    }

    pub fn find(&self, id: &str) -> Option<&SavedRecipe> {
        self.recipes().iter().find(|r| r.id == id)
    }

    pub fn refreshed_at(&self) -> Option<OffsetDateTime> {
        self.refreshed_at
    }

    pub fn last_error(&self) -> Option<&CollaboratorError> {
        self.last_error.as_ref()
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.next_seq += 1;
        self.refreshes_in_flight += 1;
        debug!(seq = self.next_seq, in_flight = self.refreshes_in_flight, "refresh requested");
        RefreshTicket { seq: self.next_seq }
    }

    /// Make `ticket` the refresh confirming a completed save or delete.
    /// Refreshes issued before it can no longer replace the cache.
    pub fn confirm_with(&mut self, ticket: RefreshTicket) -> RefreshTicket {
        self.confirmed_from = self.confirmed_from.max(ticket.seq);
        ticket
    }

    pub fn begin_confirmation_refresh(&mut self) -> RefreshTicket {
        let ticket = self.begin_refresh();
        self.confirm_with(ticket)
    }

    /// Apply a fetch-all response. Responses are applied in the order they
    /// complete and the last one to arrive wins, except that a fetch issued
    /// before the latest confirmation is rejected as stale.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<SavedRecipe>, CollaboratorError>,
    ) -> WorkflowResult<usize> {
        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
        if ticket.seq < self.confirmed_from {
            debug!(
                seq = ticket.seq,
                confirmed_from = self.confirmed_from,
                "dropping refresh issued before the last mutation"
            );
            return Err(ConcurrencyError::StaleResponse(Operation::ListRecipes).into());
        }
        match result {
            Ok(list) => {
                info!(seq = ticket.seq, count = list.len(), "saved recipes refreshed");
                let count = list.len();
                self.cache = Cache::Loaded(list);
                self.refreshed_at = Some(OffsetDateTime::now_utc());
                self.last_error = None;
                Ok(count)
            }
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "refresh failed, keeping cached list");
                self.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Accept a delete for `id`. The id need not be cached; whether it exists
    /// is for the backend to say.
    pub fn begin_delete(&mut self, id: impl Into<String>) -> DeleteTicket {
        let id = id.into();
        info!(%id, "delete requested");
        DeleteTicket { id }
    }

    /// Apply the outcome of a delete. On success no cached entry carries the
    /// id afterwards; on failure the cache is untouched.
    pub fn finish_delete(
        &mut self,
        ticket: &DeleteTicket,
        result: Result<(), CollaboratorError>,
    ) -> WorkflowResult<()> {
        match result {
            Ok(()) => {
                if let Cache::Loaded(list) = &mut self.cache {
                    list.retain(|r| r.id != ticket.id);
                }
                info!(id = %ticket.id, "recipe deleted");
                Ok(())
            }
            Err(e) => {
                warn!(id = %ticket.id, error = %e, "delete failed");
                self.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Reflect a successful save in a loaded cache.
    pub fn record_saved(&mut self, saved: &SavedRecipe) {
        if let Cache::Loaded(list) = &mut self.cache {
            if !list.iter().any(|r| r.id == saved.id) {
                list.push(saved.clone());
            }
        }
    }
}
