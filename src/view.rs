use crate::library::{RefreshTicket, SavedRecipeStore};
use crate::model::ViewState;
use tracing::debug;

/// Tracks which of the two views is active.
///
/// Entering the library is the only navigation that refreshes the saved
/// recipe cache; staying on it does not.
#[derive(Debug, Default)]
pub struct ViewCoordinator {
    active: ViewState,
}

impl ViewCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ViewState {
        self.active
    }

    /// Switch to `view`. Returns the refresh to run when this call entered the
    /// library.
    pub fn select(
        &mut self,
        view: ViewState,
        library: &mut SavedRecipeStore,
    ) -> Option<RefreshTicket> {
        if self.active == view {
            return None;
        }
        debug!(from = ?self.active, to = ?view, "view changed");
        self.active = view;
        match view {
            ViewState::Library => Some(library.begin_refresh()),
            ViewState::Compose => None,
        }
    }

    pub fn toggle(&mut self, library: &mut SavedRecipeStore) -> Option<RefreshTicket> {
        let next = match self.active {
            ViewState::Compose => ViewState::Library,
            ViewState::Library => ViewState::Compose,
        };
        self.select(next, library)
    }
}
