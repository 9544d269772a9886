//! Owned state container for one client session.
//!
//! The synchronous `begin_*`/`finish_*` pairs are what the TUI uses: it issues
//! the request elsewhere and feeds the completion back in. The async drivers
//! below them run a whole operation against a [`RecipeBackend`] and are used
//! by text mode and tests.

use crate::backend::RecipeBackend;
use crate::error::{CollaboratorError, WorkflowResult};
use crate::ingredients::IngredientList;
use crate::library::{DeleteTicket, RefreshTicket, SavedRecipeStore};
use crate::model::{GeneratedRecipe, SavedRecipe, ViewState};
use crate::view::ViewCoordinator;
use crate::workflow::{GenerateTicket, RecipeWorkflow, SaveTicket};
use tracing::warn;

#[derive(Debug, Default)]
pub struct Session {
    pub ingredients: IngredientList,
    pub workflow: RecipeWorkflow,
    pub library: SavedRecipeStore,
    pub view: ViewCoordinator,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_generate(&mut self) -> WorkflowResult<GenerateTicket> {
        self.workflow.begin_generate(self.ingredients.as_slice())
    }

    pub fn finish_generate(
        &mut self,
        seq: u64,
        result: Result<GeneratedRecipe, CollaboratorError>,
    ) -> WorkflowResult<&GeneratedRecipe> {
        self.workflow.finish_generate(seq, result)
    }

    pub fn begin_save(&mut self) -> WorkflowResult<SaveTicket> {
        self.workflow.begin_save()
    }

    /// Apply a save completion. On success the saved record is reflected in
    /// the cache and the library is selected. The returned ticket is the
    /// confirmation refresh to run: the library entry refresh when this call
    /// entered it, a fresh one when the library was already showing.
    pub fn finish_save(
        &mut self,
        seq: u64,
        result: Result<SavedRecipe, CollaboratorError>,
    ) -> WorkflowResult<(SavedRecipe, RefreshTicket)> {
        let saved = self.workflow.finish_save(seq, result)?;
        self.library.record_saved(&saved);
        let refresh = match self.select_view(ViewState::Library) {
            Some(entry) => self.library.confirm_with(entry),
            None => self.library.begin_confirmation_refresh(),
        };
        Ok((saved, refresh))
    }

    pub fn select_view(&mut self, view: ViewState) -> Option<RefreshTicket> {
        self.view.select(view, &mut self.library)
    }

    pub fn toggle_view(&mut self) -> Option<RefreshTicket> {
        self.view.toggle(&mut self.library)
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.library.begin_refresh()
    }

    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<SavedRecipe>, CollaboratorError>,
    ) -> WorkflowResult<usize> {
        self.library.finish_refresh(ticket, result)
    }

    pub fn begin_delete(&mut self, id: impl Into<String>) -> DeleteTicket {
        self.library.begin_delete(id)
    }

    /// Apply a delete completion. On success returns the confirmation refresh
    /// to run.
    pub fn finish_delete(
        &mut self,
        ticket: &DeleteTicket,
        result: Result<(), CollaboratorError>,
    ) -> WorkflowResult<RefreshTicket> {
        self.library.finish_delete(ticket, result)?;
        Ok(self.library.begin_confirmation_refresh())
    }

    pub async fn generate(&mut self, backend: &dyn RecipeBackend) -> WorkflowResult<&GeneratedRecipe> {
        let ticket = self.begin_generate()?;
        let result = backend.generate(&ticket.ingredients).await;
        self.finish_generate(ticket.seq, result)
    }

    /// Save the candidate and run the library refresh the save triggers.
    pub async fn save(&mut self, backend: &dyn RecipeBackend) -> WorkflowResult<SavedRecipe> {
        let ticket = self.begin_save()?;
        let result = backend.save_recipe(&ticket.recipe).await;
        let (saved, refresh) = self.finish_save(ticket.seq, result)?;
        self.run_confirmation_refresh(backend, refresh).await;
        Ok(saved)
    }

    pub async fn select(&mut self, backend: &dyn RecipeBackend, view: ViewState) -> WorkflowResult<()> {
        if let Some(t) = self.select_view(view) {
            let result = backend.list_recipes().await;
            self.finish_refresh(t, result)?;
        }
        Ok(())
    }

    pub async fn refresh(&mut self, backend: &dyn RecipeBackend) -> WorkflowResult<usize> {
        let t = self.begin_refresh();
        let result = backend.list_recipes().await;
        self.finish_refresh(t, result)
    }

    /// Delete `id` on the backend, then refresh to confirm.
    pub async fn delete(&mut self, backend: &dyn RecipeBackend, id: &str) -> WorkflowResult<()> {
        let ticket = self.begin_delete(id);
        let result = backend.delete_recipe(&ticket.id).await;
        let t = self.finish_delete(&ticket, result)?;
        self.run_confirmation_refresh(backend, t).await;
        Ok(())
    }

    /// The mutation already succeeded; a failed follow-up fetch is kept on the
    /// store rather than reported as a failure of the mutation.
    async fn run_confirmation_refresh(&mut self, backend: &dyn RecipeBackend, t: RefreshTicket) {
        let result = backend.list_recipes().await;
        if let Err(e) = self.finish_refresh(t, result) {
            warn!(error = %e, "confirmation refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::error::{Operation, ValidationError, WorkflowError};
    use crate::library::LibraryStatus;
    use crate::model::Ingredient;

    fn pancakes() -> GeneratedRecipe {
        GeneratedRecipe {
            dish_name: "Pancakes".into(),
            ingredients: vec![
                Ingredient::new("flour", Some("2 cups".into())),
                Ingredient::new("egg", None),
            ],
            instructions: vec!["Mix".into(), "Cook".into()],
        }
    }

    fn session_with_pancake_ingredients() -> Session {
        let mut s = Session::new();
        s.ingredients.add("flour", Some("2 cups".into())).unwrap();
        s.ingredients.add("egg", None).unwrap();
        s
    }

    #[tokio::test]
    async fn generate_with_no_ingredients_issues_no_request() {
        let backend = FakeBackend::default();
        let mut s = Session::new();
        let err = s.generate(&backend).await.unwrap_err();
        assert_eq!(err, WorkflowError::Validation(ValidationError::NoIngredients));
        assert_eq!(backend.calls(Operation::Generate), 0);
    }

    #[tokio::test]
    async fn pancake_scenario_displays_quantities() {
        let backend = FakeBackend::with_recipe(pancakes());
        let mut s = session_with_pancake_ingredients();
        let recipe = s.generate(&backend).await.unwrap().clone();
        assert_eq!(recipe, pancakes());
        let lines: Vec<String> = recipe.ingredients.iter().map(|i| i.to_string()).collect();
        assert_eq!(lines, ["2 cups of flour", "egg"]);
        assert_eq!(s.ingredients.len(), 2, "pending list is kept after generate");
    }

    #[tokio::test]
    async fn save_without_candidate_issues_no_request() {
        let backend = FakeBackend::default();
        let mut s = Session::new();
        let err = s.save(&backend).await.unwrap_err();
        assert_eq!(err, WorkflowError::Validation(ValidationError::NoCandidate));
        assert_eq!(backend.calls(Operation::SaveRecipe), 0);
    }

    #[tokio::test]
    async fn save_switches_to_library_and_refreshes() {
        let backend = FakeBackend::with_recipe(pancakes());
        let mut s = session_with_pancake_ingredients();
        s.generate(&backend).await.unwrap();
        let saved = s.save(&backend).await.unwrap();

        assert_eq!(saved.id, "42");
        assert!(s.workflow.candidate().is_none());
        assert_eq!(s.view.active(), ViewState::Library);
        assert_eq!(backend.calls(Operation::ListRecipes), 1);
        let cached = s.library.find("42").expect("saved recipe is cached");
        assert_eq!(cached.dish_name(), "Pancakes");
    }

    #[tokio::test]
    async fn failed_save_keeps_candidate_and_view() {
        let backend = FakeBackend::with_recipe(pancakes());
        let mut s = session_with_pancake_ingredients();
        s.generate(&backend).await.unwrap();
        backend.fail_on(Some(Operation::SaveRecipe));
        assert!(matches!(
            s.save(&backend).await,
            Err(WorkflowError::Collaborator(_))
        ));
        assert_eq!(s.workflow.candidate(), Some(&pancakes()));
        assert_eq!(s.view.active(), ViewState::Compose);

        backend.fail_on(None);
        assert!(s.save(&backend).await.is_ok());
        assert_eq!(backend.calls(Operation::Generate), 1);
    }

    fn saved_pancakes() -> SavedRecipe {
        SavedRecipe {
            id: "42".into(),
            recipe: pancakes(),
        }
    }

    fn ready_session() -> Session {
        let mut s = session_with_pancake_ingredients();
        let g = s.begin_generate().unwrap();
        s.finish_generate(g.seq, Ok(pancakes())).unwrap();
        s
    }

    #[test]
    fn save_finishing_after_library_entry_still_confirms() {
        let mut s = ready_session();
        let save = s.begin_save().unwrap();
        // Library entered while the POST is still running
        let entry = s.select_view(ViewState::Library).unwrap();

        let (saved, confirm) = s.finish_save(save.seq, Ok(saved_pancakes())).unwrap();
        assert_eq!(saved.id, "42");
        assert_ne!(confirm, entry);

        // The entry fetch went out before the save landed and arrives last.
        s.finish_refresh(confirm, Ok(vec![saved_pancakes()])).unwrap();
        assert!(matches!(
            s.finish_refresh(entry, Ok(vec![])),
            Err(WorkflowError::Concurrency(_))
        ));
        assert_eq!(s.library.find("42").map(|r| r.dish_name()), Some("Pancakes"));
        assert!(!s.library.is_loading());
    }

    #[test]
    fn stale_entry_fetch_arriving_first_is_corrected_by_confirmation() {
        let mut s = ready_session();
        let save = s.begin_save().unwrap();
        let entry = s.select_view(ViewState::Library).unwrap();
        let (_, confirm) = s.finish_save(save.seq, Ok(saved_pancakes())).unwrap();

        assert!(s.finish_refresh(entry, Ok(vec![])).is_err());
        assert_eq!(s.library.status(), LibraryStatus::Loading);
        s.finish_refresh(confirm, Ok(vec![saved_pancakes()])).unwrap();
        assert_eq!(s.library.len(), 1);
    }

    #[test]
    fn save_from_compose_uses_the_entry_refresh_as_confirmation() {
        let mut s = ready_session();
        let save = s.begin_save().unwrap();
        let (_, confirm) = s.finish_save(save.seq, Ok(saved_pancakes())).unwrap();
        assert_eq!(s.view.active(), ViewState::Library);
        s.finish_refresh(confirm, Ok(vec![saved_pancakes()])).unwrap();
        assert_eq!(s.library.len(), 1);
    }

    #[tokio::test]
    async fn save_while_library_showing_refetches() {
        let backend = FakeBackend::with_recipe(pancakes());
        let mut s = session_with_pancake_ingredients();
        s.select(&backend, ViewState::Library).await.unwrap();
        s.generate(&backend).await.unwrap();
        s.save(&backend).await.unwrap();
        assert_eq!(backend.calls(Operation::ListRecipes), 2);
        assert!(s.library.find("42").is_some());
    }

    #[tokio::test]
    async fn selecting_library_twice_refreshes_once() {
        let backend = FakeBackend::default();
        let mut s = Session::new();
        s.select(&backend, ViewState::Library).await.unwrap();
        s.select(&backend, ViewState::Library).await.unwrap();
        assert_eq!(backend.calls(Operation::ListRecipes), 1);
        assert_eq!(s.library.status(), LibraryStatus::Empty);
    }

    #[tokio::test]
    async fn delete_of_uncached_id_still_hits_backend() {
        let backend = FakeBackend::default();
        backend.recipes.lock().unwrap().push(SavedRecipe {
            id: "7".into(),
            recipe: pancakes(),
        });
        let mut s = Session::new();
        s.delete(&backend, "7").await.unwrap();
        assert_eq!(backend.calls(Operation::DeleteRecipe), 1);
        assert_eq!(backend.calls(Operation::ListRecipes), 1);
        assert!(s.library.find("7").is_none());
        assert_eq!(s.library.status(), LibraryStatus::Empty);
    }

    #[tokio::test]
    async fn delete_failure_surfaces_and_keeps_cache() {
        let backend = FakeBackend::default();
        backend.recipes.lock().unwrap().push(SavedRecipe {
            id: "7".into(),
            recipe: pancakes(),
        });
        let mut s = Session::new();
        s.refresh(&backend).await.unwrap();
        let err = s.delete(&backend, "missing").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Collaborator(e) if e.status() == Some(404)));
        assert!(s.library.find("7").is_some());
        assert_eq!(backend.calls(Operation::ListRecipes), 1);
    }

    #[tokio::test]
    async fn confirmation_refresh_failure_does_not_fail_delete() {
        let backend = FakeBackend::default();
        backend.recipes.lock().unwrap().push(SavedRecipe {
            id: "7".into(),
            recipe: pancakes(),
        });
        let mut s = Session::new();
        s.refresh(&backend).await.unwrap();
        backend.fail_on(Some(Operation::ListRecipes));
        s.delete(&backend, "7").await.unwrap();
        assert!(s.library.find("7").is_none());
        assert!(s.library.last_error().is_some());
    }
}
