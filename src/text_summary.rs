//! Text summary builder for CLI output.
//!
//! Formats recipes as human-readable lines for text mode and the clipboard.

use crate::library::LibraryStatus;
use crate::model::{GeneratedRecipe, SavedRecipe};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

impl TextSummary {
    pub fn join(&self) -> String {
        self.lines.join("\n")
    }
}

/// Dish name, ingredient list and numbered steps.
pub(crate) fn build_recipe_summary(recipe: &GeneratedRecipe, id: Option<&str>) -> TextSummary {
    let mut lines = Vec::new();
    match id {
        Some(id) => lines.push(format!("{} [{}]", recipe.dish_name, id)),
        None => lines.push(recipe.dish_name.clone()),
    }
    lines.push("Ingredients:".into());
    for ing in &recipe.ingredients {
        lines.push(format!("  - {ing}"));
    }
    lines.push("Instructions:".into());
    for (i, step) in recipe.instructions.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, step));
    }
    TextSummary { lines }
}

pub(crate) fn build_library_summary(status: LibraryStatus<'_>) -> TextSummary {
    let lines = match status {
        LibraryStatus::NotLoaded => vec!["Saved recipes could not be loaded.".to_string()],
        LibraryStatus::Loading => vec!["Loading saved recipes…".to_string()],
        LibraryStatus::Empty => vec!["No saved recipes yet.".to_string()],
        LibraryStatus::Recipes(recipes) => recipes
            .iter()
            .enumerate()
            .flat_map(|(i, r): (usize, &SavedRecipe)| {
                let mut block = build_recipe_summary(&r.recipe, Some(&r.id)).lines;
                if i > 0 {
                    block.insert(0, String::new());
                }
                block
            })
            .collect(),
    };
    TextSummary { lines }
}
