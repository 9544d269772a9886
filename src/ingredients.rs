//! Pending ingredient list edited in the compose view.

use crate::error::ValidationError;
use crate::model::Ingredient;

/// Ordered ingredients assembled before a generate request.
///
/// Entries are addressed by position only; duplicate names are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientList {
    items: Vec<Ingredient>,
}

impl IngredientList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ingredient. Returns the index of the new entry.
    ///
    /// A name that is blank after trimming is rejected and the list is left
    /// unchanged. The name itself is stored as given.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        quantity: Option<String>,
    ) -> Result<usize, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyIngredientName);
        }
        self.items.push(Ingredient::new(name, quantity));
        Ok(self.items.len() - 1)
    }

    /// Remove the entry at `index`; out of range is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<Ingredient> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Ingredient> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Ingredient] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ingredient> {
        self.items.iter()
    }

    /// Display strings in list order.
    pub fn display_lines(&self) -> Vec<String> {
        self.items.iter().map(|i| i.to_string()).collect()
    }
}
