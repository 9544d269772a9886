use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// A single pending or recipe ingredient.
///
/// `quantity` is free text ("2 cups", "a pinch") and is omitted from request
/// bodies when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

impl Ingredient {
    /// Build an ingredient; an empty quantity is treated as no quantity.
    pub fn new(name: impl Into<String>, quantity: Option<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.filter(|q| !q.is_empty()),
        }
    }

    /// Parse the display form back into an ingredient.
    ///
    /// `"2 cups of flour"` becomes quantity `"2 cups"` and name `"flour"`; text
    /// without `" of "` is a bare name.
    pub fn parse(text: &str) -> Self {
        match text.split_once(" of ") {
            Some((qty, name)) => Self::new(name.trim(), Some(qty.trim().to_string())),
            None => Self::new(text.trim(), None),
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quantity {
            Some(qty) => write!(f, "{} of {}", qty, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub dish_name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecipe {
    pub id: String,
    #[serde(flatten)]
    pub recipe: GeneratedRecipe,
}

impl SavedRecipe {
    pub fn dish_name(&self) -> &str {
        &self.recipe.dish_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewState {
    #[default]
    Compose,
    Library,
}

impl ViewState {
    pub fn title(self) -> &'static str {
        match self {
            ViewState::Compose => "Compose",
            ViewState::Library => "Library",
        }
    }

    pub fn index(self) -> usize {
        match self {
            ViewState::Compose => 0,
            ViewState::Library => 1,
        }
    }
}

/// Request body for `POST /generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub ingredients: &'a [Ingredient],
}

/// Request body for `POST /recipes`. The backend names the dish `title` here.
#[derive(Debug, Clone, Serialize)]
pub struct SaveRecipeRequest<'a> {
    pub title: &'a str,
    pub ingredients: &'a [Ingredient],
    pub instructions: &'a [String],
}

impl<'a> From<&'a GeneratedRecipe> for SaveRecipeRequest<'a> {
    fn from(r: &'a GeneratedRecipe) -> Self {
        Self {
            title: &r.dish_name,
            ingredients: &r.ingredients,
            instructions: &r.instructions,
        }
    }
}

/// Response of `POST /recipes`. Only `id` is guaranteed; anything missing is
/// filled from the submitted recipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveRecipeResponse {
    pub id: String,
    #[serde(default)]
    pub dish_name: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
}

impl SaveRecipeResponse {
    pub(crate) fn into_saved(self, submitted: &GeneratedRecipe) -> SavedRecipe {
        SavedRecipe {
            id: self.id,
            recipe: GeneratedRecipe {
                dish_name: self
                    .dish_name
                    .unwrap_or_else(|| submitted.dish_name.clone()),
                ingredients: self
                    .ingredients
                    .unwrap_or_else(|| submitted.ingredients.clone()),
                instructions: self
                    .instructions
                    .unwrap_or_else(|| submitted.instructions.clone()),
            },
        }
    }
}
