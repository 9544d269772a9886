use super::RecipeBackend;
use crate::error::{CollaboratorError, Operation};
use crate::model::{
    ClientConfig, GenerateRequest, GeneratedRecipe, Ingredient, SaveRecipeRequest,
    SaveRecipeResponse, SavedRecipe,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// reqwest-backed client for the recipe REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid backend base URL: {}", cfg.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("backend base URL cannot carry a path: {}", cfg.base_url);
        }
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so an id can never escape its segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn transport(operation: Operation, e: reqwest::Error) -> CollaboratorError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    CollaboratorError::Transport { operation, message }
}

/// Turn a non-2xx response into a status error, keeping the backend's
/// `detail` message when it sends one.
async fn ensure_success(operation: Operation, resp: Response) -> Result<Response, CollaboratorError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
    Err(CollaboratorError::Status {
        operation,
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(operation: Operation, resp: Response) -> Result<T, CollaboratorError> {
    resp.json::<T>()
        .await
        .map_err(|e| CollaboratorError::Decode {
            operation,
            message: e.to_string(),
        })
}

#[async_trait]
impl RecipeBackend for HttpBackend {
    async fn generate(
        &self,
        ingredients: &[Ingredient],
    ) -> Result<GeneratedRecipe, CollaboratorError> {
        let op = Operation::Generate;
        let url = self.endpoint(&["generate"]);
        debug!(%url, count = ingredients.len(), "POST generate");
        let resp = self
            .http
            .post(url)
            .json(&GenerateRequest { ingredients })
            .send()
            .await
            .map_err(|e| transport(op, e))?;
        let resp = ensure_success(op, resp).await?;
        decode(op, resp).await
    }

    async fn list_recipes(&self) -> Result<Vec<SavedRecipe>, CollaboratorError> {
        let op = Operation::ListRecipes;
        let url = self.endpoint(&["recipes"]);
        debug!(%url, "GET recipes");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport(op, e))?;
        let resp = ensure_success(op, resp).await?;
        decode(op, resp).await
    }

    async fn save_recipe(
        &self,
        recipe: &GeneratedRecipe,
    ) -> Result<SavedRecipe, CollaboratorError> {
        let op = Operation::SaveRecipe;
        let url = self.endpoint(&["recipes"]);
        debug!(%url, dish = %recipe.dish_name, "POST recipes");
        let resp = self
            .http
            .post(url)
            .json(&SaveRecipeRequest::from(recipe))
            .send()
            .await
            .map_err(|e| transport(op, e))?;
        let resp = ensure_success(op, resp).await?;
        let saved: SaveRecipeResponse = decode(op, resp).await?;
        Ok(saved.into_saved(recipe))
    }

    async fn delete_recipe(&self, id: &str) -> Result<(), CollaboratorError> {
        let op = Operation::DeleteRecipe;
        let url = self.endpoint(&["recipes", id]);
        debug!(%url, "DELETE recipe");
        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| transport(op, e))?;
        ensure_success(op, resp).await?;
        Ok(())
    }
}
