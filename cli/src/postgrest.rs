use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use larder_core::models::{Food, FoodCategory, NewCategory, NewFood};
use larder_core::store::{CATEGORIES_TABLE, CatalogStore, FOODS_TABLE, StoreError};

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`CatalogStore`] backed by a hosted PostgREST endpoint (e.g. Supabase).
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "larder/{} (nutrition tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn select<T: serde::de::DeserializeOwned>(&self, table: &str) -> Result<T, StoreError> {
        let resp = self
            .request(Method::GET, table)
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(|e| StoreError::new(format!("Failed to reach {table}: {e}")))?;
        let resp = check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| StoreError::new(format!("Failed to parse {table} response: {e}")))
    }
}

/// Pass successful responses through; turn anything else into a
/// [`StoreError`] carrying the backend's message.
async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::new(error_message(status, &body)))
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => err.message,
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => format!("HTTP {status}: {}", body.trim()),
    }
}

#[async_trait]
impl CatalogStore for PostgrestStore {
    async fn list_categories(&self) -> Result<Vec<FoodCategory>, StoreError> {
        self.select(CATEGORIES_TABLE).await
    }

    async fn list_foods(&self) -> Result<Vec<Food>, StoreError> {
        self.select(FOODS_TABLE).await
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<FoodCategory, StoreError> {
        let resp = self
            .request(Method::POST, CATEGORIES_TABLE)
            .header("Prefer", "return=representation")
            .json(category)
            .send()
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;
        let resp = check_status(resp).await?;
        let rows: Vec<FoodCategory> = resp
            .json()
            .await
            .map_err(|e| StoreError::new(format!("Failed to parse inserted category: {e}")))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::new("Insert returned no rows"))
    }

    async fn insert_foods(&self, foods: &[NewFood]) -> Result<(), StoreError> {
        let resp = self
            .request(Method::POST, FOODS_TABLE)
            .header("Prefer", "return=minimal")
            .json(foods)
            .send()
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;
        check_status(resp).await?;
        Ok(())
    }
}
