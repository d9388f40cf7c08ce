use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::db::Database;
use crate::models::{Food, FoodCategory, NewCategory, NewFood};

pub const CATEGORIES_TABLE: &str = "food_categories";
pub const FOODS_TABLE: &str = "foods";

/// A failed read or write against the catalog store, carrying the store's
/// own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// Table-backed storage holding `food_categories` and `foods`.
///
/// The local CLI uses [`SqliteStore`]; the binary also ships a client for a
/// hosted PostgREST backend. Calls are neither retried nor cancelled.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<FoodCategory>, StoreError>;

    async fn list_foods(&self) -> Result<Vec<Food>, StoreError>;

    /// Insert one category and return it with its store-assigned id.
    async fn insert_category(&self, category: &NewCategory) -> Result<FoodCategory, StoreError>;

    /// Insert a batch of foods in a single call.
    async fn insert_foods(&self, foods: &[NewFood]) -> Result<(), StoreError>;
}

/// [`CatalogStore`] over a local SQLite [`Database`].
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn list_categories(&self) -> Result<Vec<FoodCategory>, StoreError> {
        Ok(self.db().list_categories()?)
    }

    async fn list_foods(&self) -> Result<Vec<Food>, StoreError> {
        Ok(self.db().list_foods()?)
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<FoodCategory, StoreError> {
        Ok(self.db().insert_category(category)?)
    }

    async fn insert_foods(&self, foods: &[NewFood]) -> Result<(), StoreError> {
        self.db().insert_foods(foods)?;
        Ok(())
    }
}
