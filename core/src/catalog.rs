use serde::Serialize;
use tracing::{info, warn};

use crate::models::{Food, FoodCategory};
use crate::store::{CATEGORIES_TABLE, CatalogStore, FOODS_TABLE};

/// One read-all query that failed while loading the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub table: &'static str,
    pub message: String,
}

/// In-memory snapshot of every category and food in the store.
///
/// There is no incremental update path: to see external changes, load a
/// fresh snapshot and replace the old one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub categories: Vec<FoodCategory>,
    pub foods: Vec<Food>,
    pub failures: Vec<LoadFailure>,
}

impl Catalog {
    /// Run both read-all queries. Each succeeds or fails on its own; a failed
    /// query leaves its list empty and is recorded in `failures`.
    pub async fn load(store: &dyn CatalogStore) -> Self {
        let mut catalog = Catalog::default();

        match store.list_categories().await {
            Ok(categories) => catalog.categories = categories,
            Err(e) => {
                warn!(table = CATEGORIES_TABLE, error = %e, "failed to load categories");
                catalog.failures.push(LoadFailure {
                    table: CATEGORIES_TABLE,
                    message: e.message,
                });
            }
        }

        match store.list_foods().await {
            Ok(foods) => catalog.foods = foods,
            Err(e) => {
                warn!(table = FOODS_TABLE, error = %e, "failed to load foods");
                catalog.failures.push(LoadFailure {
                    table: FOODS_TABLE,
                    message: e.message,
                });
            }
        }

        info!(
            categories = catalog.categories.len(),
            foods = catalog.foods.len(),
            failures = catalog.failures.len(),
            "catalog loaded"
        );
        catalog
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    #[must_use]
    pub fn food(&self, id: &str) -> Option<&Food> {
        self.foods.iter().find(|f| f.id == id)
    }

    #[must_use]
    pub fn category(&self, id: &str) -> Option<&FoodCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Name of the category a food points at, if it resolves.
    #[must_use]
    pub fn category_name(&self, food: &Food) -> Option<&str> {
        self.category(&food.category_id).map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::{NewCategory, NewFood, Nutrients};
    use crate::store::{SqliteStore, StoreError};

    struct BrokenFoods {
        inner: SqliteStore,
    }

    #[async_trait]
    impl CatalogStore for BrokenFoods {
        async fn list_categories(&self) -> Result<Vec<FoodCategory>, StoreError> {
            self.inner.list_categories().await
        }

        async fn list_foods(&self) -> Result<Vec<Food>, StoreError> {
            Err(StoreError::new("relation \"foods\" does not exist"))
        }

        async fn insert_category(
            &self,
            category: &NewCategory,
        ) -> Result<FoodCategory, StoreError> {
            self.inner.insert_category(category).await
        }

        async fn insert_foods(&self, foods: &[NewFood]) -> Result<(), StoreError> {
            self.inner.insert_foods(foods).await
        }
    }

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let grains = store
            .insert_category(&NewCategory {
                name: "Grains".to_string(),
                description: None,
            })
            .await
            .unwrap();
        store
            .insert_foods(&[NewFood {
                category_id: grains.id.clone(),
                name: "Oats".to_string(),
                description: None,
                serving_size: 40.0,
                nutrients: Nutrients {
                    calories: 150.0,
                    ..Nutrients::default()
                },
                image_url: None,
            }])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_load_reads_both_tables() {
        let store = seeded_store().await;
        let catalog = Catalog::load(&store).await;
        assert_eq!(catalog.categories.len(), 1);
        assert_eq!(catalog.foods.len(), 1);
        assert!(!catalog.is_degraded());

        let oats = &catalog.foods[0];
        assert_eq!(catalog.food(&oats.id).unwrap().name, "Oats");
        assert_eq!(catalog.category_name(oats), Some("Grains"));
    }

    #[tokio::test]
    async fn test_load_records_failed_table_and_keeps_the_other() {
        let store = BrokenFoods {
            inner: seeded_store().await,
        };
        let catalog = Catalog::load(&store).await;
        assert_eq!(catalog.categories.len(), 1);
        assert!(catalog.foods.is_empty());
        assert!(catalog.is_degraded());
        assert_eq!(catalog.failures.len(), 1);
        assert_eq!(catalog.failures[0].table, "foods");
        assert!(catalog.failures[0].message.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_reload_sees_new_rows() {
        let store = seeded_store().await;
        let before = Catalog::load(&store).await;
        store
            .insert_category(&NewCategory {
                name: "Dairy".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let after = Catalog::load(&store).await;
        assert_eq!(before.categories.len(), 1);
        assert_eq!(after.categories.len(), 2);
    }
}
