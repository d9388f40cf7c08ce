//! Bulk import of a JSON catalog document into the catalog store.
//!
//! The pipeline runs in fixed order: parse, validate, insert categories one
//! at a time, rewrite the foods' category references to the new ids, insert
//! all foods in one call, report. Nothing is rolled back: categories inserted
//! before a failure stay in the store.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{
    ImportCategory, ImportPayload, ImportReport, NewCategory, NewFood, validate_new_food,
};
use crate::store::CatalogStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// Wrong file type, unparseable JSON, or a payload of the wrong shape.
    #[error("{0}")]
    InvalidFormat(String),
    /// A read or write against the catalog store failed.
    #[error("{0}")]
    Store(String),
    #[error("{0}")]
    Unexpected(String),
}

/// Parse and validate an import document without touching the store.
pub fn parse_payload(text: &str) -> Result<ImportPayload, ImportError> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|_| ImportError::InvalidFormat("Invalid JSON file format".to_string()))?;

    let categories = array_field(&doc, "categories")?;
    let foods = array_field(&doc, "foods")?;

    let categories = categories
        .iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value::<ImportCategory>(v.clone()).map_err(|e| {
                ImportError::InvalidFormat(format!("Invalid JSON format: categories[{i}]: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let foods = foods
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let food = serde_json::from_value::<NewFood>(v.clone()).map_err(|e| {
                ImportError::InvalidFormat(format!("Invalid JSON format: foods[{i}]: {e}"))
            })?;
            validate_new_food(&food).map_err(|e| {
                ImportError::InvalidFormat(format!(
                    "Invalid JSON format: foods[{i}] ({}): {e}",
                    food.name
                ))
            })?;
            Ok(food)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ImportPayload { categories, foods })
}

fn array_field<'a>(doc: &'a Value, field: &str) -> Result<&'a Vec<Value>, ImportError> {
    doc.get(field).and_then(Value::as_array).ok_or_else(|| {
        ImportError::InvalidFormat(format!("Invalid JSON format: {field} must be an array"))
    })
}

/// Rewrite each food's `category_id` through `mapping`. Ids the mapping does
/// not know are carried through unchanged.
#[must_use]
pub fn remap_foods(foods: Vec<NewFood>, mapping: &HashMap<String, String>) -> Vec<NewFood> {
    foods
        .into_iter()
        .map(|mut food| {
            match mapping.get(&food.category_id) {
                Some(new_id) => food.category_id.clone_from(new_id),
                None => debug!(
                    category_id = %food.category_id,
                    food = %food.name,
                    "no imported category for food; keeping original reference"
                ),
            }
            food
        })
        .collect()
}

/// Insert a validated payload into the store.
pub async fn import_payload(
    store: &dyn CatalogStore,
    payload: ImportPayload,
) -> Result<ImportReport, ImportError> {
    let category_count = payload.categories.len();
    let food_count = payload.foods.len();

    let mut mapping: HashMap<String, String> = HashMap::with_capacity(category_count);
    for category in &payload.categories {
        let inserted = store
            .insert_category(&NewCategory {
                name: category.name.clone(),
                description: category.description.clone(),
            })
            .await
            .map_err(|e| {
                ImportError::Store(format!(
                    "Failed to insert category {}: {}",
                    category.name, e.message
                ))
            })?;
        debug!(source_id = %category.id, new_id = %inserted.id, "category inserted");
        mapping.insert(category.id.clone(), inserted.id);
    }

    let foods = remap_foods(payload.foods, &mapping);
    store
        .insert_foods(&foods)
        .await
        .map_err(|e| ImportError::Store(format!("Failed to insert foods: {}", e.message)))?;

    info!(categories = category_count, foods = food_count, "import complete");
    Ok(ImportReport::succeeded(category_count, food_count))
}

/// Full pipeline over raw document text. Every failure is folded into the
/// returned report.
pub async fn run_import(store: &dyn CatalogStore, text: &str) -> ImportReport {
    let result = match parse_payload(text) {
        Ok(payload) => import_payload(store, payload).await,
        Err(e) => Err(e),
    };
    into_report(result)
}

/// Read an import file from disk. Only `.json` files are accepted, and the
/// name is checked before the file is opened.
pub fn read_import_file(path: &Path) -> Result<String, ImportError> {
    let is_json = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_lowercase().ends_with(".json"));
    if !is_json {
        return Err(ImportError::InvalidFormat(
            "Please select a JSON file".to_string(),
        ));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        ImportError::Unexpected(format!("Failed to read {}: {e}", path.display()))
    })?;
    String::from_utf8(bytes)
        .map_err(|_| ImportError::InvalidFormat("Import file is not valid UTF-8".to_string()))
}

/// Import from a file on disk, see [`read_import_file`] and [`run_import`].
pub async fn import_file(store: &dyn CatalogStore, path: &Path) -> ImportReport {
    match read_import_file(path) {
        Ok(text) => run_import(store, &text).await,
        Err(e) => into_report(Err(e)),
    }
}

fn into_report(result: Result<ImportReport, ImportError>) -> ImportReport {
    match result {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "import failed");
            ImportReport::failed(e.to_string())
        }
    }
}
