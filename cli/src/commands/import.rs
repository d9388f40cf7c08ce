use std::path::Path;
use std::process;

use anyhow::Result;
use serde::Serialize;

use larder_core::catalog::Catalog;
use larder_core::import::import_file;
use larder_core::models::ImportReport;
use larder_core::store::CatalogStore;

use super::warn_degraded;

/// `--json` output of an import: the report plus, after a successful import,
/// the size of the reloaded catalog.
#[derive(Serialize)]
struct ImportOutput<'a> {
    #[serde(flatten)]
    report: &'a ImportReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<CatalogSize>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct CatalogSize {
    categories: usize,
    foods: usize,
}

/// Run the import and, when it succeeds, reload the catalog from the store.
async fn import_and_reload(
    store: &dyn CatalogStore,
    path: &Path,
) -> (ImportReport, Option<Catalog>) {
    let report = import_file(store, path).await;
    if !report.success {
        return (report, None);
    }
    let catalog = Catalog::load(store).await;
    warn_degraded(&catalog);
    (report, Some(catalog))
}

/// Import a JSON catalog file and report the outcome. A failed import exits
/// with status 1 after printing the report.
pub(crate) async fn cmd_import(store: &dyn CatalogStore, path: &Path, json: bool) -> Result<()> {
    let (report, catalog) = import_and_reload(store, path).await;

    if json {
        let out = ImportOutput {
            report: &report,
            catalog: catalog.as_ref().map(|c| CatalogSize {
                categories: c.categories.len(),
                foods: c.foods.len(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        if !report.success {
            process::exit(1);
        }
        return Ok(());
    }

    let Some(catalog) = catalog else {
        eprintln!("Import failed: {}", report.message);
        process::exit(1);
    };

    println!("{}", report.message);
    println!(
        "Catalog now holds {} categories and {} foods.",
        catalog.categories.len(),
        catalog.foods.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use larder_core::store::SqliteStore;

    use super::*;

    const PAYLOAD: &str = r#"{
        "categories": [{"id": "fruit", "name": "Fruit"}],
        "foods": [
            {"category_id": "fruit", "name": "Apple", "calories": 95},
            {"category_id": "fruit", "name": "Banana", "calories": 105}
        ]
    }"#;

    #[tokio::test]
    async fn test_successful_import_reloads_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, PAYLOAD).unwrap();
        let store = SqliteStore::open_in_memory().unwrap();

        let (report, catalog) = import_and_reload(&store, &path).await;
        assert!(report.success, "{}", report.message);
        let catalog = catalog.unwrap();
        assert_eq!(catalog.categories.len(), 1);
        assert_eq!(catalog.foods.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_import_skips_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"categories": {}}"#).unwrap();
        let store = SqliteStore::open_in_memory().unwrap();

        let (report, catalog) = import_and_reload(&store, &path).await;
        assert!(!report.success);
        assert!(catalog.is_none());
    }

    #[test]
    fn test_json_output_includes_reloaded_size() {
        let report = ImportReport {
            success: true,
            message: "Imported".to_string(),
            categories: 1,
            foods: 2,
        };
        let out = ImportOutput {
            report: &report,
            catalog: Some(CatalogSize {
                categories: 4,
                foods: 9,
            }),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["foods"], 2);
        assert_eq!(json["catalog"]["foods"], 9);
    }
}
