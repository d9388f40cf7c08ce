mod catalog;
mod helpers;
mod import;
mod summary;

use larder_core::catalog::Catalog;
use larder_core::store::CatalogStore;

pub(crate) use catalog::{cmd_categories, cmd_food_show, cmd_foods};
pub(crate) use import::cmd_import;
pub(crate) use summary::cmd_summary;

/// Load the catalog for a read command, warning about any table that could
/// not be read instead of failing.
pub(crate) async fn load_catalog(store: &dyn CatalogStore) -> Catalog {
    let catalog = Catalog::load(store).await;
    warn_degraded(&catalog);
    catalog
}

pub(super) fn warn_degraded(catalog: &Catalog) {
    for failure in &catalog.failures {
        eprintln!(
            "Warning: could not load {}: {}",
            failure.table, failure.message
        );
    }
}
