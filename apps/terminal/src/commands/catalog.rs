//! # Catalog Commands
//!
//! Categories, products and dining tables of the current store.
//! Each command is a one-to-one wrapper over its repository.

use tracing::debug;

use comanda_client::repository::{CategoryPatch, NewProduct, ProductPatch, TablePatch};
use comanda_core::{Category, DiningTable, Product};

use crate::error::AppResult;
use crate::state::SessionState;

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(session: &SessionState, show_all: bool) -> AppResult<Vec<Category>> {
    debug!(show_all, "list_categories command");
    let store_id = session.store_id()?;
    Ok(session.repos().categories(&store_id).list(show_all).await?)
}

pub async fn create_category(session: &SessionState, name: &str) -> AppResult<Category> {
    let store_id = session.store_id()?;
    Ok(session.repos().categories(&store_id).create(name).await?)
}

pub async fn update_category(
    session: &SessionState,
    id: &str,
    patch: &CategoryPatch,
) -> AppResult<Category> {
    let store_id = session.store_id()?;
    Ok(session.repos().categories(&store_id).update(id, patch).await?)
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(session: &SessionState, show_all: bool) -> AppResult<Vec<Product>> {
    debug!(show_all, "list_products command");
    let store_id = session.store_id()?;
    Ok(session.repos().products(&store_id).list(show_all).await?)
}

pub async fn create_product(session: &SessionState, input: &NewProduct) -> AppResult<Product> {
    let store_id = session.store_id()?;
    Ok(session.repos().products(&store_id).create(input).await?)
}

pub async fn update_product(
    session: &SessionState,
    id: &str,
    patch: &ProductPatch,
) -> AppResult<Product> {
    let store_id = session.store_id()?;
    Ok(session.repos().products(&store_id).update(id, patch).await?)
}

// =============================================================================
// Tables
// =============================================================================

pub async fn list_tables(session: &SessionState, show_all: bool) -> AppResult<Vec<DiningTable>> {
    debug!(show_all, "list_tables command");
    let store_id = session.store_id()?;
    Ok(session.repos().tables(&store_id).list(show_all).await?)
}

pub async fn create_table(session: &SessionState, name: &str) -> AppResult<DiningTable> {
    let store_id = session.store_id()?;
    Ok(session.repos().tables(&store_id).create(name).await?)
}

pub async fn update_table(
    session: &SessionState,
    id: &str,
    patch: &TablePatch,
) -> AppResult<DiningTable> {
    let store_id = session.store_id()?;
    Ok(session.repos().tables(&store_id).update(id, patch).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_app;

    #[tokio::test]
    async fn test_blank_category_rejected_without_request() {
        let app = test_app().await;

        let err = create_category(&app.state.session, "  ").await.unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_catalog_needs_store() {
        let app = test_app().await;
        app.state.session.set_store(None);

        let err = list_products(&app.state.session, false).await.unwrap_err();

        assert_eq!(err.message, "store is required");
    }
}
