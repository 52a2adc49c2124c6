//! Product repository for catalog reads.
//!
//! Read-only: stock is mutated exclusively inside the checkout transaction
//! (see `services::checkout`), and catalog rows are managed externally.

use sqlx::PgPool;

use mercado_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

/// Repository for catalog queries.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the whole catalog, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, stock FROM products ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, stock FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get every product in an ID set, ordered by ID.
    ///
    /// IDs with no matching row are simply absent from the result; callers
    /// decide whether that is an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, stock FROM products WHERE id = ANY($1) ORDER BY id",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }
}
