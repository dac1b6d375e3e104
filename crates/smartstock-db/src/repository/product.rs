//! # Product Repository
//!
//! Database operations for the product ledger.
//!
//! ## Key Operations
//! - CRUD over `products`
//! - Dashboard statistics
//! - The conditional stock decrement used by the sale commit
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET stock = stock - :qty                              │
//! │   WHERE id = :id AND stock >= :qty                                     │
//! │                                                                         │
//! │  rows_affected = 1  → decremented, stock still ≥ 0                     │
//! │  rows_affected = 0  → re-read the row:                                 │
//! │                        missing      → ProductNotFound                  │
//! │                        stock < qty  → InsufficientStock                │
//! │                                                                         │
//! │  Check and write are one statement, so two concurrent sales can never  │
//! │  both pass the check on the same units.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use smartstock_core::{CoreError, Product, ProductInput};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, sku, category, price_cents, stock, min_stock, \
     supplier, description, barcode, is_active, created_at, updated_at";

/// Figures shown on the product dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total_products: i64,
    /// Products with `stock <= min_stock`, out-of-stock included.
    pub low_stock_products: i64,
    /// Σ stock × price over active products.
    pub stock_value_cents: i64,
    pub total_categories: i64,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products, most recently updated first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY updated_at DESC, name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by ID, failing with `NotFound` when absent.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Gets a product by its (normalised) SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(smartstock_core::validation::normalize_sku(sku))
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Validates and inserts a new product.
    ///
    /// ## Errors
    /// - `Core(Validation)` for bad input
    /// - `UniqueViolation` when the SKU is taken
    pub async fn create(&self, input: ProductInput) -> DbResult<Product> {
        let input = input.normalize().map_err(CoreError::from)?;
        let now = Utc::now();

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            sku: input.sku,
            category: input.category,
            price_cents: input.price_cents,
            stock: input.stock,
            min_stock: input.min_stock.unwrap_or(smartstock_core::DEFAULT_MIN_STOCK),
            supplier: input.supplier,
            description: input.description,
            barcode: input.barcode,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, category, price_cents, stock, min_stock,
                supplier, description, barcode, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.supplier)
        .bind(&product.description)
        .bind(&product.barcode)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&product.sku))?;

        Ok(product)
    }

    /// Replaces the editable fields of an existing product.
    pub async fn update(&self, id: &str, input: ProductInput) -> DbResult<Product> {
        let input = input.normalize().map_err(CoreError::from)?;
        let sku = input.sku.clone();

        debug!(id = %id, sku = %sku, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2, sku = ?3, category = ?4, price_cents = ?5,
                stock = ?6, min_stock = ?7, supplier = ?8, description = ?9,
                barcode = ?10, is_active = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name)
        .bind(input.sku)
        .bind(input.category)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(input.min_stock.unwrap_or(smartstock_core::DEFAULT_MIN_STOCK))
        .bind(input.supplier)
        .bind(input.description)
        .bind(input.barcode)
        .bind(input.is_active.unwrap_or(true))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get(id).await
    }

    /// Hard-deletes a product.
    ///
    /// Fails with `ForeignKeyViolation` while sale lines reference it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Dashboard statistics over the whole catalogue.
    pub async fn dashboard_stats(&self) -> DbResult<ProductStats> {
        let stats = sqlx::query_as::<_, ProductStats>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(CASE WHEN stock <= min_stock THEN 1 ELSE 0 END), 0) AS low_stock_products,
                COALESCE(SUM(CASE WHEN is_active THEN stock * price_cents ELSE 0 END), 0) AS stock_value_cents,
                COUNT(DISTINCT category) AS total_categories
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Returns total product count.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped ledger operations
// =============================================================================

/// Reads a product on the transaction's connection.
pub(crate) async fn fetch_for_sale(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Takes `quantity` units out of stock, or explains why it cannot.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1 AND stock >= ?2",
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    match fetch_for_sale(conn, id).await? {
        None => Err(CoreError::ProductNotFound(id.to_string()).into()),
        Some(product) => Err(CoreError::InsufficientStock {
            product: product.name,
            available: product.stock,
            requested: quantity,
        }
        .into()),
    }
}
