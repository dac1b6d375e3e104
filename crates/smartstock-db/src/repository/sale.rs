//! # Sale Repository
//!
//! The sale transaction and the read side of committed sales.
//!
//! ## Commit Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_sale (one transaction)                        │
//! │                                                                         │
//! │  SaleDraft::from_request ── validation only, no transaction yet        │
//! │       │                                                                 │
//! │       ▼  BEGIN IMMEDIATE                                                │
//! │  for each line, in input order:                                        │
//! │     read product ──► PricedLine::price ──► conditional decrement       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleTotals::compute (total ≥ 0)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sale number: pre-supplied, or next free one from sale_counters        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT sales, INSERT sale_items (position = input index)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  credit customer (skipped when the id does not resolve)                │
//! │       │                                                                 │
//! │       ▼  COMMIT                                                         │
//! │  PopulatedSale                                                         │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the transaction: every decrement, the     │
//! │  counter bump and the inserts are rolled back together.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction takes SQLite's write lock up front. A deferred `BEGIN`
//! would let two sales share a read snapshot and then fail with
//! `SQLITE_BUSY` on the upgrade, bypassing the busy timeout. With
//! `BEGIN IMMEDIATE` a second writer waits on the busy timeout instead.

use std::collections::HashMap;

use chrono::{Local, Utc};
use smartstock_core::{
    CoreError, CustomerSummary, DayWindow, PopulatedSale, PricedLine, ProductSummary, Sale,
    SaleDraft, SaleItem, SaleNumber, SaleRequest, SaleTotals,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{customer, product};

const SALE_COLUMNS: &str = "id, sale_number, sale_date, customer_id, subtotal_cents, tax_cents, \
     discount_cents, total_cents, payment_method, payment_status, staff_member, notes, created_at";

/// A `sale_items` row together with its owning sale.
#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    sale_id: String,
    #[sqlx(flatten)]
    item: SaleItem,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Validates, prices and commits a sale.
    ///
    /// ## Errors
    /// - `Core(Validation | EmptySale | NegativeTotal)` for bad requests
    /// - `Core(ProductNotFound)` when a line's product does not exist
    /// - `Core(InsufficientStock)` when a line exceeds the remaining stock
    /// - `UniqueViolation` when the sale number is already taken
    ///
    /// On any error nothing is written.
    pub async fn create_sale(&self, request: SaleRequest) -> DbResult<PopulatedSale> {
        let draft = SaleDraft::from_request(request)?;
        let now = Utc::now();
        let sale_date = draft.sale_date.unwrap_or(now);

        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut lines = Vec::with_capacity(draft.lines.len());
        let mut products: HashMap<String, ProductSummary> = HashMap::new();

        for line in &draft.lines {
            let found = product::fetch_for_sale(&mut *tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let priced = PricedLine::price(line, &found)?;
            product::decrement_stock(&mut *tx, &found.id, line.quantity).await?;

            debug!(
                product_id = %found.id,
                quantity = line.quantity,
                unit_price_cents = priced.unit_price.cents(),
                "Priced sale line"
            );

            products.insert(found.id.clone(), found.summary());
            lines.push(priced);
        }

        let totals = SaleTotals::compute(&lines, draft.tax, draft.discount)?;

        let sale_number = match &draft.sale_number {
            Some(number) => number.to_string(),
            None => {
                let window = DayWindow::containing(sale_date, &Local);
                allocate_sale_number(&mut *tx, &window).await?.to_string()
            }
        };

        let sale = draft.into_sale(
            Uuid::new_v4().to_string(),
            sale_number,
            lines,
            totals,
            now,
        );

        insert_sale(&mut *tx, &sale).await?;

        let customer = match sale.customer_id.as_deref() {
            Some(id) => {
                if customer::credit_sale(&mut *tx, id, totals.total).await? {
                    fetch_customer_summary(&mut *tx, id).await?
                } else {
                    None
                }
            }
            None => None,
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total_cents = sale.total_cents,
            lines = sale.items.len(),
            "Sale committed"
        );

        Ok(PopulatedSale::assemble(sale, customer, &products))
    }

    /// All sales, newest `sale_date` first, with customer and products expanded.
    pub async fn list_populated(&self) -> DbResult<Vec<PopulatedSale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_date DESC, sale_number DESC");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.populate(sales, None).await
    }

    /// One sale with customer and products expanded.
    pub async fn get_populated(&self, id: &str) -> DbResult<PopulatedSale> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let mut populated = self.populate(vec![sale], Some(id)).await?;
        populated
            .pop()
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Number of sales whose `sale_date` falls in the window.
    pub async fn count_in_window(&self, window: &DayWindow) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_date >= ?1 AND sale_date < ?2")
                .bind(window.start)
                .bind(window.end)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Attaches items and display summaries. `sale_id = None` loads for all sales.
    async fn populate(
        &self,
        sales: Vec<Sale>,
        sale_id: Option<&str>,
    ) -> DbResult<Vec<PopulatedSale>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT sale_id, product_id, quantity, unit_price_cents, subtotal_cents
            FROM sale_items
            WHERE (?1 IS NULL OR sale_id = ?1)
            ORDER BY sale_id, position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in rows {
            items.entry(row.sale_id).or_default().push(row.item);
        }

        let products: HashMap<String, ProductSummary> =
            sqlx::query_as::<_, (String, String, String, String, i64)>(
                r#"
                SELECT DISTINCT p.id, p.name, p.sku, p.category, p.price_cents
                FROM products p
                JOIN sale_items si ON si.product_id = p.id
                WHERE (?1 IS NULL OR si.sale_id = ?1)
                "#,
            )
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|(id, name, sku, category, price_cents)| {
                let summary = ProductSummary {
                    id: id.clone(),
                    name,
                    sku,
                    category,
                    price_cents,
                };
                (id, summary)
            })
            .collect();

        let customers: HashMap<String, CustomerSummary> =
            sqlx::query_as::<_, (String, String, String)>(
                r#"
                SELECT DISTINCT c.id, c.name, c.email
                FROM customers c
                JOIN sales s ON s.customer_id = c.id
                WHERE (?1 IS NULL OR s.id = ?1)
                "#,
            )
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|(id, name, email)| (id.clone(), CustomerSummary { id, name, email }))
            .collect();

        Ok(sales
            .into_iter()
            .map(|mut sale| {
                sale.items = items.remove(&sale.id).unwrap_or_default();
                let customer = sale
                    .customer_id
                    .as_ref()
                    .and_then(|id| customers.get(id).cloned());
                PopulatedSale::assemble(sale, customer, &products)
            })
            .collect())
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

/// Next unused sale number for the window's day.
///
/// Pre-supplied numbers never touch the counter, so the counter can land on a
/// number that is already stored. Such sequences are skipped; the counter
/// keeps every bump, so the skip is not repeated by later sales.
async fn allocate_sale_number(
    conn: &mut SqliteConnection,
    window: &DayWindow,
) -> DbResult<SaleNumber> {
    loop {
        let sequence = allocate_sequence(&mut *conn, window).await?;
        let number = SaleNumber::new(window.date, sequence);

        if !sale_number_taken(&mut *conn, &number).await? {
            return Ok(number);
        }
        debug!(sale_number = %number, "Sale number already taken, skipping");
    }
}

async fn sale_number_taken(conn: &mut SqliteConnection, number: &SaleNumber) -> DbResult<bool> {
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales WHERE sale_number = ?)")
        .bind(number.to_string())
        .fetch_one(&mut *conn)
        .await?;
    Ok(taken)
}

/// Next sequence number for the window's day.
///
/// The first call of a day seeds the counter from the sales already stored in
/// the window, so imported history keeps its numbering; later calls bump it.
async fn allocate_sequence(conn: &mut SqliteConnection, window: &DayWindow) -> DbResult<u32> {
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sale_counters (day, last_seq)
        VALUES (
            ?1,
            (SELECT COUNT(*) FROM sales WHERE sale_date >= ?2 AND sale_date < ?3) + 1
        )
        ON CONFLICT (day) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(window.date)
    .bind(window.start)
    .bind(window.end)
    .fetch_one(&mut *conn)
    .await?;

    u32::try_from(sequence)
        .map_err(|_| DbError::Internal(format!("sale counter out of range: {sequence}")))
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, sale_number, sale_date, customer_id,
            subtotal_cents, tax_cents, discount_cents, total_cents,
            payment_method, payment_status, staff_member, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.sale_number)
    .bind(sale.sale_date)
    .bind(&sale.customer_id)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.payment_status)
    .bind(&sale.staff_member)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value(&sale.sale_number))?;

    for (position, item) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, position, product_id, quantity, unit_price_cents, subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn fetch_customer_summary(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<CustomerSummary>> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT id, name, email FROM customers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(id, name, email)| CustomerSummary { id, name, email }))
}
