//! # Report Repository
//!
//! Read-only aggregations behind `/api/reports`.
//!
//! ```text
//! sales_trend        sales           ──► one bucket per local day, oldest first
//! sales_by_category  sale_items ⋈ products ──► Σ subtotal per category
//! top_products       sale_items ⋈ products ──► Σ qty, Σ revenue, margin
//! inventory_health   products (active)      ──► low / out / healthy
//! customer_insights  customers              ──► totals, VIPs, top spender
//! ```

use chrono::{Duration, Local, Months, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use smartstock_core::{DayWindow, VIP_LOYALTY_POINTS};
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Longest trend window accepted, in days.
pub const MAX_TREND_DAYS: u32 = 366;

/// Share of the current price assumed to be cost when estimating margin.
const ASSUMED_COST_RATIO: f64 = 0.6;

// =============================================================================
// Report shapes
// =============================================================================

/// Parallel label/value series, ready for a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    /// Amounts in cents.
    pub data: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub name: String,
    pub sku: String,
    pub total_quantity: i64,
    pub total_revenue_cents: i64,
    #[sqlx(skip)]
    pub profit_margin: f64,
    #[serde(skip)]
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryHealth {
    pub total_products: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub healthy_count: i64,
    pub health_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInsights {
    pub total_customers: i64,
    pub vip_customers: i64,
    pub new_customers: i64,
    pub top_customer: Option<TopCustomer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub name: String,
    pub total_spent_cents: i64,
    pub loyalty_points: i64,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Daily sale totals for the last `days` local days, today included.
    pub async fn sales_trend(&self, days: u32) -> DbResult<Series> {
        self.sales_trend_ending(days, Local::now().date_naive(), &Local)
            .await
    }

    /// Daily sale totals for the `days` days ending on `last_day` in `tz`.
    ///
    /// `days` is clamped to `1..=MAX_TREND_DAYS`.
    pub async fn sales_trend_ending<Tz: TimeZone>(
        &self,
        days: u32,
        last_day: NaiveDate,
        tz: &Tz,
    ) -> DbResult<Series> {
        let days = days.clamp(1, MAX_TREND_DAYS);
        let first_day = last_day - Duration::days(i64::from(days) - 1);

        let windows: Vec<DayWindow> = first_day
            .iter_days()
            .take(days as usize)
            .map(|date| DayWindow::for_date(date, tz))
            .collect();

        let (start, end) = match (windows.first(), windows.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => return Ok(Series::default()),
        };

        let rows = sqlx::query_as::<_, (chrono::DateTime<Utc>, i64)>(
            "SELECT sale_date, total_cents FROM sales WHERE sale_date >= ?1 AND sale_date < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut data = vec![0_i64; windows.len()];
        for (sale_date, total_cents) in rows {
            if let Some(index) = windows.iter().position(|w| w.contains(sale_date)) {
                data[index] += total_cents;
            }
        }

        Ok(Series {
            labels: windows.iter().map(|w| trend_label(w.date)).collect(),
            data,
        })
    }

    /// Revenue per current product category, largest first.
    pub async fn sales_by_category(&self) -> DbResult<Series> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT p.category, SUM(si.subtotal_cents) AS revenue
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            GROUP BY p.category
            ORDER BY revenue DESC, p.category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let (labels, data) = rows.into_iter().unzip();
        Ok(Series { labels, data })
    }

    /// Best-selling products by revenue.
    pub async fn top_products(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let mut products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.name,
                p.sku,
                p.price_cents,
                SUM(si.quantity) AS total_quantity,
                SUM(si.subtotal_cents) AS total_revenue_cents
            FROM sale_items si
            JOIN products p ON p.id = si.product_id
            GROUP BY p.id
            ORDER BY total_revenue_cents DESC, p.name
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        for product in &mut products {
            product.profit_margin = profit_margin(
                product.total_revenue_cents,
                product.total_quantity,
                product.price_cents,
            );
        }

        Ok(products)
    }

    /// Stock health over active products.
    pub async fn inventory_health(&self) -> DbResult<InventoryHealth> {
        let (total, low, out): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN stock > 0 AND stock <= min_stock THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN stock = 0 THEN 1 ELSE 0 END), 0)
            FROM products
            WHERE is_active
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let healthy = total - low - out;
        Ok(InventoryHealth {
            total_products: total,
            low_stock_count: low,
            out_of_stock_count: out,
            healthy_count: healthy,
            health_percentage: percentage(healthy, total),
        })
    }

    pub async fn customer_insights(&self) -> DbResult<CustomerInsights> {
        let now = Utc::now();
        let month_ago = now.checked_sub_months(Months::new(1)).unwrap_or(now);

        let (total, vip, new): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN loyalty_points >= ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN created_at > ?2 THEN 1 ELSE 0 END), 0)
            FROM customers
            "#,
        )
        .bind(VIP_LOYALTY_POINTS)
        .bind(month_ago)
        .fetch_one(&self.pool)
        .await?;

        // Ties go to the earliest-inserted customer.
        let top_customer = sqlx::query_as::<_, TopCustomer>(
            r#"
            SELECT name, total_spent_cents, loyalty_points
            FROM customers
            ORDER BY total_spent_cents DESC, rowid
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(CustomerInsights {
            total_customers: total,
            vip_customers: vip,
            new_customers: new,
            top_customer,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `Mon, Mar 5`
fn trend_label(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

/// Estimated margin in percent, one decimal, assuming cost is 60% of the
/// current price. Zero when there is no revenue.
fn profit_margin(revenue_cents: i64, quantity: i64, price_cents: i64) -> f64 {
    if revenue_cents == 0 {
        return 0.0;
    }
    let revenue = revenue_cents as f64;
    let cost = quantity as f64 * price_cents as f64 * ASSUMED_COST_RATIO;
    round_one_decimal((revenue - cost) / revenue * 100.0)
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_one_decimal(part as f64 / whole as f64 * 100.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use smartstock_core::{CustomerInput, LineRequest, ProductInput, SaleRequest};

    #[test]
    fn test_trend_label() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(trend_label(date), "Mon, Mar 4");
    }

    #[test]
    fn test_profit_margin() {
        // Sold at list price: 40% margin.
        assert_eq!(profit_margin(10_000, 10, 1_000), 40.0);
        // Sold at a discount.
        assert_eq!(profit_margin(9_000, 10, 1_000), 33.3);
        assert_eq!(profit_margin(0, 0, 1_000), 0.0);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(0, 0), 0.0);
    }

    async fn seeded() -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mouse = db
            .products()
            .create(ProductInput {
                name: "Mouse".to_string(),
                sku: "MS-1".to_string(),
                category: "Electronics".to_string(),
                price_cents: 1_000,
                stock: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        let bread = db
            .products()
            .create(ProductInput {
                name: "Bread".to_string(),
                sku: "BR-1".to_string(),
                category: "Grocery".to_string(),
                price_cents: 300,
                stock: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        (db, mouse.id, bread.id)
    }

    fn sale(items: Vec<(&str, i64)>) -> SaleRequest {
        SaleRequest {
            items: items
                .into_iter()
                .map(|(id, quantity)| LineRequest {
                    product_id: Some(id.to_string()),
                    quantity: Some(quantity),
                    ..Default::default()
                })
                .collect(),
            staff_member: Some("Sam".to_string()),
            payment_method: Some("Cash".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sales_trend_buckets_by_day() {
        let (db, mouse, _) = seeded().await;
        let today = Utc::now().date_naive();

        let mut yesterday = sale(vec![(&mouse, 1)]);
        yesterday.sale_date = Some(Utc::now() - Duration::days(1));
        db.sales().create_sale(yesterday).await.unwrap();

        let mut now = sale(vec![(&mouse, 2)]);
        now.sale_date = Some(Utc::now());
        db.sales().create_sale(now).await.unwrap();

        let trend = db
            .reports()
            .sales_trend_ending(3, today, &Utc)
            .await
            .unwrap();
        assert_eq!(trend.labels.len(), 3);
        assert_eq!(trend.data, vec![0, 1_000, 2_000]);
        assert_eq!(trend.labels[2], trend_label(today));

        let clamped = db
            .reports()
            .sales_trend_ending(0, today, &Utc)
            .await
            .unwrap();
        assert_eq!(clamped.data.len(), 1);
    }

    #[tokio::test]
    async fn test_category_and_top_products() {
        let (db, mouse, bread) = seeded().await;
        db.sales()
            .create_sale(sale(vec![(&mouse, 3), (&bread, 2)]))
            .await
            .unwrap();
        db.sales()
            .create_sale(sale(vec![(&bread, 4)]))
            .await
            .unwrap();

        let by_category = db.reports().sales_by_category().await.unwrap();
        assert_eq!(by_category.labels, vec!["Electronics", "Grocery"]);
        assert_eq!(by_category.data, vec![3_000, 1_800]);

        let top = db.reports().top_products(10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Mouse");
        assert_eq!(top[0].total_quantity, 3);
        assert_eq!(top[0].total_revenue_cents, 3_000);
        assert_eq!(top[0].profit_margin, 40.0);
        assert_eq!(top[1].total_quantity, 6);

        let limited = db.reports().top_products(1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_inventory_health() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let empty = db.reports().inventory_health().await.unwrap();
        assert_eq!(empty.total_products, 0);
        assert_eq!(empty.health_percentage, 0.0);

        for (sku, stock) in [("A", 0), ("B", 5), ("C", 50), ("D", 60)] {
            db.products()
                .create(ProductInput {
                    name: sku.to_string(),
                    sku: sku.to_string(),
                    category: "General".to_string(),
                    stock,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let health = db.reports().inventory_health().await.unwrap();
        assert_eq!(health.total_products, 4);
        assert_eq!(health.out_of_stock_count, 1);
        assert_eq!(health.low_stock_count, 1);
        assert_eq!(health.healthy_count, 2);
        assert_eq!(health.health_percentage, 50.0);
    }

    #[tokio::test]
    async fn test_customer_insights() {
        let (db, mouse, _) = seeded().await;

        let empty = db.reports().customer_insights().await.unwrap();
        assert_eq!(empty.total_customers, 0);
        assert!(empty.top_customer.is_none());

        let mut ids = Vec::new();
        for email in ["a@example.com", "b@example.com"] {
            let customer = db
                .customers()
                .create(CustomerInput {
                    name: email.to_string(),
                    email: email.to_string(),
                    phone: "555-0100".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            ids.push(customer.id);
        }

        // 50 × 10.00 = 500.00 → 50 points; not yet VIP.
        let mut big = sale(vec![(&mouse, 50)]);
        big.customer = Some(ids[1].clone());
        db.sales().create_sale(big).await.unwrap();

        let insights = db.reports().customer_insights().await.unwrap();
        assert_eq!(insights.total_customers, 2);
        assert_eq!(insights.new_customers, 2);
        assert_eq!(insights.vip_customers, 0);
        let top = insights.top_customer.unwrap();
        assert_eq!(top.name, "b@example.com");
        assert_eq!(top.total_spent_cents, 50_000);
        assert_eq!(top.loyalty_points, 50);
    }
}
