//! # Customer Repository
//!
//! Database operations for the customer ledger.
//!
//! `total_spent_cents` and `loyalty_points` are written in exactly one place:
//! [`credit_sale`], called from inside the sale transaction. The CRUD methods
//! never touch them.

use chrono::{Months, Utc};
use serde::Serialize;
use smartstock_core::{sale::loyalty_points_for, CoreError, Customer, CustomerInput, Money};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, street, city, state, zip, country, \
     total_spent_cents, loyalty_points, created_at, updated_at";

/// Figures shown on the customer dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_customers: i64,
    /// Customers created during the last month.
    pub new_customers: i64,
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// All customers, most recently updated first.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql =
            format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY updated_at DESC, name");
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Validates and inserts a customer with zeroed aggregates.
    ///
    /// ## Errors
    /// - `Core(Validation)` when name, email or phone is missing
    /// - `UniqueViolation` when the email is already registered
    pub async fn create(&self, input: CustomerInput) -> DbResult<Customer> {
        let input = input.normalize().map_err(CoreError::from)?;
        let now = Utc::now();

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            total_spent_cents: 0,
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, email = %customer.email, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, phone, street, city, state, zip, country,
                total_spent_cents, loyalty_points, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 0, ?10, ?11)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address.street)
        .bind(&customer.address.city)
        .bind(&customer.address.state)
        .bind(&customer.address.zip)
        .bind(&customer.address.country)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&customer.email))?;

        Ok(customer)
    }

    /// Updates contact details. Aggregates are left as they are.
    pub async fn update(&self, id: &str, input: CustomerInput) -> DbResult<Customer> {
        let input = input.normalize().map_err(CoreError::from)?;
        let email = input.email.clone();

        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2, email = ?3, phone = ?4,
                street = ?5, city = ?6, state = ?7, zip = ?8, country = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.address.street)
        .bind(input.address.city)
        .bind(input.address.state)
        .bind(input.address.zip)
        .bind(input.address.country)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&email))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get(id).await
    }

    /// Deletes a customer. Their sales keep a NULL customer reference.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    pub async fn dashboard_stats(&self) -> DbResult<CustomerStats> {
        let now = Utc::now();
        let since = now.checked_sub_months(Months::new(1)).unwrap_or(now);

        let stats = sqlx::query_as::<_, CustomerStats>(
            r#"
            SELECT
                COUNT(*) AS total_customers,
                COALESCE(SUM(CASE WHEN created_at >= ?1 THEN 1 ELSE 0 END), 0) AS new_customers
            FROM customers
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

/// Adds a committed sale's total to the customer's aggregates.
///
/// Returns `false` when the id does not resolve; the caller keeps the sale
/// and skips the credit.
pub(crate) async fn credit_sale(
    conn: &mut SqliteConnection,
    customer_id: &str,
    total: Money,
) -> DbResult<bool> {
    let points = loyalty_points_for(total);

    let result = sqlx::query(
        r#"
        UPDATE customers SET
            total_spent_cents = total_spent_cents + ?2,
            loyalty_points = loyalty_points + ?3,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(customer_id)
    .bind(total.cents())
    .bind(points)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let credited = result.rows_affected() == 1;
    debug!(customer_id = %customer_id, points, credited, "Credited customer");
    Ok(credited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use smartstock_core::{Address, ValidationError};

    fn input(email: &str) -> CustomerInput {
        CustomerInput {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            address: Address {
                city: Some("London".to_string()),
                ..Default::default()
            },
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let repo = db.customers();

        let created = repo.create(input("Ada@Example.com")).await.unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert_eq!(created.total_spent_cents, 0);
        assert_eq!(created.loyalty_points, 0);

        let fetched = repo.get(&created.id).await.unwrap();
        assert_eq!(fetched.address.city.as_deref(), Some("London"));
        assert_eq!(fetched.address.street, None);
    }

    #[tokio::test]
    async fn test_missing_contact_fields() {
        let db = db().await;
        let mut bad = input("ada@example.com");
        bad.phone = String::new();

        let err = db.customers().create(bad).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = db().await;
        let repo = db.customers();

        repo.create(input("ada@example.com")).await.unwrap();
        let err = repo.create(input("ADA@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_aggregates() {
        let db = db().await;
        let repo = db.customers();
        let created = repo.create(input("ada@example.com")).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(credit_sale(&mut conn, &created.id, Money::from_cents(5500))
            .await
            .unwrap());
        drop(conn);

        let mut changed = input("ada.l@example.com");
        changed.name = "Ada King".to_string();
        let updated = repo.update(&created.id, changed).await.unwrap();

        assert_eq!(updated.name, "Ada King");
        assert_eq!(updated.total_spent_cents, 5500);
        assert_eq!(updated.loyalty_points, 5);
    }

    #[tokio::test]
    async fn test_credit_unknown_customer_is_skipped() {
        let db = db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let credited = credit_sale(&mut conn, "missing", Money::from_cents(1000))
            .await
            .unwrap();
        assert!(!credited);
    }

    #[tokio::test]
    async fn test_delete_and_stats() {
        let db = db().await;
        let repo = db.customers();

        let a = repo.create(input("a@example.com")).await.unwrap();
        repo.create(input("b@example.com")).await.unwrap();

        let stats = repo.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_customers, 2);
        assert_eq!(stats.new_customers, 2);

        repo.delete(&a.id).await.unwrap();
        assert!(matches!(
            repo.delete(&a.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
