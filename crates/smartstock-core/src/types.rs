//! # Domain Types
//!
//! Core domain types used throughout SmartStock.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  sale_number    │   │  email (unique) │       │
//! │  │  price_cents    │◄──│  items[]        │──►│  total_spent    │       │
//! │  │  stock          │   │  total_cents    │   │  loyalty_points │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  PaymentMethod  │   │  PaymentStatus  │   │      User       │       │
//! │  │  Cash, Check,   │   │  Paid (default) │   │  login account  │       │
//! │  │  Credit Card... │   │  Pending, Canc. │   │  argon2 hash    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, sale_number, email) - human-readable

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;
use crate::DEFAULT_MIN_STOCK;

// =============================================================================
// Product
// =============================================================================

/// A product in the inventory ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Stock Keeping Unit, uppercase, unique.
    pub sku: String,

    pub category: String,

    /// Current unit price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Low-stock threshold.
    pub min_stock: i64,

    pub supplier: Option<String>,
    pub description: Option<String>,
    pub barcode: Option<String>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Stock is at or below the threshold but not exhausted.
    pub fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock <= self.min_stock
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Value of the units on hand at the current price.
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.stock)
    }

    /// Display fields embedded in populated sales.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            sku: self.sku.clone(),
            category: self.category.clone(),
            price_cents: self.price_cents,
        }
    }
}

/// Editable product fields, as received from create and update requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    pub min_stock: Option<i64>,
    pub supplier: Option<String>,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductInput {
    /// Validates the input and returns it with trimmed text and an uppercase SKU.
    pub fn normalize(self) -> Result<ProductInput, ValidationError> {
        let name = self.name.trim().to_string();
        validation::validate_product_name(&name)?;

        let sku = validation::normalize_sku(&self.sku);
        validation::validate_sku(&sku)?;

        let category = self.category.trim().to_string();
        validation::validate_required("category", &category)?;

        validation::validate_price_cents(self.price_cents)?;
        validation::validate_non_negative("stock", self.stock)?;

        let min_stock = self.min_stock.unwrap_or(DEFAULT_MIN_STOCK);
        validation::validate_non_negative("minStock", min_stock)?;

        Ok(ProductInput {
            name,
            sku,
            category,
            price_cents: self.price_cents,
            stock: self.stock,
            min_stock: Some(min_stock),
            supplier: trim_optional(self.supplier),
            description: trim_optional(self.description),
            barcode: trim_optional(self.barcode),
            is_active: Some(self.is_active.unwrap_or(true)),
        })
    }
}

/// Product fields shown next to a sale line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price_cents: i64,
}

// =============================================================================
// Customer
// =============================================================================

/// Postal address, every part optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

impl Address {
    fn normalize(self) -> Address {
        Address {
            street: trim_optional(self.street),
            city: trim_optional(self.city),
            state: trim_optional(self.state),
            zip: trim_optional(self.zip),
            country: trim_optional(self.country),
        }
    }
}

/// A customer in the loyalty ledger.
///
/// `total_spent_cents` and `loyalty_points` only ever grow, and only through
/// committed sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Stored lowercase, unique.
    pub email: String,
    pub phone: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    pub total_spent_cents: i64,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }

    pub fn summary(&self) -> CustomerSummary {
        CustomerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Editable customer fields. Aggregates are deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
}

impl CustomerInput {
    /// Validates the input; the email is lowercased.
    pub fn normalize(self) -> Result<CustomerInput, ValidationError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();
        let phone = self.phone.trim().to_string();

        if name.is_empty() || email.is_empty() || phone.is_empty() {
            return Err(ValidationError::required("Name, email, and phone"));
        }
        validation::validate_email(&email)?;

        Ok(CustomerInput {
            name,
            email,
            phone,
            address: self.address.normalize(),
        })
    }
}

/// Customer fields shown on a populated sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

// =============================================================================
// Payment Method / Payment Status
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "Credit Card")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Credit Card"))]
    CreditCard,
    #[serde(rename = "Debit Card")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Debit Card"))]
    DebitCard,
    Check,
    #[serde(rename = "Gift Card")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Gift Card"))]
    GiftCard,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Check,
        PaymentMethod::GiftCard,
        PaymentMethod::Other,
    ];

    /// The stored and displayed label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::Check => "Check",
            PaymentMethod::GiftCard => "Gift Card",
            PaymentMethod::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.to_string()).collect(),
            })
    }
}

/// Settlement state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentStatus {
    #[default]
    Paid,
    Pending,
    Cancelled,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// `SALE-YYYYMMDD-NNNN`, unique.
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    /// Absent for walk-in sales. May dangle if the customer was deleted.
    pub customer_id: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub staff_member: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether the stored amounts satisfy the sale invariants.
    pub fn is_consistent(&self) -> bool {
        let lines_ok = self
            .items
            .iter()
            .all(|i| i.subtotal_cents == i.quantity * i.unit_price_cents);
        let subtotal: i64 = self.items.iter().map(|i| i.subtotal_cents).sum();

        lines_ok
            && subtotal == self.subtotal_cents
            && self.total_cents == self.subtotal_cents + self.tax_cents - self.discount_cents
    }
}

/// A line of a sale. The unit price is frozen at sale time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub subtotal_cents: i64,
}

/// A sale with its customer and line products expanded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedSale {
    pub id: String,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Option<String>,
    /// `None` for walk-ins and for references that no longer resolve.
    pub customer: Option<CustomerSummary>,
    pub items: Vec<PopulatedSaleItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub staff_member: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedSaleItem {
    pub product_id: String,
    pub product: Option<ProductSummary>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl PopulatedSale {
    /// Joins a sale with the display fields of its customer and products.
    pub fn assemble(
        sale: Sale,
        customer: Option<CustomerSummary>,
        products: &HashMap<String, ProductSummary>,
    ) -> PopulatedSale {
        let items = sale
            .items
            .into_iter()
            .map(|item| PopulatedSaleItem {
                product: products.get(&item.product_id).cloned(),
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                subtotal_cents: item.subtotal_cents,
            })
            .collect();

        PopulatedSale {
            id: sale.id,
            sale_number: sale.sale_number,
            sale_date: sale.sale_date,
            customer_id: sale.customer_id,
            customer,
            items,
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            discount_cents: sale.discount_cents,
            total_cents: sale.total_cents,
            payment_method: sale.payment_method,
            payment_status: sale.payment_status,
            staff_member: sale.staff_member,
            notes: sale.notes,
            created_at: sale.created_at,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff login account.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user returned by signup and login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, min_stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            name: "Wireless Mouse".to_string(),
            sku: "WM-001".to_string(),
            category: "Electronics".to_string(),
            price_cents: 2599,
            stock,
            min_stock,
            supplier: None,
            description: None,
            barcode: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_low_stock_excludes_out_of_stock() {
        assert!(product(3, 10).is_low_stock());
        assert!(product(10, 10).is_low_stock());
        assert!(!product(0, 10).is_low_stock());
        assert!(product(0, 10).is_out_of_stock());
        assert!(!product(11, 10).is_low_stock());
    }

    #[test]
    fn test_can_sell() {
        let p = product(5, 2);
        assert!(p.can_sell(5));
        assert!(!p.can_sell(6));
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).unwrap(),
            "\"Credit Card\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"Gift Card\"").unwrap();
        assert_eq!(parsed, PaymentMethod::GiftCard);
        assert_eq!("Check".parse::<PaymentMethod>().unwrap(), PaymentMethod::Check);
        assert!("Bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_status_defaults_to_paid() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Paid);
    }

    #[test]
    fn test_product_input_normalizes_sku_and_defaults() {
        let input = ProductInput {
            name: "  USB Cable ".to_string(),
            sku: "usb-c-1m".to_string(),
            category: "Accessories".to_string(),
            price_cents: 999,
            stock: 40,
            ..Default::default()
        }
        .normalize()
        .unwrap();

        assert_eq!(input.name, "USB Cable");
        assert_eq!(input.sku, "USB-C-1M");
        assert_eq!(input.min_stock, Some(DEFAULT_MIN_STOCK));
        assert_eq!(input.is_active, Some(true));
    }

    #[test]
    fn test_product_input_rejects_negative_stock() {
        let result = ProductInput {
            name: "Cable".to_string(),
            sku: "CBL".to_string(),
            category: "Accessories".to_string(),
            stock: -1,
            ..Default::default()
        }
        .normalize();
        assert!(result.is_err());
    }

    #[test]
    fn test_customer_input_requires_contact_fields() {
        let err = CustomerInput {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        }
        .normalize()
        .unwrap_err();
        assert_eq!(err.to_string(), "Name, email, and phone is required");

        let ok = CustomerInput {
            name: "Ada".to_string(),
            email: " Ada@Example.COM ".to_string(),
            phone: "555-0100".to_string(),
            ..Default::default()
        }
        .normalize()
        .unwrap();
        assert_eq!(ok.email, "ada@example.com");
    }

    #[test]
    fn test_sale_consistency() {
        let now = Utc::now();
        let mut sale = Sale {
            id: "s1".to_string(),
            sale_number: "SALE-20240305-0001".to_string(),
            sale_date: now,
            customer_id: None,
            subtotal_cents: 3000,
            tax_cents: 240,
            discount_cents: 100,
            total_cents: 3140,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Paid,
            staff_member: "Sam".to_string(),
            notes: None,
            created_at: now,
            items: vec![
                SaleItem {
                    product_id: "a".to_string(),
                    quantity: 2,
                    unit_price_cents: 1000,
                    subtotal_cents: 2000,
                },
                SaleItem {
                    product_id: "b".to_string(),
                    quantity: 1,
                    unit_price_cents: 1000,
                    subtotal_cents: 1000,
                },
            ],
        };
        assert!(sale.is_consistent());

        sale.total_cents += 1;
        assert!(!sale.is_consistent());
    }
}
