//! # smartstock-core: Pure Business Logic for SmartStock
//!
//! Everything in this crate is deterministic and free of I/O. The database
//! layer and the HTTP layer call into it; it never calls out.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SmartStock Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/api (axum REST server)                    │   │
//! │  │    /api/products, /api/customers, /api/sales, /api/reports      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ smartstock-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ SaleDraft │  │   rules   │  │   │
//! │  │   │  Customer │  │           │  │ SaleNumber│  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              smartstock-db (SQLite repositories)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, PaymentMethod, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`sale`] - Sale pricing, totals and the loyalty rule
//! - [`sale_number`] - `SALE-YYYYMMDD-NNNN` formatting and day boundaries
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use smartstock_core::money::Money;
//! use smartstock_core::sale::loyalty_points_for;
//!
//! let total = Money::from_cents(5500); // $55.00
//! assert_eq!(loyalty_points_for(total), 5);
//! ```

pub mod error;
pub mod money;
pub mod sale;
pub mod sale_number;
pub mod types;
pub mod validation;

// Re-exports so callers can `use smartstock_core::Money`
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::{LineRequest, PricedLine, SaleDraft, SaleRequest, SaleTotals};
pub use sale_number::DayWindow;
pub use sale_number::SaleNumber;
pub use types::*;

/// Maximum number of lines accepted in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Default minimum-stock threshold for new products.
pub const DEFAULT_MIN_STOCK: i64 = 10;

/// Loyalty balance at which a customer counts as VIP in reports.
pub const VIP_LOYALTY_POINTS: i64 = 500;
