//! # Repository Module
//!
//! Database repository implementations for SmartStock.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                          │
//! │       │  state.db.sales().create_sale(request)                         │
//! │       ▼                                                                 │
//! │  SaleRepository ──────┬──► product::decrement_stock   (same tx)        │
//! │                       └──► customer::credit_sale      (same tx)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ledger writes that must share the sale transaction are free functions
//! taking `&mut SqliteConnection`; everything else goes through the pool.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and dashboard stats
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD and dashboard stats
//! - [`SaleRepository`](sale::SaleRepository) - Transactional sale commit, populated reads
//! - [`UserRepository`](user::UserRepository) - Login accounts
//! - [`ReportRepository`](report::ReportRepository) - Report aggregations

pub mod customer;
pub mod product;
pub mod report;
pub mod sale;
pub mod user;
