//! # smartstock-db: Database Layer for SmartStock
//!
//! SQLite storage for products, customers, sales and users, accessed through
//! sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SmartStock Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   smartstock-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CustomerRepo  │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ SaleRepo      │    │  _schema.sql │  │   │
//! │  │   │               │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  smartstock.db (SQLite file)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smartstock_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("smartstock.db")).await?;
//! let sale = db.sales().create_sale(request).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::{CustomerRepository, CustomerStats};
pub use repository::product::{ProductRepository, ProductStats};
pub use repository::report::{
    CustomerInsights, InventoryHealth, ReportRepository, Series, TopCustomer, TopProduct,
};
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
