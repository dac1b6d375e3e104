//! # Seed Data Generator
//!
//! Populates a SmartStock database with sample products, customers and sales.
//!
//! ## Usage
//! ```bash
//! # Seed ./smartstock.db
//! cargo run -p smartstock-db --bin seed
//!
//! # Specify database path and number of generated sales
//! cargo run -p smartstock-db --bin seed -- --db ./data/smartstock.db --sales 40
//! ```
//!
//! Sales go through `SaleRepository::create_sale`, so stock, sale numbers and
//! customer loyalty aggregates come out exactly as they would from the API.

use std::env;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use smartstock_core::{Address, CustomerInput, LineRequest, PaymentMethod, ProductInput, SaleRequest};
use smartstock_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (name, sku, category, price_cents, stock, supplier)
const PRODUCTS: &[(&str, &str, &str, i64, i64, &str)] = &[
    ("Wireless Mouse", "WM-001", "Electronics", 2599, 120, "TechSupply Co"),
    ("Mechanical Keyboard", "KB-002", "Electronics", 8999, 45, "TechSupply Co"),
    ("USB-C Cable 1m", "USB-C-1M", "Accessories", 999, 300, "CableWorks"),
    ("27in Monitor", "MON-27", "Electronics", 24999, 12, "DisplayHub"),
    ("Laptop Stand", "LS-010", "Accessories", 3499, 8, "DeskPro"),
    ("Office Chair", "OC-100", "Furniture", 18999, 6, "DeskPro"),
    ("Standing Desk", "SD-200", "Furniture", 45999, 3, "DeskPro"),
    ("Notebook A5", "NB-A5", "Stationery", 499, 500, "PaperMill"),
    ("Gel Pen Pack", "PEN-GEL-10", "Stationery", 799, 0, "PaperMill"),
    ("Webcam HD", "CAM-HD", "Electronics", 5999, 25, "TechSupply Co"),
];

/// (name, email, phone, city)
const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("Ada Lovelace", "ada@example.com", "555-0100", "London"),
    ("Grace Hopper", "grace@example.com", "555-0101", "Arlington"),
    ("Alan Turing", "alan@example.com", "555-0102", "Manchester"),
    ("Katherine Johnson", "katherine@example.com", "555-0103", "Hampton"),
    ("Linus Torvalds", "linus@example.com", "555-0104", "Portland"),
];

const STAFF: &[&str] = &["Jordan", "Sam", "Priya"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./smartstock.db");
    let mut sale_count: usize = 25;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                db_path = args.get(i + 1).context("--db needs a path")?.clone();
                i += 1;
            }
            "--sales" | "-s" => {
                let raw = args.get(i + 1).context("--sales needs a number")?;
                sale_count = raw
                    .parse()
                    .with_context(|| format!("invalid --sales value: {raw}"))?;
                i += 1;
            }
            "--help" | "-h" => {
                println!("SmartStock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./smartstock.db)");
                println!("  -s, --sales <N>     Number of sales to generate (default: 25)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    info!(db = %db_path, sales = sale_count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, sku, category, price_cents, stock, supplier) in PRODUCTS {
        let product = db
            .products()
            .create(ProductInput {
                name: name.to_string(),
                sku: sku.to_string(),
                category: category.to_string(),
                price_cents: *price_cents,
                stock: *stock,
                supplier: Some(supplier.to_string()),
                ..Default::default()
            })
            .await
            .with_context(|| format!("inserting product {sku}"))?;
        product_ids.push(product.id);
    }
    println!("✓ Inserted {} products", product_ids.len());

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (name, email, phone, city) in CUSTOMERS {
        let customer = db
            .customers()
            .create(CustomerInput {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                address: Address {
                    city: Some(city.to_string()),
                    ..Default::default()
                },
            })
            .await
            .with_context(|| format!("inserting customer {email}"))?;
        customer_ids.push(customer.id);
    }
    println!("✓ Inserted {} customers", customer_ids.len());

    let now = Utc::now();
    let mut committed = 0;
    for n in 0..sale_count {
        // Spread over the last two weeks; every third sale is a walk-in.
        let customer = (n % 3 != 0).then(|| customer_ids[n % customer_ids.len()].clone());
        let first = n % product_ids.len();
        let second = (n * 7 + 3) % product_ids.len();

        let mut items = vec![LineRequest {
            product_id: Some(product_ids[first].clone()),
            quantity: Some(1 + (n % 3) as i64),
            ..Default::default()
        }];
        if second != first {
            items.push(LineRequest {
                product_id: Some(product_ids[second].clone()),
                quantity: Some(1),
                ..Default::default()
            });
        }

        let request = SaleRequest {
            customer,
            items,
            staff_member: Some(STAFF[n % STAFF.len()].to_string()),
            payment_method: Some(PaymentMethod::ALL[n % PaymentMethod::ALL.len()].to_string()),
            tax_cents: Some(((n % 5) * 100) as i64),
            discount_cents: Some(0),
            sale_date: Some(now - Duration::hours((n as i64 * 13) % (14 * 24))),
            ..Default::default()
        };

        match db.sales().create_sale(request).await {
            Ok(sale) => {
                committed += 1;
                info!(sale_number = %sale.sale_number, total_cents = sale.total_cents, "Seeded sale");
            }
            // Some sample products run out; those sales are expected to fail.
            Err(e) => warn!(error = %e, "Skipped sale"),
        }
    }
    println!("✓ Committed {committed} of {sale_count} sales");

    db.close().await;
    println!("✓ Seed complete!");
    Ok(())
}
