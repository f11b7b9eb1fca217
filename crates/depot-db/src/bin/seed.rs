//! # Seed Data Generator
//!
//! Prepares a fresh Depot database for development: applies migrations,
//! inserts reference data and provisions the first administrator.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults (admin@depot.local / change-me-now)
//! cargo run -p depot-db --bin seed -- --url postgres://depot_owner@localhost/depot
//!
//! # Custom administrator and an opening stock receipt
//! cargo run -p depot-db --bin seed -- \
//!     --admin-email boss@shop.ua --admin-password 's3cret-pass' --with-stock
//! ```
//!
//! The URL must be the schema owner's login (it needs CREATEROLE to
//! provision employee logins). Falls back to `DEPOT_DATABASE__PROVISIONING_URL`.
//!
//! ## Generated Data
//! - Positions: Адміністратор, Касир
//! - Categories with a handful of products each
//! - One supplier
//! - The administrator employee plus their database login
//! - With `--with-stock`: a completed receiving invoice stocking every product

use chrono::{Duration, Utc};
use depot_core::{DbRole, InvoiceStatus, InvoiceType, Money, NewEmployee, NewInvoiceLine};
use depot_db::{Database, DbConfig};
use std::env;

const ADMIN_POSITION: &str = "Адміністратор";
const SELLER_POSITION: &str = "Касир";

/// Product catalog for realistic test data: (category, [(name, unit price)])
const CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        "Молочні продукти",
        &[
            ("Молоко 2.5% 1л", "38.90"),
            ("Кефір 1% 0.9л", "34.50"),
            ("Сир кисломолочний 9% 350г", "72.00"),
            ("Масло вершкове 82% 200г", "89.90"),
        ],
    ),
    (
        "Хлібобулочні вироби",
        &[
            ("Хліб білий 500г", "24.00"),
            ("Батон нарізний 400г", "21.50"),
            ("Лаваш 200г", "19.90"),
        ],
    ),
    (
        "Напої",
        &[
            ("Вода мінеральна 1.5л", "22.40"),
            ("Сік яблучний 1л", "49.90"),
            ("Чай чорний 100г", "64.00"),
        ],
    ),
    (
        "Бакалія",
        &[
            ("Гречка 1кг", "58.00"),
            ("Рис довгозернистий 1кг", "61.50"),
            ("Цукор 1кг", "32.90"),
            ("Борошно пшеничне 2кг", "45.00"),
        ],
    ),
];

/// Units received per product with `--with-stock`.
const OPENING_QUANTITY: i64 = 40;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut url = env::var("DEPOT_DATABASE__PROVISIONING_URL").unwrap_or_default();
    let mut admin_email = String::from("admin@depot.local");
    let mut admin_password = String::from("change-me-now");
    let mut with_stock = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" | "-u" => {
                if i + 1 < args.len() {
                    url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-email" => {
                if i + 1 < args.len() {
                    admin_email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--with-stock" => with_stock = true,
            "--help" | "-h" => {
                println!("Depot Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --url <URL>            Schema owner connection URL");
                println!("                             (default: $DEPOT_DATABASE__PROVISIONING_URL)");
                println!("      --admin-email <EMAIL>  First administrator (default: admin@depot.local)");
                println!("      --admin-password <PW>  Their password (default: change-me-now)");
                println!("      --with-stock           Receive opening stock for every product");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    if url.is_empty() {
        eprintln!("No database URL. Pass --url or set DEPOT_DATABASE__PROVISIONING_URL.");
        std::process::exit(2);
    }

    println!("🌱 Depot Seed Data Generator");
    println!("============================");
    println!("Administrator: {}", admin_email);
    println!();

    // Connect as the schema owner and migrate
    let db = Database::new(DbConfig::new(&url).max_connections(2).run_migrations(true)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employee")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} employees", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    // Reference data
    let mut admin_position_id = 0_i64;
    for name in [ADMIN_POSITION, SELLER_POSITION] {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO position (position_name) VALUES ($1) RETURNING position_id",
        )
        .bind(name)
        .fetch_one(db.pool())
        .await?;
        if name == ADMIN_POSITION {
            admin_position_id = id;
        }
    }
    println!("✓ Positions created");

    let mut products: Vec<(i64, Money)> = Vec::new();
    for (category, items) in CATALOG {
        let category_id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (category_name) VALUES ($1) RETURNING category_id",
        )
        .bind(category)
        .fetch_one(db.pool())
        .await?;

        for (name, price) in items.iter() {
            let product_id: i64 = sqlx::query_scalar(
                "INSERT INTO products (product_name, category_id) VALUES ($1, $2) RETURNING product_id",
            )
            .bind(name)
            .bind(category_id)
            .fetch_one(db.pool())
            .await?;
            products.push((product_id, Money::parse_major(price)?));
        }
    }
    println!("✓ {} products in {} categories", products.len(), CATALOG.len());

    let provider_id: i64 = sqlx::query_scalar(
        "INSERT INTO provider (provider_name, phone_number, email) \
         VALUES ('ТОВ Агроторг', '+380441234567', 'sales@agrotorg.ua') RETURNING provider_id",
    )
    .fetch_one(db.pool())
    .await?;
    println!("✓ Supplier created");

    // First administrator, with a database login
    let admin = db
        .employees()
        .provision(
            &NewEmployee {
                first_name: "Адмін".to_string(),
                last_name: "Системний".to_string(),
                middle_name: None,
                phone_number: None,
                email: admin_email.clone(),
                hire_date: None,
                position_id: Some(admin_position_id),
                role: DbRole::Admin,
            },
            &admin_password,
        )
        .await?;
    println!("✓ Administrator #{} provisioned", admin.employee_id);

    if with_stock {
        let invoice = db
            .invoices()
            .create(admin.employee_id, InvoiceType::Receiving, Some(provider_id))
            .await?;

        let today = Utc::now().date_naive();
        let use_by = today + Duration::days(90);
        for (product_id, price) in &products {
            db.invoice_lines()
                .add_line(&NewInvoiceLine {
                    invoice_id: invoice.invoice_id,
                    product_id: *product_id,
                    quantity: OPENING_QUANTITY,
                    product_price: *price,
                    date_of_manufacture: Some(today),
                    use_by_date: Some(use_by),
                })
                .await?;
        }

        db.invoices()
            .complete(invoice.invoice_id, InvoiceStatus::Completed, Utc::now())
            .await?;
        println!(
            "✓ Receiving invoice #{} completed ({} units each)",
            invoice.invoice_id, OPENING_QUANTITY
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
