//! # Seed Data Generator
//!
//! Populates a database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # 20 clients (default)
//! cargo run -p tally-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p tally-db --bin seed -- --clients 50 --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - A fixed catalogue of products, some stock-tracked
//! - Clients, each with a few backdated credit sales
//! - Cash sales without a client
//! - Payments that leave a mix of OPEN, PARTIAL and PAID sales, and some
//!   client credit from overpayment
//!
//! Everything goes through the ledger, so balances, stock and client debt
//! are exactly what the API would have produced.

use chrono::{Duration, Utc};
use std::env;
use tally_core::{LedgerPolicy, NewClient, NewPayment, NewProduct, NewSale, NewSaleItem, SaleType};
use tally_db::{Database, DbConfig};

/// (name, price in cents, category, tracked stock)
const PRODUCTS: &[(&str, i64, &str, Option<i64>)] = &[
    ("Rice 5kg", 2490, "Grocery", Some(40)),
    ("Black Beans 1kg", 899, "Grocery", Some(60)),
    ("Cooking Oil 900ml", 749, "Grocery", Some(35)),
    ("Coffee 500g", 1890, "Grocery", Some(25)),
    ("Sugar 1kg", 499, "Grocery", None),
    ("Dish Soap", 329, "Cleaning", Some(50)),
    ("Laundry Powder 1kg", 1290, "Cleaning", None),
    ("Bleach 2L", 699, "Cleaning", Some(30)),
    ("Shampoo 350ml", 1590, "Personal Care", None),
    ("Toothpaste", 549, "Personal Care", Some(80)),
];

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fabio", "Gabriela", "Hugo", "Iris", "Joao",
];

const LAST_NAMES: &[&str] = &["Silva", "Souza", "Lima", "Costa", "Pereira", "Almeida"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut clients: usize = 20;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" | "-c" => {
                if i + 1 < args.len() {
                    clients = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --clients <N>  Number of clients to generate (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Clients:  {}", clients);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let ledger = db.ledger(LedgerPolicy::default());

    let mut catalogue = Vec::with_capacity(PRODUCTS.len());
    for (name, price_cents, category, stock) in PRODUCTS {
        let product = db
            .products()
            .create(&NewProduct {
                name: name.to_string(),
                price_cents: *price_cents,
                cost_cents: price_cents * 7 / 10,
                stock: stock.unwrap_or(0),
                track_stock: stock.is_some(),
                category: Some(category.to_string()),
            })
            .await?;
        catalogue.push(product);
    }
    println!("✓ Created {} products", catalogue.len());

    let mut sales = 0;
    let mut payments = 0;

    for seed in 0..clients {
        let name = format!(
            "{} {}",
            FIRST_NAMES[seed % FIRST_NAMES.len()],
            LAST_NAMES[(seed / FIRST_NAMES.len() + seed) % LAST_NAMES.len()]
        );
        let client = db
            .clients()
            .create(&NewClient {
                name,
                phone: Some(format!("555-{:04}", 1000 + seed)),
            })
            .await?;

        // Oldest first, so the FIFO order matches creation order.
        let sale_count = 1 + seed % 4;
        let mut owed = 0;
        for n in 0..sale_count {
            let product = &catalogue[(seed * 3 + n) % catalogue.len()];
            let sale = ledger
                .create_sale(&NewSale {
                    client_id: Some(client.id.clone()),
                    sale_type: SaleType::Credit,
                    items: vec![NewSaleItem {
                        product_id: product.id.clone(),
                        quantity: 1 + ((seed + n) % 3) as i64,
                        unit_price_cents: None,
                    }],
                    adjustment_cents: 0,
                    sold_at: Some(Utc::now() - Duration::days((30 - n * 7) as i64)),
                })
                .await?;
            owed += sale.sale.final_total_cents;
            sales += 1;
        }

        // Pay nothing, part, all, or more than owed.
        let amount_cents = match seed % 4 {
            0 => 0,
            1 => owed / 2,
            2 => owed,
            _ => owed + 1500,
        };
        if amount_cents > 0 {
            ledger
                .apply_payment(&NewPayment {
                    client_id: client.id.clone(),
                    amount_cents,
                })
                .await?;
            payments += 1;
        }
    }
    println!("✓ Created {} clients with {} credit sales", clients, sales);
    println!("✓ Applied {} payments", payments);

    for (n, product) in catalogue.iter().enumerate().take(5) {
        ledger
            .create_sale(&NewSale {
                client_id: None,
                sale_type: SaleType::Cash,
                items: vec![NewSaleItem {
                    product_id: product.id.clone(),
                    quantity: 1 + n as i64,
                    unit_price_cents: None,
                }],
                adjustment_cents: 0,
                sold_at: None,
            })
            .await?;
    }
    println!("✓ Created 5 cash sales");

    let summary = db.reports().ledger_summary().await?;
    println!();
    println!("Ledger summary:");
    println!("  Sales:        {}", summary.sale_count);
    println!("  Outstanding:  {}", tally_core::Money::from_cents(summary.outstanding_cents));
    println!("  Client credit:{}", tally_core::Money::from_cents(summary.client_credit_cents));
    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}
