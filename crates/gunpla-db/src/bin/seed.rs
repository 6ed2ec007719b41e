//! # Seed Data Generator
//!
//! Populates the database with a Gunpla catalog for development.
//!
//! ## Usage
//! ```bash
//! # Generate 60 products (default)
//! cargo run -p gunpla-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p gunpla-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p gunpla-db --bin seed -- --db ./data/gunpla.db
//! ```
//!
//! ## Generated Products
//! One category per grade (HG, RG, MG, PG, SD). Each product is a kit
//! name plus a variant, priced from the grade's base price, with two
//! placeholder images.

use std::env;

use gunpla_core::{NewImage, NewProduct, ProductFilter};
use gunpla_db::{Database, DbConfig};
use uuid::Uuid;

/// Grade title and base price in cents.
const GRADES: &[(&str, i64)] = &[
    ("HG", 1500),
    ("RG", 3000),
    ("MG", 5000),
    ("PG", 25000),
    ("SD", 800),
];

const KITS: &[&str] = &[
    "RX-78-2 Gundam",
    "Zaku II",
    "Char's Zaku II",
    "Gouf",
    "Dom",
    "Gelgoog",
    "Zeta Gundam",
    "Hyaku Shiki",
    "ZZ Gundam",
    "Nu Gundam",
    "Sazabi",
    "Sinanju",
    "Unicorn Gundam",
    "Banshee",
    "Strike Freedom",
    "Justice Gundam",
    "Exia",
    "00 Raiser",
    "Barbatos",
    "Aerial",
];

const VARIANTS: &[(&str, i64)] = &[
    ("", 0),
    ("Ver. Ka", 1200),
    ("Titanium Finish", 2500),
    ("Clear Color", 600),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./gunpla_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
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
                println!("Gunpla Shop Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./gunpla_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Gunpla Shop Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let (_, existing) = db.products().find_many(&ProductFilter::default()).await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let titles: Vec<String> = GRADES.iter().map(|(t, _)| t.to_string()).collect();
    let categories = db.categories().insert(&titles).await?;
    println!("✓ Created {} categories", categories.len());

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category, (grade, base_price)) in categories.iter().zip(GRADES) {
        for kit in KITS {
            for (variant, addon) in VARIANTS {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(grade, kit, variant, base_price + addon, category.id);
                if let Err(e) = db.products().insert(product).await {
                    eprintln!("Failed to insert {} {}: {}", grade, kit, e);
                    continue;
                }

                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("Verifying search...");
    let filter = ProductFilter {
        search: Some("zaku".to_string()),
        ..Default::default()
    };
    let (_, total) = db.products().find_many(&filter).await?;
    println!("  Search 'zaku': {} results", total);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one kit listing with two placeholder images.
fn generate_product(grade: &str, kit: &str, variant: &str, price_cents: i64, category_id: i64) -> NewProduct {
    let title = if variant.is_empty() {
        format!("{} {}", grade, kit)
    } else {
        format!("{} {} {}", grade, kit, variant)
    };

    let images = ["box", "runner"]
        .iter()
        .map(|kind| {
            let filename = format!("{}-{}.jpg", Uuid::new_v4(), kind);
            NewImage {
                url: format!("/images/products/{}", filename),
                filename,
            }
        })
        .collect();

    NewProduct {
        description: format!("{} {} plastic model kit", grade, kit),
        title,
        price_cents,
        category_id,
        images,
    }
}
