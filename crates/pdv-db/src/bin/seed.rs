//! # Seed Data Generator
//!
//! Populates the database with demo products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p pdv-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p pdv-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p pdv-db --bin seed -- --db ./data/pdv.db
//! ```
//!
//! Each product gets a valid EAN-13 barcode with the 789 prefix, a price
//! between R$ 1,99 and R$ 9,99 plus a size surcharge, and stock 0-100.
//! Products are grouped by category.

use std::env;
use std::sync::Arc;

use pdv_core::{GroupBook, Inventory, ProductInput};
use pdv_db::{Database, DbConfig};

/// Product categories for realistic demo data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Bebidas",
        &[
            "Refrigerante Cola",
            "Refrigerante Guaraná",
            "Água Mineral",
            "Suco de Laranja",
            "Suco de Uva",
            "Chá Gelado",
            "Energético",
            "Cerveja Pilsen",
        ],
    ),
    (
        "Mercearia",
        &[
            "Arroz Branco",
            "Feijão Carioca",
            "Feijão Preto",
            "Macarrão Espaguete",
            "Farinha de Trigo",
            "Açúcar Refinado",
            "Café Torrado",
            "Óleo de Soja",
        ],
    ),
    (
        "Laticínios",
        &[
            "Leite Integral",
            "Leite Desnatado",
            "Queijo Mussarela",
            "Manteiga",
            "Iogurte Natural",
            "Requeijão",
            "Creme de Leite",
        ],
    ),
    (
        "Limpeza",
        &[
            "Detergente",
            "Sabão em Pó",
            "Água Sanitária",
            "Desinfetante",
            "Esponja",
            "Amaciante",
        ],
    ),
];

/// Size variants and their price surcharge in cents
const SIZES: &[(&str, i64)] = &[
    ("200ml", 0),
    ("500g", 50),
    ("1kg", 150),
    ("2L", 200),
    ("5kg", 900),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./pdv_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("PDV Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./pdv_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 PDV Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let store = Arc::new(db.collections());
    let inventory = Inventory::new(Arc::clone(&store));
    let groups = GroupBook::new(store);

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = inventory.list().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (group, names) in CATEGORIES {
        groups.ensure(group).await?;

        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, surcharge)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = generated * 31 + name_idx * 7 + size_idx;
                let input = demo_product(group, name, size, *surcharge, seed);
                if let Err(e) = inventory.upsert(input).await {
                    eprintln!("Failed to insert {} {}: {}", name, size, e);
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
    let results = inventory.search("feijao", 10).await?;
    println!("  Search 'feijao': {} results", results.len());
    let results = inventory.search("refrigerante", 10).await?;
    println!("  Search 'refrigerante': {} results", results.len());

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one demo product. Barcodes are generated by the inventory.
fn demo_product(group: &str, name: &str, size: &str, surcharge: i64, seed: usize) -> ProductInput {
    let base_price = 199 + ((seed * 17) % 800) as i64;
    let stock = (seed % 101) as i64;

    ProductInput::new(format!("{} {}", name, size), base_price + surcharge, stock).with_group(group)
}
