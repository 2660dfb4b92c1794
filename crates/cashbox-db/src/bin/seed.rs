//! # Directory Seed
//!
//! Populates the terminal/user directory for development and demos.
//!
//! ## Usage
//! ```bash
//! # Two stores with three registers each (default)
//! cargo run -p cashbox-db --bin seed
//!
//! # Custom layout
//! cargo run -p cashbox-db --bin seed -- --locations 4 --terminals 2
//!
//! # Specify database path
//! cargo run -p cashbox-db --bin seed -- --db ./data/cashbox.db
//! ```
//!
//! ## Generated Records
//! - Terminals `term-{store}-{n}` named "Caja {n}" at location `store-{store}`,
//!   all CLOSED
//! - One cashier per terminal (`cashier-{store}-{n}`)
//! - One manager per store (`manager-{store}`) for forced-close authorization

use chrono::Utc;
use std::env;

use cashbox_core::{Terminal, TerminalStatus, User};
use cashbox_db::{Database, DbConfig};

/// Cashier first names, cycled.
const CASHIER_NAMES: &[&str] = &[
    "Ana", "Luis", "Carmen", "Diego", "Elena", "Pablo", "Rosa", "Tomas", "Lucia", "Jorge",
];

const MANAGER_NAMES: &[&str] = &["Marta", "Ricardo", "Isabel", "Hector"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut locations: usize = 2;
    let mut terminals: usize = 3;
    let mut db_path = String::from("./cashbox_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--locations" | "-l" => {
                if i + 1 < args.len() {
                    locations = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--terminals" | "-t" => {
                if i + 1 < args.len() {
                    terminals = args[i + 1].parse()?;
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
                println!("Cashbox Directory Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -l, --locations <N>  Number of stores (default: 2)");
                println!("  -t, --terminals <N>  Registers per store (default: 3)");
                println!("  -d, --db <PATH>      Database file path (default: ./cashbox_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cashbox Directory Seed");
    println!("=========================");
    println!("Database:  {}", db_path);
    println!("Stores:    {}", locations);
    println!("Registers: {} per store", terminals);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut uow = db.begin().await?;

    let existing = uow.terminals().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} terminals", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut cashier_index = 0;

    for store in 1..=locations {
        let location_id = format!("store-{store}");
        let manager = User {
            id: format!("manager-{store}"),
            name: format!("{} (manager)", MANAGER_NAMES[(store - 1) % MANAGER_NAMES.len()]),
        };
        uow.users().insert(&manager).await?;
        println!("  + {:<16} {}", manager.id, manager.name);

        for n in 1..=terminals {
            let cashier = User {
                id: format!("cashier-{store}-{n}"),
                name: CASHIER_NAMES[cashier_index % CASHIER_NAMES.len()].to_string(),
            };
            cashier_index += 1;
            uow.users().insert(&cashier).await?;

            let terminal = Terminal {
                id: format!("term-{store}-{n}"),
                name: format!("Caja {n}"),
                location_id: location_id.clone(),
                status: TerminalStatus::Closed,
                current_cashier_id: None,
                updated_at: now,
            };
            uow.terminals().insert(&terminal).await?;

            println!(
                "  + {:<16} {} @ {} (cashier {})",
                terminal.id, terminal.name, location_id, cashier.id
            );
        }
    }

    uow.commit().await?;

    println!();
    println!(
        "✓ Seeded {} terminals and {} users",
        locations * terminals,
        locations * (terminals + 1)
    );

    db.close().await;
    Ok(())
}
