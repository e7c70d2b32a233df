//! Init command and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use savor_core::db::Database;

/// Open the database, running migrations
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Analyze spreadsheets: savor analyze sales.csv --restaurant \"Joe's\" --save");
    println!("  2. Start the API server: savor serve");

    Ok(())
}
