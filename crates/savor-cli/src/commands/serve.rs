//! Server command implementation

use std::path::Path;

use anyhow::Result;
use savor_core::store::LocalStore;

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    files_dir: &Path,
) -> Result<()> {
    println!("🚀 Starting Savor web server...");
    println!("   Database: {}", db_path.display());
    println!("   Files: {}", files_dir.display());
    println!("   Listening: http://{}:{}", host, port);

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: identity provider header required");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;
    let store = LocalStore::new(files_dir);

    let config = savor_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins: std::env::var("SAVOR_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    };

    savor_server::serve(db, store, host, port, config).await?;

    Ok(())
}
