//! # Migration Runner
//!
//! Applies pending schema migrations to the configured database.
//!
//! ## Usage
//! ```bash
//! DATABASE_PATH=./data/gunpla.db cargo run -p gunpla-service --bin migrate
//!
//! # Only report status
//! cargo run -p gunpla-service --bin migrate -- --status
//! ```

use std::env;

use anyhow::Context;
use gunpla_db::{migrations, Database};
use gunpla_service::{logging, ShopConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let status_only = env::args().skip(1).any(|arg| arg == "--status" || arg == "-s");

    let config = ShopConfig::load().context("loading configuration")?;
    info!(path = %config.database_path.display(), "Opening database");

    let db = Database::new(config.db_config().run_migrations(false))
        .await
        .context("opening database")?;

    if !status_only {
        db.run_migrations().await.context("running migrations")?;
    }

    let (total, applied) = migrations::migration_status(db.pool())
        .await
        .context("reading migration status")?;
    info!(total, applied, "Migration status");
    println!("Migrations applied: {}/{}", applied, total);

    db.close().await;
    Ok(())
}
