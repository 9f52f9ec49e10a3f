//! Standalone migration runner for the ad ledger database.
//!
//! The database URL comes from `DATABASE_URL`; without it a local sqlite
//! file is created next to the working directory, matching the server's
//! default.

use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DB_URL: &str = "sqlite:./adledger.db?mode=rwc";

fn usage() -> ! {
    eprintln!("usage: migration [up|down|fresh|status]");
    eprintln!("  up      apply pending migrations (default)");
    eprintln!("  down    revert the last migration");
    eprintln!("  fresh   drop everything and re-apply from scratch");
    eprintln!("  status  list applied and pending migrations");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match command.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => migration::Migrator::down(&db, None).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        _ => usage(),
    }

    Ok(())
}
