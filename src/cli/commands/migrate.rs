use anyhow::{bail, Context};

use crate::config::{self, StorageBackend};
use crate::database::DatabaseManager;

pub async fn handle() -> anyhow::Result<()> {
    let config = config::config();
    if config.database.backend != StorageBackend::MySql {
        bail!("migrations only apply to the MySQL storage backend");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    DatabaseManager::migrate(&pool)
        .await
        .context("failed to apply migrations")?;

    println!("Migrations applied");
    Ok(())
}
