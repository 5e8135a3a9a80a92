use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::{debug, info, instrument};

/// Creates or upgrades the UMS schema and reports what was applied.
#[instrument]
pub async fn init_database(database_url: &str) -> Result<()> {
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("cannot open database {}", database_url))?;

    let pending = Migrator::get_pending_migrations(&db).await?;
    if pending.is_empty() {
        info!("Schema is up to date, nothing to apply");
        return Ok(());
    }
    for migration in &pending {
        debug!("Pending migration {}", migration.name());
    }

    Migrator::up(&db, None)
        .await
        .context("schema migration failed")?;
    info!("Applied {} migrations, schema ready for students and ledgers", pending.len());
    Ok(())
}
