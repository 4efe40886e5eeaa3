use std::path::Path;
use std::sync::Arc;

use testingx_migrations::{DirFs, MigrationFs, MigrationParams, Migrations, FS};

async fn open(database_url: &str, dir: Option<&Path>, path: &str) -> anyhow::Result<Migrations> {
    let fs: Arc<dyn MigrationFs> = match dir {
        Some(dir) => Arc::new(DirFs::new(dir)),
        None => Arc::new(FS),
    };
    Ok(Migrations::new(MigrationParams::new(fs, path, database_url)).await?)
}

pub async fn up(database_url: &str, dir: Option<&Path>, path: &str) -> anyhow::Result<()> {
    let migrations = open(database_url, dir, path).await?;
    migrations.up().await?;
    migrations.close().await;
    println!("Migrations applied");
    Ok(())
}

pub async fn down(database_url: &str, dir: Option<&Path>, path: &str) -> anyhow::Result<()> {
    let migrations = open(database_url, dir, path).await?;
    migrations.down().await?;
    migrations.close().await;
    println!("Migrations reverted");
    Ok(())
}

pub async fn status(database_url: &str, dir: Option<&Path>, path: &str, json: bool) -> anyhow::Result<()> {
    let migrations = open(database_url, dir, path).await?;
    let status = migrations.status().await?;
    migrations.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if status.is_empty() {
        println!("No migrations found");
        return Ok(());
    }

    println!("Migration Status:");
    for migration in status {
        let state = if migration.applied { "applied" } else { "pending" };
        println!("  {:>8}  {:<8}  {}", migration.version, state, migration.description);
    }
    Ok(())
}
