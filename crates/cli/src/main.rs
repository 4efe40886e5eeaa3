mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::*;
use testingx_core::{init_logging, LoggingConfig};

#[derive(Parser)]
#[command(name = "testingx")]
#[command(about = "Ephemeral PostgreSQL containers for integration tests")]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a long-lived instance on a fixed host port and wait for Ctrl-C
    Debug {
        /// Host port bound to the container's 5432/tcp
        #[arg(long, default_value = testingx_database::DEFAULT_DEBUG_HOST_PORT)]
        host_port: String,
    },

    /// Run migrations against a database
    Migrate {
        #[command(subcommand)]
        migrate_command: MigrateCommands,
    },
}

#[derive(clap::Args)]
struct MigrateTarget {
    /// Connection URL of the target database
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Read scripts from this directory instead of the embedded set
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Sub-path holding the scripts
    #[arg(long, default_value = testingx_migrations::POSTGRES_PATH)]
    path: String,
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Apply all pending migrations
    Up {
        #[command(flatten)]
        target: MigrateTarget,
    },

    /// Revert all applied migrations
    Down {
        #[command(flatten)]
        target: MigrateTarget,
    },

    /// Show which migrations are applied
    Status {
        #[command(flatten)]
        target: MigrateTarget,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig::default()
        .with_level(cli.log_level.as_str())
        .with_env_filter(format!("{},sqlx=warn,bollard=warn", cli.log_level))
        .with_json(cli.log_json)
        .with_global_field("service", "testingx");
    init_logging(logging).map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Debug { host_port } => {
            debug::run(&host_port).await?;
        }
        Commands::Migrate { migrate_command } => match migrate_command {
            MigrateCommands::Up { target } => {
                migrate::up(&target.database_url, target.dir.as_deref(), &target.path).await?;
            }
            MigrateCommands::Down { target } => {
                migrate::down(&target.database_url, target.dir.as_deref(), &target.path).await?;
            }
            MigrateCommands::Status { target, json } => {
                migrate::status(&target.database_url, target.dir.as_deref(), &target.path, json)
                    .await?;
            }
        },
    }

    Ok(())
}
