use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ztoq_core::{
    DatabaseConfig, ENV_DATABASE_URL, EntityType, MappingType, MigrationConfig, ResumeGranularity,
};
use ztoq_storage::{StateStore, StorageBackend};

mod commands;

#[derive(Parser)]
#[command(name = "ztoq")]
#[command(about = "Resumable migration of Zephyr Scale test data into qTest", long_about = None)]
struct Cli {
    /// State store location: `sqlite:<path>` or a `postgres://` URL.
    #[arg(long, global = true, env = ENV_DATABASE_URL)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all phases, or one with --phase, for a project.
    Migrate(commands::migrate::MigrateArgs),
    /// Phase statuses for one project, or every project.
    Status { project: Option<String> },
    /// Batch checkpoints of a project.
    Batches {
        project: String,
        #[arg(short = 't', long)]
        entity_type: Option<EntityType>,
    },
    /// Source-to-target id mappings recorded while loading.
    Mappings {
        project: String,
        #[arg(short = 't', long)]
        mapping_type: Option<MappingType>,
    },
}

/// Overrides applied on top of `ZTOQ_*` environment configuration.
#[derive(Debug, Default)]
pub(crate) struct ConfigOverrides {
    pub database_url: Option<String>,
    pub batch_size: Option<usize>,
    pub max_workers: Option<usize>,
    pub resume_granularity: Option<ResumeGranularity>,
}

pub(crate) fn load_config(overrides: ConfigOverrides) -> Result<MigrationConfig> {
    let mut config = MigrationConfig::from_env()?;
    if let Some(url) = overrides.database_url {
        let pool_size = match config.database {
            DatabaseConfig::Sqlite { pool_size, .. } => pool_size,
            DatabaseConfig::Postgres { .. } => ztoq_core::DEFAULT_DB_POOL_SIZE,
        };
        config.database = DatabaseConfig::parse(&url, pool_size)?;
    }
    if let Some(batch_size) = overrides.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(max_workers) = overrides.max_workers {
        config.max_workers = max_workers;
    }
    if let Some(granularity) = overrides.resume_granularity {
        config.resume_granularity = granularity;
    }
    config.validate()?;
    Ok(config)
}

pub(crate) async fn open_store(config: &MigrationConfig) -> Result<Arc<dyn StateStore>> {
    let backend = StorageBackend::connect(&config.database).await?;
    tracing::debug!(backend = backend.kind(), "state store opened");
    Ok(Arc::new(backend))
}

pub(crate) fn db_label(config: &MigrationConfig) -> String {
    match &config.database {
        DatabaseConfig::Sqlite { path, .. } => path.display().to_string(),
        DatabaseConfig::Postgres { .. } => "postgres".to_owned(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let database_url = cli.database_url;

    match cli.command {
        Commands::Migrate(args) => commands::migrate::run(args, database_url).await?,
        Commands::Status { project } => {
            commands::inspect::run_status(database_url, project.as_deref()).await?;
        },
        Commands::Batches { project, entity_type } => {
            commands::inspect::run_batches(database_url, &project, entity_type).await?;
        },
        Commands::Mappings { project, mapping_type } => {
            commands::inspect::run_mappings(database_url, &project, mapping_type).await?;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use ztoq_core::Phase;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn phase_flag_accepts_short_names() {
        let cli = Cli::try_parse_from([
            "ztoq", "migrate", "DEMO", "--phase", "load", "--zephyr-token", "z", "--qtest-url",
            "https://q.example", "--qtest-token", "q", "--qtest-project-id", "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Migrate(args) => assert_eq!(args.phase, Some(Phase::Loading)),
            _ => panic!("expected migrate"),
        }
    }
}
