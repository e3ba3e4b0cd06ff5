//! `ztoq migrate`: runs the migration pipeline for one project.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use ztoq_clients::{DEFAULT_ZEPHYR_BASE_URL, QTestClient, ZephyrClient};
use ztoq_core::{Phase, ResumeGranularity};
use ztoq_migration::MigrationFacade;

use crate::{ConfigOverrides, db_label, load_config, open_store};

#[derive(Args)]
pub(crate) struct MigrateArgs {
    /// Zephyr Scale project key.
    pub project: String,

    /// Run a single phase instead of the whole pipeline.
    #[arg(short, long)]
    pub phase: Option<Phase>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Where a failed batch restarts: `item` (after the processed prefix) or `batch`.
    #[arg(long)]
    pub resume_granularity: Option<ResumeGranularity>,

    #[arg(long, env = "ZEPHYR_BASE_URL", default_value = DEFAULT_ZEPHYR_BASE_URL)]
    pub zephyr_url: String,

    #[arg(long, env = "ZEPHYR_API_TOKEN", hide_env_values = true)]
    pub zephyr_token: String,

    #[arg(long, env = "QTEST_BASE_URL")]
    pub qtest_url: String,

    #[arg(long, env = "QTEST_API_TOKEN", hide_env_values = true)]
    pub qtest_token: String,

    #[arg(long, env = "QTEST_PROJECT_ID")]
    pub qtest_project_id: i64,
}

pub(crate) async fn run(args: MigrateArgs, database_url: Option<String>) -> Result<()> {
    let config = load_config(ConfigOverrides {
        database_url,
        batch_size: args.batch_size,
        max_workers: args.max_workers,
        resume_granularity: args.resume_granularity,
    })?;
    let store = open_store(&config).await?;

    let source = ZephyrClient::new(&args.zephyr_url, args.zephyr_token)
        .context("failed to build Zephyr client")?;
    let target = QTestClient::new(&args.qtest_url, args.qtest_token, args.qtest_project_id)
        .context("failed to build qTest client")?;

    tracing::info!(
        project_key = %args.project,
        store = %db_label(&config),
        batch_size = config.batch_size,
        max_workers = config.max_workers,
        resume_granularity = %config.resume_granularity,
        "starting migration"
    );
    let facade =
        MigrationFacade::new(&args.project, &config, store, Arc::new(source), Arc::new(target))?;

    let output = match args.phase {
        Some(phase) => serde_json::to_string_pretty(&facade.run_phase(phase).await?)?,
        None => serde_json::to_string_pretty(&facade.run_migration().await?)?,
    };
    println!("{output}");
    Ok(())
}
