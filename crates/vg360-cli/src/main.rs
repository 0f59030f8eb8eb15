mod db;
mod indicators;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;
use crate::indicators::IndicatorCommands;
use crate::report::ReportCommands;

#[derive(Debug, Parser)]
#[command(name = "vg360")]
#[command(about = "VG360 negotiator performance command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance and seeding
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Indicator snapshot import
    Indicators {
        #[command(subcommand)]
        command: IndicatorCommands,
    },
    /// Leader summaries and evaluation reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Print the Hacer, Ser and total scores for one negotiator
    Score {
        /// Negotiator cédula
        #[arg(long)]
        negotiator: String,
        /// Hacer lookback in days (defaults to the configured lookback)
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("vg360 ready; run `vg360 --help` for commands");
        return Ok(());
    };

    let config = vg360_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = vg360_db::PoolConfig::from_app_config(&config);
    let pool = vg360_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => db::run(&pool, &config, command).await,
        Commands::Indicators { command } => match command {
            IndicatorCommands::Import { path, dry_run } => {
                indicators::run_import(&pool, &path, dry_run).await
            }
        },
        Commands::Report { command } => report::run(&pool, &config, command).await,
        Commands::Score { negotiator, days } => {
            let days = days
                .filter(|d| *d > 0)
                .unwrap_or(config.scoring.hacer_lookback_days);
            report::run_score(&pool, &negotiator, days).await
        }
    }
}

#[cfg(test)]
mod tests;
