//! Database maintenance command handlers.

use chrono::Utc;
use clap::Subcommand;
use sqlx::PgPool;
use vg360_core::AppConfig;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Load the KPI catalog from the configured YAML file into the database
    SeedKpis,
    /// Insert demo leaders, negotiators, snapshots and evaluations
    SeedDemo,
}

/// Dispatch a `db` sub-command.
///
/// # Errors
///
/// Returns an error if the database call or the KPI catalog load fails.
pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            vg360_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = vg360_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::SeedKpis => run_seed_kpis(pool, config).await?,
        DbCommands::SeedDemo => {
            let mut rng = rand::rng();
            let summary = vg360_db::seed_demo(pool, &mut rng, Utc::now().date_naive()).await?;
            println!(
                "seeded {} users, {} negotiators, {} snapshots, {} evaluations, {} ser evaluations",
                summary.users,
                summary.negotiators,
                summary.snapshots,
                summary.evaluations,
                summary.ser_evaluations
            );
        }
    }
    Ok(())
}

async fn run_seed_kpis(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let file = vg360_core::load_kpis(&config.kpis_path)?;
    let count = vg360_db::seed_kpis(pool, &file.kpis).await?;
    tracing::info!(count, path = %config.kpis_path.display(), "KPI catalog seeded");
    println!("seeded {count} KPI definition(s)");
    Ok(())
}
