//! Indicator import from the operations spreadsheet export.
//!
//! Rows are matched to negotiators by cédula and checked against the KPI
//! catalog bounds. Unknown cédulas and out-of-bounds rows are reported and
//! skipped; the rest are upserted as one batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use sqlx::PgPool;
use vg360_core::{IndicatorImportRow, IndicatorSnapshot, KpiDefinition};

/// Sub-commands available under `indicators`.
#[derive(Debug, Subcommand)]
pub enum IndicatorCommands {
    /// Import indicator snapshots from a CSV file
    Import {
        /// Path to a CSV with `cedula,date,` and indicator columns
        path: PathBuf,
        /// Validate and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

/// Outcome of matching import rows against known negotiators.
#[derive(Debug, Default)]
struct ImportPlan {
    snapshots: Vec<IndicatorSnapshot>,
    unknown: Vec<String>,
    invalid: Vec<(String, String)>,
    blank: usize,
}

fn plan_import(
    rows: Vec<IndicatorImportRow>,
    negotiators: &HashMap<String, i64>,
    catalog: &[KpiDefinition],
) -> ImportPlan {
    let mut plan = ImportPlan::default();
    for row in rows {
        let Some(&negotiator_id) = negotiators.get(row.cedula.as_str()) else {
            plan.unknown.push(row.cedula);
            continue;
        };
        if let Err(e) = row.validate(catalog) {
            plan.invalid.push((row.cedula, e.to_string()));
            continue;
        }
        let snapshot = row.into_snapshot(negotiator_id);
        if snapshot.is_blank() {
            plan.blank += 1;
            continue;
        }
        plan.snapshots.push(snapshot);
    }
    plan
}

/// Import indicator snapshots from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a database
/// call fails.
pub(crate) async fn run_import(pool: &PgPool, path: &Path, dry_run: bool) -> anyhow::Result<()> {
    let file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {e}", path.display()))?;
    let rows = vg360_core::parse_indicator_csv(file)?;
    let total = rows.len();

    let negotiators: HashMap<String, i64> = vg360_db::list_negotiators(pool)
        .await?
        .into_iter()
        .map(|n| (n.cedula, n.id))
        .collect();
    let catalog: Vec<KpiDefinition> = vg360_db::list_kpis(pool)
        .await?
        .iter()
        .filter_map(|row| row.to_definition().ok())
        .collect();

    let plan = plan_import(rows, &negotiators, &catalog);
    for cedula in &plan.unknown {
        tracing::warn!(%cedula, "skipping row for unknown negotiator");
    }
    for (cedula, reason) in &plan.invalid {
        tracing::warn!(%cedula, %reason, "skipping row with out-of-bounds value");
    }

    println!(
        "{total} row(s) read: {} valid, {} unknown negotiator, {} invalid, {} blank",
        plan.snapshots.len(),
        plan.unknown.len(),
        plan.invalid.len(),
        plan.blank
    );

    if dry_run {
        println!("[dry-run] no snapshots written");
        return Ok(());
    }

    let written = vg360_db::upsert_indicator_snapshots(pool, &plan.snapshots).await?;
    tracing::info!(written, path = %path.display(), "indicator import complete");
    println!("upserted {written} snapshot(s)");
    Ok(())
}
