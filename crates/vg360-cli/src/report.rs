//! Read-only reporting command handlers for the CLI.
//!
//! `leaders` prints the administrator summary table, `export` writes it as
//! CSV, and `evaluation` prints a negotiator's latest evaluation document.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Subcommand};
use sqlx::PgPool;
use vg360_core::{
    days_before, hacer_score_since, leader_summary, resolve_range, sort_rows,
    write_leader_summary_csv, AppConfig, DateRange, EvaluationReport, LeaderSummaryOptions,
    LeaderSummaryRow, RangeQuery, ReportKpi, ScoreBreakdown, SortDirection, SortField,
};

/// Date range selectors shared by the summary commands.
///
/// Explicit dates win over year/half; with nothing set the current year's
/// first half is used.
#[derive(Debug, Default, Args)]
pub struct RangeArgs {
    /// Range start (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// Range end (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to: Option<String>,
    /// Calendar year for a half-year range
    #[arg(long)]
    pub year: Option<String>,
    /// Half of the year: 1 (Jan-Jun) or 2 (Jul-Dec)
    #[arg(long)]
    pub half: Option<String>,
}

impl RangeArgs {
    fn resolve(&self) -> DateRange {
        resolve_range(
            &RangeQuery {
                desde: self.from.clone(),
                hasta: self.to.clone(),
                anio: self.year.clone(),
                semestre: self.half.clone(),
            },
            Utc::now().date_naive(),
        )
    }
}

/// Sub-commands available under `report`.
#[derive(Debug, Subcommand)]
pub enum ReportCommands {
    /// Print the per-leader indicator summary
    Leaders {
        #[command(flatten)]
        range: RangeArgs,
        /// Sort column (e.g. desempeno, avg_caidas, cumplimiento)
        #[arg(long)]
        sort: Option<String>,
        /// Sort direction: asc or desc
        #[arg(long)]
        dir: Option<String>,
        /// Include leaders without data in range
        #[arg(long)]
        include_empty: bool,
    },
    /// Write the per-leader summary as CSV
    Export {
        #[command(flatten)]
        range: RangeArgs,
        /// Output file (defaults to resumen_lideres_<start>_<end>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the latest evaluation document for a negotiator
    Evaluation {
        /// Negotiator cédula
        #[arg(long)]
        negotiator: String,
    },
}

/// Dispatch a `report` sub-command.
///
/// # Errors
///
/// Returns an error if a database call or the file write fails.
pub(crate) async fn run(
    pool: &PgPool,
    config: &AppConfig,
    command: ReportCommands,
) -> anyhow::Result<()> {
    match command {
        ReportCommands::Leaders {
            range,
            sort,
            dir,
            include_empty,
        } => {
            let range = range.resolve();
            let sort = SortField::parse_lenient(sort.as_deref());
            let dir = SortDirection::parse_lenient(dir.as_deref());
            let rows = summary_rows(pool, config, range, include_empty, sort, dir).await?;
            print_leader_table(range, &rows);
        }
        ReportCommands::Export { range, out } => {
            let range = range.resolve();
            let rows = summary_rows(
                pool,
                config,
                range,
                false,
                SortField::Desempeno,
                SortDirection::Desc,
            )
            .await?;
            let path = out
                .unwrap_or_else(|| PathBuf::from(format!("resumen_lideres_{}.csv", range.slug())));
            let file = std::fs::File::create(&path)
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", path.display()))?;
            write_leader_summary_csv(&rows, file)?;
            println!("wrote {} leader row(s) to {}", rows.len(), path.display());
        }
        ReportCommands::Evaluation { negotiator } => run_evaluation(pool, &negotiator).await?,
    }
    Ok(())
}

async fn summary_rows(
    pool: &PgPool,
    config: &AppConfig,
    range: DateRange,
    include_empty: bool,
    sort: SortField,
    dir: SortDirection,
) -> anyhow::Result<Vec<LeaderSummaryRow>> {
    let inputs = vg360_db::load_leader_summary_inputs(pool, range).await?;
    let mut rows = leader_summary(
        &inputs.leaders,
        &inputs.negotiators,
        &inputs.snapshots,
        &inputs.evaluated,
        range,
        &LeaderSummaryOptions {
            include_without_data: include_empty,
            compliance_target_pct: config.scoring.compliance_target_pct,
        },
    );
    sort_rows(&mut rows, sort, dir);
    Ok(rows)
}

/// Format an optional score for display, returning `"—"` when `None`.
fn fmt_score(value: Option<f64>) -> String {
    value.map_or_else(|| "\u{2014}".to_string(), |v| format!("{v:.2}"))
}

fn print_leader_table(range: DateRange, rows: &[LeaderSummaryRow]) {
    println!("Leader summary {} .. {}", range.start, range.end);
    if rows.is_empty() {
        println!("No leaders with indicator data in range.");
        return;
    }
    println!(
        "{:<12} {:<28} {:>5} {:>10} {:>10} {:>10} {:>9}",
        "CEDULA", "LEADER", "NEG", "CONV %", "CAIDAS %", "DESEMP.", "CUMPL. %"
    );
    for row in rows {
        let flag = if row.compliance.below_target { " !" } else { "" };
        println!(
            "{:<12} {:<28} {:>5} {:>10} {:>10} {:>10} {:>9}{flag}",
            row.leader.cedula,
            row.leader.name,
            row.negotiators_with_data,
            fmt_score(row.averages.avg_conversion),
            fmt_score(row.averages.avg_caidas),
            fmt_score(row.desempeno),
            fmt_score(row.compliance.completion_pct),
        );
    }
}

async fn run_evaluation(pool: &PgPool, cedula: &str) -> anyhow::Result<()> {
    let negotiator = vg360_db::get_negotiator_by_cedula(pool, cedula)
        .await?
        .ok_or_else(|| anyhow::anyhow!("negotiator '{cedula}' not found"))?;
    let evaluation = vg360_db::get_last_evaluation(pool, negotiator.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("negotiator '{cedula}' has no evaluations yet"))?;

    let kpis = vg360_db::list_evaluation_kpis(pool, evaluation.id)
        .await?
        .into_iter()
        .map(|k| ReportKpi {
            name: k.kpi_name,
            value: k.score,
        })
        .collect();
    let ser = vg360_db::get_last_ser_evaluation(pool, negotiator.id)
        .await?
        .map(|row| row.average());
    let leader = vg360_db::list_leaders(pool)
        .await?
        .into_iter()
        .find(|u| u.id == negotiator.leader_id);
    let (leader_name, leader_email) =
        leader.map_or_else(|| (String::new(), String::new()), |u| (u.full_name(), u.email));

    let report = EvaluationReport {
        negotiator_name: negotiator.name,
        negotiator_cedula: negotiator.cedula,
        leader_name,
        leader_email,
        evaluated_at: evaluation.created_at,
        kpis,
        scores: ScoreBreakdown::new(evaluation.overall_score, ser),
        feedback: Some(evaluation.feedback).filter(|f| !f.trim().is_empty()),
    };
    print!("{}", report.to_text());
    Ok(())
}

/// Print the current score breakdown for one negotiator.
///
/// # Errors
///
/// Returns an error if the negotiator does not exist or a query fails.
pub(crate) async fn run_score(pool: &PgPool, cedula: &str, days: u32) -> anyhow::Result<()> {
    let negotiator = vg360_db::get_negotiator_by_cedula(pool, cedula)
        .await?
        .ok_or_else(|| anyhow::anyhow!("negotiator '{cedula}' not found"))?;

    let today = Utc::now().date_naive();
    let since = days_before(today, days);
    let snapshots =
        vg360_db::list_snapshots_for_negotiator_since(pool, negotiator.id, since).await?;
    let hacer = hacer_score_since(&snapshots, today, days);
    let ser = vg360_db::get_last_ser_evaluation(pool, negotiator.id)
        .await?
        .map(|row| row.average());
    let scores = ScoreBreakdown::new(hacer, ser);

    println!("{} ({})", negotiator.name, negotiator.cedula);
    println!("{:<24} {}", "Snapshots", snapshots.len());
    println!("{:<24} {}", format!("Hacer ({days}d)"), fmt_score(scores.hacer));
    println!("{:<24} {}", "Ser", fmt_score(scores.ser));
    println!("{:<24} {}", "Total (70/30)", fmt_score(scores.total));
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn fmt_score_uses_dash_for_missing() {
        assert_eq!(fmt_score(None), "\u{2014}");
        assert_eq!(fmt_score(Some(42.256)), "42.26");
    }

    #[test]
    fn explicit_range_args_resolve_inclusive_dates() {
        let args = RangeArgs {
            from: Some("2025-01-01".to_string()),
            to: Some("2025-03-31".to_string()),
            ..RangeArgs::default()
        };
        let range = args.resolve();
        assert_eq!(range.slug(), "2025-01-01_2025-03-31");
    }

    #[test]
    fn second_half_of_year_resolves_to_july_through_december() {
        let args = RangeArgs {
            year: Some("2024".to_string()),
            half: Some("2".to_string()),
            ..RangeArgs::default()
        };
        let range = args.resolve();
        assert_eq!((range.start.month(), range.start.day()), (7, 1));
        assert_eq!((range.end.month(), range.end.day()), (12, 31));
        assert_eq!(range.end.year(), 2024);
    }
}
