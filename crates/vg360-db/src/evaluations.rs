//! Database operations for `evaluations` and `evaluation_kpis`.
//!
//! Evaluations are append-only. Creation locks the negotiator row so that
//! two concurrent submissions cannot both pass the cooldown check.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use vg360_core::{is_within_cooldown, DateRange, KpiLine};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `evaluations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EvaluationRow {
    pub id: i64,
    pub negotiator_id: i64,
    pub evaluator_id: i64,
    pub created_at: DateTime<Utc>,
    /// `None` when the negotiator had no indicator data at creation time.
    pub overall_score: Option<f64>,
    pub feedback: String,
}

/// A KPI line item joined with its definition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EvaluationKpiRow {
    pub kpi_id: i64,
    pub kpi_name: String,
    pub kpi_type: String,
    pub score: f64,
}

/// Per-negotiator evaluation history summary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EvaluationStatsRow {
    pub negotiator_id: i64,
    pub last_evaluation: Option<DateTime<Utc>>,
    pub evaluation_count: i64,
}

/// Input for [`create_evaluation`].
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub negotiator_id: i64,
    pub evaluator_id: i64,
    pub overall_score: Option<f64>,
    pub feedback: String,
    pub kpi_lines: Vec<KpiLine>,
}

// ---------------------------------------------------------------------------
// Cooldown guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub(crate) enum EvaluationTable {
    Hacer,
    Ser,
}

impl EvaluationTable {
    fn last_created_sql(self) -> &'static str {
        match self {
            EvaluationTable::Hacer => {
                "SELECT MAX(created_at) FROM evaluations WHERE negotiator_id = $1"
            }
            EvaluationTable::Ser => {
                "SELECT MAX(created_at) FROM ser_evaluations WHERE negotiator_id = $1"
            }
        }
    }
}

/// Lock the negotiator row and reject the write if the previous evaluation
/// of the same kind is younger than `cooldown_secs`.
pub(crate) async fn lock_and_check_cooldown(
    conn: &mut PgConnection,
    negotiator_id: i64,
    table: EvaluationTable,
    cooldown_secs: u64,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM negotiators WHERE id = $1 FOR UPDATE")
        .bind(negotiator_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(DbError::NotFound)?;

    let last: Option<DateTime<Utc>> = sqlx::query_scalar(table.last_created_sql())
        .bind(negotiator_id)
        .fetch_one(&mut *conn)
        .await?;

    if is_within_cooldown(last, now, cooldown_secs) {
        return Err(DbError::EvaluationCooldown {
            negotiator_id,
            cooldown_secs,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Create an evaluation and its KPI line items in one transaction.
///
/// KPI lines are matched to the catalog by name; lines whose KPI is not in
/// the `kpis` table are skipped.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the negotiator does not exist,
/// [`DbError::EvaluationCooldown`] if the previous evaluation is too recent,
/// or [`DbError::Sqlx`] on any query failure.
pub async fn create_evaluation(
    pool: &PgPool,
    new: &NewEvaluation,
    cooldown_secs: u64,
) -> Result<EvaluationRow, DbError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    lock_and_check_cooldown(
        &mut tx,
        new.negotiator_id,
        EvaluationTable::Hacer,
        cooldown_secs,
        now,
    )
    .await?;

    let row = sqlx::query_as::<_, EvaluationRow>(
        "INSERT INTO evaluations (negotiator_id, evaluator_id, created_at, overall_score, feedback) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, negotiator_id, evaluator_id, created_at, overall_score, feedback",
    )
    .bind(new.negotiator_id)
    .bind(new.evaluator_id)
    .bind(now)
    .bind(new.overall_score)
    .bind(&new.feedback)
    .fetch_one(&mut *tx)
    .await?;

    for line in &new.kpi_lines {
        sqlx::query(
            "INSERT INTO evaluation_kpis (evaluation_id, kpi_id, score) \
             SELECT $1, id, $3 FROM kpis WHERE name = $2 \
             ON CONFLICT (evaluation_id, kpi_id) DO NOTHING",
        )
        .bind(row.id)
        .bind(&line.kpi_name)
        .bind(line.score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(row)
}

/// The most recent evaluation of a negotiator, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_last_evaluation(
    pool: &PgPool,
    negotiator_id: i64,
) -> Result<Option<EvaluationRow>, DbError> {
    let row = sqlx::query_as::<_, EvaluationRow>(
        "SELECT id, negotiator_id, evaluator_id, created_at, overall_score, feedback \
         FROM evaluations WHERE negotiator_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(negotiator_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_evaluation_kpis(
    pool: &PgPool,
    evaluation_id: i64,
) -> Result<Vec<EvaluationKpiRow>, DbError> {
    let rows = sqlx::query_as::<_, EvaluationKpiRow>(
        "SELECT k.id AS kpi_id, k.name AS kpi_name, k.kpi_type, ek.score \
         FROM evaluation_kpis ek \
         JOIN kpis k ON k.id = ek.kpi_id \
         WHERE ek.evaluation_id = $1 \
         ORDER BY k.id",
    )
    .bind(evaluation_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Last evaluation time and evaluation count for every negotiator of a leader.
///
/// Negotiators never evaluated are included with a zero count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn evaluation_stats_for_leader(
    pool: &PgPool,
    leader_id: i64,
) -> Result<Vec<EvaluationStatsRow>, DbError> {
    let rows = sqlx::query_as::<_, EvaluationStatsRow>(
        "SELECT n.id AS negotiator_id, \
                MAX(e.created_at) AS last_evaluation, \
                COUNT(e.id) AS evaluation_count \
         FROM negotiators n \
         LEFT JOIN evaluations e ON e.negotiator_id = n.id \
         WHERE n.leader_id = $1 \
         GROUP BY n.id",
    )
    .bind(leader_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Ids of negotiators with at least one evaluation created inside `range`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn evaluated_negotiators_in_range(
    pool: &PgPool,
    range: DateRange,
) -> Result<HashSet<i64>, DbError> {
    let (lower, upper) = range.utc_bounds();
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT negotiator_id FROM evaluations \
         WHERE created_at >= $1 AND created_at < $2",
    )
    .bind(lower)
    .bind(upper)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}
