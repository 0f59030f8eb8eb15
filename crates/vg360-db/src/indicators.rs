//! Database operations for `indicator_snapshots`.

use chrono::NaiveDate;
use sqlx::PgPool;
use vg360_core::{DateRange, IndicatorSnapshot};

use crate::DbError;

/// A row from the `indicator_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IndicatorRow {
    pub negotiator_id: i64,
    pub date: NaiveDate,
    pub conversion_de_ventas: Option<f64>,
    pub recaudacion_mensual: Option<f64>,
    pub tiempo_hablando: Option<f64>,
    pub porcentajes_cumplimiento_recaudo: Option<f64>,
    pub porcentaje_cumplimiento_conversion: Option<f64>,
    pub porcentaje_caidas_acuerdos: Option<f64>,
}

impl From<IndicatorRow> for IndicatorSnapshot {
    fn from(row: IndicatorRow) -> Self {
        IndicatorSnapshot {
            negotiator_id: row.negotiator_id,
            date: row.date,
            conversion_de_ventas: row.conversion_de_ventas,
            recaudacion_mensual: row.recaudacion_mensual,
            tiempo_hablando: row.tiempo_hablando,
            porcentajes_cumplimiento_recaudo: row.porcentajes_cumplimiento_recaudo,
            porcentaje_cumplimiento_conversion: row.porcentaje_cumplimiento_conversion,
            porcentaje_caidas_acuerdos: row.porcentaje_caidas_acuerdos,
        }
    }
}

const SNAPSHOT_COLUMNS: &str = "negotiator_id, date, conversion_de_ventas, recaudacion_mensual, \
     tiempo_hablando, porcentajes_cumplimiento_recaudo, \
     porcentaje_cumplimiento_conversion, porcentaje_caidas_acuerdos";

/// Upsert snapshots keyed by `(negotiator_id, date)`.
///
/// All rows are written in one transaction; returns the number written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any upsert fails; nothing is committed then.
pub async fn upsert_indicator_snapshots(
    pool: &PgPool,
    snapshots: &[IndicatorSnapshot],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for snap in snapshots {
        sqlx::query(
            "INSERT INTO indicator_snapshots \
                 (negotiator_id, date, conversion_de_ventas, recaudacion_mensual, \
                  tiempo_hablando, porcentajes_cumplimiento_recaudo, \
                  porcentaje_cumplimiento_conversion, porcentaje_caidas_acuerdos) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (negotiator_id, date) DO UPDATE SET \
                 conversion_de_ventas = EXCLUDED.conversion_de_ventas, \
                 recaudacion_mensual = EXCLUDED.recaudacion_mensual, \
                 tiempo_hablando = EXCLUDED.tiempo_hablando, \
                 porcentajes_cumplimiento_recaudo = EXCLUDED.porcentajes_cumplimiento_recaudo, \
                 porcentaje_cumplimiento_conversion = EXCLUDED.porcentaje_cumplimiento_conversion, \
                 porcentaje_caidas_acuerdos = EXCLUDED.porcentaje_caidas_acuerdos, \
                 updated_at = NOW()",
        )
        .bind(snap.negotiator_id)
        .bind(snap.date)
        .bind(snap.conversion_de_ventas)
        .bind(snap.recaudacion_mensual)
        .bind(snap.tiempo_hablando)
        .bind(snap.porcentajes_cumplimiento_recaudo)
        .bind(snap.porcentaje_cumplimiento_conversion)
        .bind(snap.porcentaje_caidas_acuerdos)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(snapshots.len())
}

/// Snapshots dated inside `range`, optionally limited to some negotiators.
///
/// Ordered by date ascending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_in_range(
    pool: &PgPool,
    range: DateRange,
    negotiator_ids: Option<&[i64]>,
) -> Result<Vec<IndicatorSnapshot>, DbError> {
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM indicator_snapshots \
         WHERE date >= $1 AND date <= $2 \
           AND ($3::BIGINT[] IS NULL OR negotiator_id = ANY($3)) \
         ORDER BY date, negotiator_id"
    );
    let rows = sqlx::query_as::<_, IndicatorRow>(&sql)
        .bind(range.start)
        .bind(range.end)
        .bind(negotiator_ids)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(IndicatorSnapshot::from).collect())
}

/// One negotiator's snapshots dated on or after `since`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_for_negotiator_since(
    pool: &PgPool,
    negotiator_id: i64,
    since: NaiveDate,
) -> Result<Vec<IndicatorSnapshot>, DbError> {
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM indicator_snapshots \
         WHERE negotiator_id = $1 AND date >= $2 \
         ORDER BY date"
    );
    let rows = sqlx::query_as::<_, IndicatorRow>(&sql)
        .bind(negotiator_id)
        .bind(since)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(IndicatorSnapshot::from).collect())
}

/// The most recent snapshot for a negotiator, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_snapshot(
    pool: &PgPool,
    negotiator_id: i64,
) -> Result<Option<IndicatorSnapshot>, DbError> {
    let sql = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM indicator_snapshots \
         WHERE negotiator_id = $1 ORDER BY date DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, IndicatorRow>(&sql)
        .bind(negotiator_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(IndicatorSnapshot::from))
}
