use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vg360_core::SerRatings;

use crate::evaluations::{lock_and_check_cooldown, EvaluationTable};
use crate::DbError;

/// A row from the `ser_evaluations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SerEvaluationRow {
    pub id: i64,
    pub negotiator_id: i64,
    pub evaluator_id: i64,
    pub created_at: DateTime<Utc>,
    pub actitud: i16,
    pub trabajo_en_equipo: i16,
    pub sentido_pertenencia: i16,
    pub relacionamiento: i16,
    pub compromiso: i16,
}

impl SerEvaluationRow {
    #[must_use]
    pub fn ratings(&self) -> SerRatings {
        SerRatings {
            actitud: self.actitud,
            trabajo_en_equipo: self.trabajo_en_equipo,
            sentido_pertenencia: self.sentido_pertenencia,
            relacionamiento: self.relacionamiento,
            compromiso: self.compromiso,
        }
    }

    /// The "promedio" of the five ratings.
    #[must_use]
    pub fn average(&self) -> f64 {
        self.ratings().average()
    }
}

const SER_COLUMNS: &str = "id, negotiator_id, evaluator_id, created_at, actitud, \
     trabajo_en_equipo, sentido_pertenencia, relacionamiento, compromiso";

/// Record a Ser evaluation, subject to the same cooldown as Hacer evaluations.
///
/// # Errors
///
/// Returns [`DbError::InvalidInput`] for ratings outside 1-5,
/// [`DbError::NotFound`] if the negotiator does not exist,
/// [`DbError::EvaluationCooldown`] if the previous one is too recent, or
/// [`DbError::Sqlx`] on any query failure.
pub async fn create_ser_evaluation(
    pool: &PgPool,
    negotiator_id: i64,
    evaluator_id: i64,
    ratings: &SerRatings,
    cooldown_secs: u64,
) -> Result<SerEvaluationRow, DbError> {
    ratings
        .validate()
        .map_err(|e| DbError::InvalidInput(e.to_string()))?;

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    lock_and_check_cooldown(
        &mut tx,
        negotiator_id,
        EvaluationTable::Ser,
        cooldown_secs,
        now,
    )
    .await?;

    let sql = format!(
        "INSERT INTO ser_evaluations \
             (negotiator_id, evaluator_id, created_at, actitud, trabajo_en_equipo, \
              sentido_pertenencia, relacionamiento, compromiso) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {SER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SerEvaluationRow>(&sql)
        .bind(negotiator_id)
        .bind(evaluator_id)
        .bind(now)
        .bind(ratings.actitud)
        .bind(ratings.trabajo_en_equipo)
        .bind(ratings.sentido_pertenencia)
        .bind(ratings.relacionamiento)
        .bind(ratings.compromiso)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_last_ser_evaluation(
    pool: &PgPool,
    negotiator_id: i64,
) -> Result<Option<SerEvaluationRow>, DbError> {
    let sql = format!(
        "SELECT {SER_COLUMNS} FROM ser_evaluations WHERE negotiator_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, SerEvaluationRow>(&sql)
        .bind(negotiator_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
