//! Database operations for `negotiators`.

use sqlx::PgPool;
use vg360_core::NegotiatorIdentity;

use crate::DbError;

/// A row from the `negotiators` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NegotiatorRow {
    pub id: i64,
    pub cedula: String,
    pub name: String,
    pub leader_id: i64,
}

impl From<NegotiatorRow> for NegotiatorIdentity {
    fn from(row: NegotiatorRow) -> Self {
        NegotiatorIdentity {
            id: row.id,
            cedula: row.cedula,
            name: row.name,
            leader_id: row.leader_id,
        }
    }
}

/// Insert a negotiator or reassign the one with the same cédula.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails (e.g. unknown leader).
pub async fn upsert_negotiator(
    pool: &PgPool,
    cedula: &str,
    name: &str,
    leader_id: i64,
) -> Result<NegotiatorRow, DbError> {
    let row = sqlx::query_as::<_, NegotiatorRow>(
        "INSERT INTO negotiators (cedula, name, leader_id) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (cedula) DO UPDATE SET \
             name = EXCLUDED.name, \
             leader_id = EXCLUDED.leader_id, \
             updated_at = NOW() \
         RETURNING id, cedula, name, leader_id",
    )
    .bind(cedula)
    .bind(name)
    .bind(leader_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_negotiator_by_cedula(
    pool: &PgPool,
    cedula: &str,
) -> Result<Option<NegotiatorRow>, DbError> {
    let row = sqlx::query_as::<_, NegotiatorRow>(
        "SELECT id, cedula, name, leader_id FROM negotiators WHERE cedula = $1",
    )
    .bind(cedula)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Look up a negotiator by cédula, scoped to one leader's team.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no negotiator with that cédula belongs to
/// `leader_id`, or [`DbError::Sqlx`] if the query fails.
pub async fn get_negotiator_for_leader(
    pool: &PgPool,
    cedula: &str,
    leader_id: i64,
) -> Result<NegotiatorRow, DbError> {
    sqlx::query_as::<_, NegotiatorRow>(
        "SELECT id, cedula, name, leader_id FROM negotiators \
         WHERE cedula = $1 AND leader_id = $2",
    )
    .bind(cedula)
    .bind(leader_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_negotiators_for_leader(
    pool: &PgPool,
    leader_id: i64,
) -> Result<Vec<NegotiatorRow>, DbError> {
    let rows = sqlx::query_as::<_, NegotiatorRow>(
        "SELECT id, cedula, name, leader_id FROM negotiators \
         WHERE leader_id = $1 ORDER BY name, cedula",
    )
    .bind(leader_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_negotiators(pool: &PgPool) -> Result<Vec<NegotiatorRow>, DbError> {
    let rows = sqlx::query_as::<_, NegotiatorRow>(
        "SELECT id, cedula, name, leader_id FROM negotiators ORDER BY name, cedula",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
