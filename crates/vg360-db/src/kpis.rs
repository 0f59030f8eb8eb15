use sqlx::PgPool;
use vg360_core::{CoreError, KpiDefinition};

use crate::DbError;

/// A row from the `kpis` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KpiRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub kpi_type: String,
    pub min_value: f64,
    pub max_value: f64,
    pub unit: String,
}

impl KpiRow {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKpiType`] if the stored type is unknown.
    pub fn to_definition(&self) -> Result<KpiDefinition, CoreError> {
        Ok(KpiDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            kpi_type: self.kpi_type.parse()?,
            min_value: self.min_value,
            max_value: self.max_value,
            unit: self.unit.clone(),
        })
    }
}

/// Upsert KPI definitions by name in a single transaction.
///
/// Returns the number of KPIs written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any upsert fails; nothing is committed then.
pub async fn seed_kpis(pool: &PgPool, kpis: &[KpiDefinition]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for kpi in kpis {
        sqlx::query(
            "INSERT INTO kpis (name, description, kpi_type, min_value, max_value, unit) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (name) DO UPDATE SET \
                 description = EXCLUDED.description, \
                 kpi_type = EXCLUDED.kpi_type, \
                 min_value = EXCLUDED.min_value, \
                 max_value = EXCLUDED.max_value, \
                 unit = EXCLUDED.unit, \
                 updated_at = NOW()",
        )
        .bind(&kpi.name)
        .bind(&kpi.description)
        .bind(kpi.kpi_type.as_str())
        .bind(kpi.min_value)
        .bind(kpi.max_value)
        .bind(&kpi.unit)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(kpis.len())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_kpis(pool: &PgPool) -> Result<Vec<KpiRow>, DbError> {
    let rows = sqlx::query_as::<_, KpiRow>(
        "SELECT id, name, description, kpi_type, min_value, max_value, unit \
         FROM kpis ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
