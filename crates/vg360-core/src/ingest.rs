use std::io::Read;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::indicators::{IndicatorField, IndicatorSnapshot};
use crate::kpis::KpiDefinition;
use crate::CoreError;

/// One row of an indicator import file, keyed by negotiator cédula.
///
/// Expected header: `cedula,date,` followed by any of the indicator column
/// names. Empty cells mean "not measured".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorImportRow {
    pub cedula: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub conversion_de_ventas: Option<f64>,
    #[serde(default)]
    pub recaudacion_mensual: Option<f64>,
    #[serde(default)]
    pub tiempo_hablando: Option<f64>,
    #[serde(default)]
    pub porcentajes_cumplimiento_recaudo: Option<f64>,
    #[serde(default)]
    pub porcentaje_cumplimiento_conversion: Option<f64>,
    #[serde(default)]
    pub porcentaje_caidas_acuerdos: Option<f64>,
}

impl IndicatorImportRow {
    #[must_use]
    pub fn into_snapshot(self, negotiator_id: i64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            negotiator_id,
            date: self.date,
            conversion_de_ventas: self.conversion_de_ventas,
            recaudacion_mensual: self.recaudacion_mensual,
            tiempo_hablando: self.tiempo_hablando,
            porcentajes_cumplimiento_recaudo: self.porcentajes_cumplimiento_recaudo,
            porcentaje_cumplimiento_conversion: self.porcentaje_cumplimiento_conversion,
            porcentaje_caidas_acuerdos: self.porcentaje_caidas_acuerdos,
        }
    }

    /// Check every present value against the catalog bounds of its KPI.
    ///
    /// Fields without a catalog entry are accepted as-is.
    ///
    /// # Errors
    ///
    /// Returns the first [`CoreError::KpiValueOutOfBounds`] found.
    pub fn validate(&self, catalog: &[KpiDefinition]) -> Result<(), CoreError> {
        let snapshot = self.clone().into_snapshot(0);
        for field in IndicatorField::ALL {
            let Some(value) = snapshot.value(field) else {
                continue;
            };
            if let Some(kpi) = catalog.iter().find(|k| k.indicator_field() == Some(field)) {
                kpi.validate_value(value)?;
            }
        }
        Ok(())
    }
}

/// Parse an indicator import file.
///
/// # Errors
///
/// Returns `csv::Error` on malformed rows, unparseable dates, or numbers.
pub fn parse_indicator_csv<R: Read>(reader: R) -> Result<Vec<IndicatorImportRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<IndicatorImportRow>() {
        rows.push(record?);
    }

    Ok(rows)
}
