use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One periodic measurement row for a negotiator.
///
/// Every measurement is optional; a missing value means "not measured",
/// never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub negotiator_id: i64,
    pub date: NaiveDate,
    pub conversion_de_ventas: Option<f64>,
    pub recaudacion_mensual: Option<f64>,
    pub tiempo_hablando: Option<f64>,
    pub porcentajes_cumplimiento_recaudo: Option<f64>,
    pub porcentaje_cumplimiento_conversion: Option<f64>,
    pub porcentaje_caidas_acuerdos: Option<f64>,
}

impl IndicatorSnapshot {
    /// Snapshot with no measurements, mainly useful as a builder base.
    #[must_use]
    pub fn empty(negotiator_id: i64, date: NaiveDate) -> Self {
        Self {
            negotiator_id,
            date,
            conversion_de_ventas: None,
            recaudacion_mensual: None,
            tiempo_hablando: None,
            porcentajes_cumplimiento_recaudo: None,
            porcentaje_cumplimiento_conversion: None,
            porcentaje_caidas_acuerdos: None,
        }
    }

    #[must_use]
    pub fn value(&self, field: IndicatorField) -> Option<f64> {
        match field {
            IndicatorField::ConversionDeVentas => self.conversion_de_ventas,
            IndicatorField::RecaudacionMensual => self.recaudacion_mensual,
            IndicatorField::TiempoHablando => self.tiempo_hablando,
            IndicatorField::CumplimientoRecaudo => self.porcentajes_cumplimiento_recaudo,
            IndicatorField::CumplimientoConversion => self.porcentaje_cumplimiento_conversion,
            IndicatorField::CaidasAcuerdos => self.porcentaje_caidas_acuerdos,
        }
    }

    pub fn set(&mut self, field: IndicatorField, value: Option<f64>) {
        let slot = match field {
            IndicatorField::ConversionDeVentas => &mut self.conversion_de_ventas,
            IndicatorField::RecaudacionMensual => &mut self.recaudacion_mensual,
            IndicatorField::TiempoHablando => &mut self.tiempo_hablando,
            IndicatorField::CumplimientoRecaudo => &mut self.porcentajes_cumplimiento_recaudo,
            IndicatorField::CumplimientoConversion => &mut self.porcentaje_cumplimiento_conversion,
            IndicatorField::CaidasAcuerdos => &mut self.porcentaje_caidas_acuerdos,
        };
        *slot = value;
    }

    /// `true` when no field carries a value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        IndicatorField::ALL.iter().all(|f| self.value(*f).is_none())
    }
}

/// The six measured indicator columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorField {
    ConversionDeVentas,
    RecaudacionMensual,
    TiempoHablando,
    CumplimientoRecaudo,
    CumplimientoConversion,
    CaidasAcuerdos,
}

impl IndicatorField {
    pub const ALL: [IndicatorField; 6] = [
        IndicatorField::ConversionDeVentas,
        IndicatorField::RecaudacionMensual,
        IndicatorField::TiempoHablando,
        IndicatorField::CumplimientoRecaudo,
        IndicatorField::CumplimientoConversion,
        IndicatorField::CaidasAcuerdos,
    ];

    /// Percentage fields that feed the Hacer score, in scoring order.
    pub const PERCENTAGE: [IndicatorField; 4] = [
        IndicatorField::ConversionDeVentas,
        IndicatorField::CumplimientoRecaudo,
        IndicatorField::CumplimientoConversion,
        IndicatorField::CaidasAcuerdos,
    ];

    /// Column name in storage and in CSV imports.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            IndicatorField::ConversionDeVentas => "conversion_de_ventas",
            IndicatorField::RecaudacionMensual => "recaudacion_mensual",
            IndicatorField::TiempoHablando => "tiempo_hablando",
            IndicatorField::CumplimientoRecaudo => "porcentajes_cumplimiento_recaudo",
            IndicatorField::CumplimientoConversion => "porcentaje_cumplimiento_conversion",
            IndicatorField::CaidasAcuerdos => "porcentaje_caidas_acuerdos",
        }
    }

    /// Human-facing chart label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            IndicatorField::ConversionDeVentas => "Conversión de Ventas",
            IndicatorField::RecaudacionMensual => "Recaudación Mensual",
            IndicatorField::TiempoHablando => "Tiempo Hablando",
            IndicatorField::CumplimientoRecaudo => "Porcentajes de Cumplimiento de Recaudo",
            IndicatorField::CumplimientoConversion => "Porcentaje de Cumplimiento de Conversión",
            IndicatorField::CaidasAcuerdos => "Porcentaje de Caídas de Acuerdos",
        }
    }

    #[must_use]
    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }

    /// Maps a KPI catalog name onto the indicator field it is read from.
    #[must_use]
    pub fn from_kpi_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == name)
    }
}

/// Mean of the non-null values of `field` across `snapshots`.
#[must_use]
pub fn field_mean<'a, I>(snapshots: I, field: IndicatorField) -> Option<f64>
where
    I: IntoIterator<Item = &'a IndicatorSnapshot>,
{
    let (sum, n) = snapshots
        .into_iter()
        .filter_map(|s| s.value(field))
        .fold((0.0_f64, 0_u32), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / f64::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn field_mean_skips_nulls() {
        let mut a = IndicatorSnapshot::empty(1, day(1));
        a.conversion_de_ventas = Some(40.0);
        let b = IndicatorSnapshot::empty(1, day(2));
        let mut c = IndicatorSnapshot::empty(1, day(3));
        c.conversion_de_ventas = Some(60.0);

        let rows = [a, b, c];
        assert_eq!(
            field_mean(&rows, IndicatorField::ConversionDeVentas),
            Some(50.0)
        );
        assert_eq!(field_mean(&rows, IndicatorField::TiempoHablando), None);
    }

    #[test]
    fn field_mean_of_empty_slice_is_none() {
        let rows: [IndicatorSnapshot; 0] = [];
        assert_eq!(field_mean(&rows, IndicatorField::CaidasAcuerdos), None);
    }

    #[test]
    fn set_and_value_agree_for_every_field() {
        let mut snap = IndicatorSnapshot::empty(7, day(5));
        assert!(snap.is_blank());
        for (i, field) in IndicatorField::ALL.into_iter().enumerate() {
            let v = f64::from(u32::try_from(i).unwrap()) + 0.5;
            snap.set(field, Some(v));
            assert_eq!(snap.value(field), Some(v));
        }
        assert!(!snap.is_blank());
    }

    #[test]
    fn column_names_round_trip() {
        for field in IndicatorField::ALL {
            assert_eq!(IndicatorField::from_column(field.column()), Some(field));
        }
        assert_eq!(IndicatorField::from_column("unknown"), None);
    }

    #[test]
    fn kpi_names_map_to_fields() {
        assert_eq!(
            IndicatorField::from_kpi_name("Porcentaje de Caídas de Acuerdos"),
            Some(IndicatorField::CaidasAcuerdos)
        );
        assert_eq!(IndicatorField::from_kpi_name("Satisfacción"), None);
    }

    #[test]
    fn percentage_fields_exclude_amount_and_hours() {
        assert!(!IndicatorField::PERCENTAGE.contains(&IndicatorField::RecaudacionMensual));
        assert!(!IndicatorField::PERCENTAGE.contains(&IndicatorField::TiempoHablando));
    }
}
