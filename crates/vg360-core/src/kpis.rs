use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorField;
use crate::{ConfigError, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiType {
    Percentage,
    Amount,
    Hours,
    Count,
    Score,
}

impl KpiType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KpiType::Percentage => "percentage",
            KpiType::Amount => "amount",
            KpiType::Hours => "hours",
            KpiType::Count => "count",
            KpiType::Score => "score",
        }
    }
}

impl std::fmt::Display for KpiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KpiType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(KpiType::Percentage),
            "amount" => Ok(KpiType::Amount),
            "hours" => Ok(KpiType::Hours),
            "count" => Ok(KpiType::Count),
            "score" => Ok(KpiType::Score),
            other => Err(CoreError::InvalidKpiType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kpi_type: KpiType,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub unit: String,
}

impl KpiDefinition {
    /// Render a value the way reports show it for this KPI's type.
    #[must_use]
    pub fn display_value(&self, value: f64) -> String {
        match self.kpi_type {
            KpiType::Percentage => format!("{value:.1}%"),
            KpiType::Amount => format!("${}", group_thousands(value)),
            KpiType::Hours => format!("{value:.1} horas"),
            KpiType::Count => format!("{value:.0}"),
            KpiType::Score => format!("{value:.1}/10"),
        }
    }

    /// Check a value against the catalog bounds (inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::KpiValueOutOfBounds`] when `value` falls outside
    /// `[min_value, max_value]`.
    pub fn validate_value(&self, value: f64) -> Result<(), CoreError> {
        if value < self.min_value || value > self.max_value || value.is_nan() {
            return Err(CoreError::KpiValueOutOfBounds {
                kpi: self.name.clone(),
                value,
                min: self.min_value,
                max: self.max_value,
            });
        }
        Ok(())
    }

    /// Indicator column this KPI is read from, if it is indicator-backed.
    #[must_use]
    pub fn indicator_field(&self) -> Option<IndicatorField> {
        IndicatorField::from_kpi_name(&self.name)
    }
}

/// Whole-unit rendering with comma thousands separators: `1234567.6` -> `1,234,568`.
fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3 + 1);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}

#[derive(Debug, Deserialize)]
pub struct KpisFile {
    pub kpis: Vec<KpiDefinition>,
}

/// Load and validate the KPI catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_kpis(path: &Path) -> Result<KpisFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KpisFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let kpis_file: KpisFile = serde_yaml::from_str(&content).map_err(ConfigError::KpisFileParse)?;

    validate_kpis(&kpis_file)?;

    Ok(kpis_file)
}

fn validate_kpis(kpis_file: &KpisFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for kpi in &kpis_file.kpis {
        if kpi.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "KPI name must be non-empty".to_string(),
            ));
        }

        if kpi.min_value.partial_cmp(&kpi.max_value) != Some(std::cmp::Ordering::Less) {
            return Err(ConfigError::Validation(format!(
                "KPI '{}' has min_value {} not below max_value {}",
                kpi.name, kpi.min_value, kpi.max_value
            )));
        }

        if !seen_names.insert(kpi.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate KPI name: '{}'",
                kpi.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "kpis_test.rs"]
mod tests;
