//! Hacer, Ser, and composite scoring.
//!
//! Every score is `Option<f64>`: `None` means there was nothing to score,
//! which is reported as "no data" and never as zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::{field_mean, IndicatorField, IndicatorSnapshot};
use crate::period::days_before;
use crate::CoreError;

/// Default trailing window for the Hacer score.
pub const DEFAULT_HACER_PERIOD_DAYS: u32 = 30;

// Composite weights in percent (must sum to exactly 100)
pub const HACER_WEIGHT_PCT: u32 = 70;
pub const SER_WEIGHT_PCT: u32 = 30;

const _: () = assert!(HACER_WEIGHT_PCT + SER_WEIGHT_PCT == 100);

/// Factor that lifts a 1-5 Ser average onto the 0-100 Hacer scale.
pub const SER_SCALE: f64 = 20.0;

/// Round half away from zero to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Hacer score over an already-filtered set of snapshots.
///
/// Each percentage field is averaged on its own, skipping nulls, and the
/// score is the plain mean of the fields that produced a value. Fields are
/// weighted equally regardless of how many snapshots carried them.
#[must_use]
pub fn hacer_score(snapshots: &[IndicatorSnapshot]) -> Option<f64> {
    if snapshots.is_empty() {
        return None;
    }
    let means: Vec<f64> = IndicatorField::PERCENTAGE
        .into_iter()
        .filter_map(|field| field_mean(snapshots, field))
        .collect();
    mean(&means).map(round2)
}

/// Hacer score over the snapshots dated on or after `today - period_days`.
#[must_use]
pub fn hacer_score_since(
    snapshots: &[IndicatorSnapshot],
    today: NaiveDate,
    period_days: u32,
) -> Option<f64> {
    let cutoff = days_before(today, period_days);
    let in_window: Vec<IndicatorSnapshot> = snapshots
        .iter()
        .filter(|s| s.date >= cutoff)
        .cloned()
        .collect();
    hacer_score(&in_window)
}

/// `hacer * 0.7 + (ser_average * 20) * 0.3`, or `None` unless both are known.
#[must_use]
pub fn composite_score(hacer: Option<f64>, ser_average: Option<f64>) -> Option<f64> {
    let (hacer, ser) = (hacer?, ser_average?);
    let hacer_weight = f64::from(HACER_WEIGHT_PCT) / 100.0;
    let ser_weight = f64::from(SER_WEIGHT_PCT) / 100.0;
    Some(round2(hacer * hacer_weight + ser * SER_SCALE * ser_weight))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    Some(values.iter().sum::<f64>() / n)
}

/// The five Ser ratings, each 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerRatings {
    pub actitud: i16,
    pub trabajo_en_equipo: i16,
    pub sentido_pertenencia: i16,
    pub relacionamiento: i16,
    pub compromiso: i16,
}

impl SerRatings {
    /// # Errors
    ///
    /// Returns [`CoreError::RatingOutOfRange`] for the first rating outside 1-5.
    pub fn new(
        actitud: i16,
        trabajo_en_equipo: i16,
        sentido_pertenencia: i16,
        relacionamiento: i16,
        compromiso: i16,
    ) -> Result<Self, CoreError> {
        let ratings = Self {
            actitud,
            trabajo_en_equipo,
            sentido_pertenencia,
            relacionamiento,
            compromiso,
        };
        ratings.validate()?;
        Ok(ratings)
    }

    /// Re-check a value that may have been deserialized without going through [`SerRatings::new`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RatingOutOfRange`] for the first rating outside 1-5.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (dimension, value) in self.named() {
            if !(1..=5).contains(&value) {
                return Err(CoreError::RatingOutOfRange { dimension, value });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn named(&self) -> [(&'static str, i16); 5] {
        [
            ("actitud", self.actitud),
            ("trabajo_en_equipo", self.trabajo_en_equipo),
            ("sentido_pertenencia", self.sentido_pertenencia),
            ("relacionamiento", self.relacionamiento),
            ("compromiso", self.compromiso),
        ]
    }

    /// Mean of the five ratings (the "promedio").
    #[must_use]
    pub fn average(&self) -> f64 {
        let sum: i16 = self.named().iter().map(|(_, v)| *v).sum();
        f64::from(sum) / 5.0
    }
}

/// Hacer, Ser, and total side by side, as shown on an evaluation report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub hacer: Option<f64>,
    /// Ser average lifted onto the 0-100 scale.
    pub ser: Option<f64>,
    pub total: Option<f64>,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn new(hacer: Option<f64>, ser_average: Option<f64>) -> Self {
        Self {
            hacer,
            ser: ser_average.map(|s| round2(s * SER_SCALE)),
            total: composite_score(hacer, ser_average),
        }
    }
}
