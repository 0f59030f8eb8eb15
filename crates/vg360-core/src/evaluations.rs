use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::aggregation::NegotiatorIdentity;
use crate::indicators::IndicatorSnapshot;
use crate::kpis::{KpiDefinition, KpiType};

/// An evaluation older than this leaves the negotiator pending again.
pub const STALE_AFTER_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvaluationStatus {
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Al día")]
    UpToDate,
}

impl EvaluationStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "Pendiente",
            EvaluationStatus::UpToDate => "Al día",
        }
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[must_use]
pub fn evaluation_status(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> EvaluationStatus {
    match last {
        Some(at) if at >= now - Duration::days(STALE_AFTER_DAYS) => EvaluationStatus::UpToDate,
        _ => EvaluationStatus::Pending,
    }
}

/// `true` while the previous evaluation is younger than `cooldown_secs`.
#[must_use]
pub fn is_within_cooldown(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown_secs: u64,
) -> bool {
    let Some(last) = last else {
        return false;
    };
    // A cooldown too large for `Duration` never expires.
    let Some(cooldown) = i64::try_from(cooldown_secs)
        .ok()
        .and_then(Duration::try_seconds)
    else {
        return true;
    };
    now.signed_duration_since(last) < cooldown
}

/// What a leader sees for one negotiator on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegotiatorEvaluationState {
    #[serde(flatten)]
    pub negotiator: NegotiatorIdentity,
    pub last_evaluation: Option<DateTime<Utc>>,
    pub evaluation_count: u32,
    pub has_evaluations: bool,
    pub status: EvaluationStatus,
}

impl NegotiatorEvaluationState {
    #[must_use]
    pub fn new(
        negotiator: NegotiatorIdentity,
        last_evaluation: Option<DateTime<Utc>>,
        evaluation_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            negotiator,
            last_evaluation,
            evaluation_count,
            has_evaluations: evaluation_count > 0,
            status: evaluation_status(last_evaluation, now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingEvaluation {
    #[serde(flatten)]
    pub negotiator: NegotiatorIdentity,
    pub last_evaluation_date: Option<NaiveDate>,
    /// Whole days since the last evaluation; `None` if never evaluated.
    pub days_since_last: Option<i64>,
}

/// Negotiators whose status is pending, in input order.
#[must_use]
pub fn pending_evaluations(
    states: &[NegotiatorEvaluationState],
    now: DateTime<Utc>,
) -> Vec<PendingEvaluation> {
    states
        .iter()
        .filter(|s| s.status == EvaluationStatus::Pending)
        .map(|s| PendingEvaluation {
            negotiator: s.negotiator.clone(),
            last_evaluation_date: s.last_evaluation.map(|at| at.date_naive()),
            days_since_last: s.last_evaluation.map(|at| (now - at).num_days()),
        })
        .collect()
}

/// A KPI line item attached to an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiLine {
    pub kpi_name: String,
    pub score: f64,
    pub display: String,
}

/// Line items for a new evaluation, read from the latest snapshot.
///
/// Only percentage KPIs backed by an indicator column produce a line, and
/// only when that column carries a value.
#[must_use]
pub fn build_kpi_lines(kpis: &[KpiDefinition], latest: Option<&IndicatorSnapshot>) -> Vec<KpiLine> {
    let Some(latest) = latest else {
        return Vec::new();
    };
    kpis.iter()
        .filter(|k| k.kpi_type == KpiType::Percentage)
        .filter_map(|k| {
            let score = latest.value(k.indicator_field()?)?;
            Some(KpiLine {
                kpi_name: k.name.clone(),
                score,
                display: k.display_value(score),
            })
        })
        .collect()
}
