//! Per-leader and per-negotiator roll-ups over a date range.
//!
//! The functions here are pure: callers load identities, snapshots, and the
//! set of negotiators evaluated in range, then hand them over. Missing values
//! stay `None` all the way through so that "no data" never ranks as zero.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::indicators::{field_mean, IndicatorField, IndicatorSnapshot};
use crate::period::DateRange;
use crate::scoring::round2;

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderIdentity {
    pub id: i64,
    pub cedula: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatorIdentity {
    pub id: i64,
    pub cedula: String,
    pub name: String,
    pub leader_id: i64,
}

// ---------------------------------------------------------------------------
// Field averages and desempeño
// ---------------------------------------------------------------------------

/// Mean of each indicator field over a set of snapshots, nulls skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FieldAverages {
    pub avg_conversion: Option<f64>,
    pub avg_recaudo: Option<f64>,
    pub avg_tiempo: Option<f64>,
    pub avg_cump_recaudo: Option<f64>,
    pub avg_cump_conv: Option<f64>,
    pub avg_caidas: Option<f64>,
}

impl FieldAverages {
    #[must_use]
    pub fn from_snapshots(snapshots: &[&IndicatorSnapshot]) -> Self {
        let mean = |field| field_mean(snapshots.iter().copied(), field);
        Self {
            avg_conversion: mean(IndicatorField::ConversionDeVentas),
            avg_recaudo: mean(IndicatorField::RecaudacionMensual),
            avg_tiempo: mean(IndicatorField::TiempoHablando),
            avg_cump_recaudo: mean(IndicatorField::CumplimientoRecaudo),
            avg_cump_conv: mean(IndicatorField::CumplimientoConversion),
            avg_caidas: mean(IndicatorField::CaidasAcuerdos),
        }
    }

    #[must_use]
    pub fn get(&self, field: IndicatorField) -> Option<f64> {
        match field {
            IndicatorField::ConversionDeVentas => self.avg_conversion,
            IndicatorField::RecaudacionMensual => self.avg_recaudo,
            IndicatorField::TiempoHablando => self.avg_tiempo,
            IndicatorField::CumplimientoRecaudo => self.avg_cump_recaudo,
            IndicatorField::CumplimientoConversion => self.avg_cump_conv,
            IndicatorField::CaidasAcuerdos => self.avg_caidas,
        }
    }
}

/// Mean of conversion, both compliance rates, and `max(0, 100 - deal-drop)`,
/// over whichever of the four are present. Rounded to 2 decimals.
#[must_use]
pub fn desempeno(averages: &FieldAverages) -> Option<f64> {
    let components = [
        averages.avg_conversion,
        averages.avg_cump_recaudo,
        averages.avg_cump_conv,
        averages.avg_caidas.map(|c| (100.0 - c).max(0.0)),
    ];
    let present: Vec<f64> = components.into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = present.len() as f64;
    Some(round2(present.iter().sum::<f64>() / n))
}

// ---------------------------------------------------------------------------
// Compliance
// ---------------------------------------------------------------------------

/// Evaluation coverage of a leader's team within the range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceMetrics {
    /// All negotiators owned by the leader, regardless of range.
    pub assigned_negotiators: u32,
    /// Negotiators with at least one evaluation inside the range.
    pub evaluated: u32,
    pub pending: u32,
    /// `None` when the leader has no negotiators.
    pub completion_pct: Option<f64>,
    pub below_target: bool,
}

impl ComplianceMetrics {
    #[must_use]
    pub fn compute(assigned: u32, evaluated: u32, target_pct: f64) -> Self {
        let evaluated = evaluated.min(assigned);
        let completion_pct = if assigned == 0 {
            None
        } else {
            Some(round2(100.0 * f64::from(evaluated) / f64::from(assigned)))
        };
        Self {
            assigned_negotiators: assigned,
            evaluated,
            pending: assigned - evaluated,
            completion_pct,
            below_target: completion_pct.is_some_and(|pct| pct < target_pct),
        }
    }
}

// ---------------------------------------------------------------------------
// Leader summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderSummaryOptions {
    /// Also list leaders with no snapshots in range, as all-null rows.
    pub include_without_data: bool,
    pub compliance_target_pct: f64,
}

impl Default for LeaderSummaryOptions {
    fn default() -> Self {
        Self {
            include_without_data: false,
            compliance_target_pct: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderSummaryRow {
    #[serde(flatten)]
    pub leader: LeaderIdentity,
    pub negotiators_with_data: u32,
    #[serde(flatten)]
    pub averages: FieldAverages,
    pub desempeno: Option<f64>,
    pub compliance: ComplianceMetrics,
    /// This leader's share of all negotiators with data across the returned rows.
    pub team_share_pct: Option<f64>,
}

/// One row per leader with in-range data, ordered by leader name.
///
/// `snapshots` may contain rows outside `range`; they are ignored.
/// `evaluated` holds the ids of negotiators with at least one evaluation in
/// range.
#[must_use]
pub fn leader_summary(
    leaders: &[LeaderIdentity],
    negotiators: &[NegotiatorIdentity],
    snapshots: &[IndicatorSnapshot],
    evaluated: &HashSet<i64>,
    range: DateRange,
    options: &LeaderSummaryOptions,
) -> Vec<LeaderSummaryRow> {
    let leader_of: HashMap<i64, i64> = negotiators.iter().map(|n| (n.id, n.leader_id)).collect();

    let mut by_leader: HashMap<i64, Vec<&IndicatorSnapshot>> = HashMap::new();
    for snap in snapshots.iter().filter(|s| range.contains(s.date)) {
        if let Some(leader_id) = leader_of.get(&snap.negotiator_id) {
            by_leader.entry(*leader_id).or_default().push(snap);
        }
    }

    let mut ordered: Vec<&LeaderIdentity> = leaders.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.cedula.cmp(&b.cedula)));

    let mut rows: Vec<LeaderSummaryRow> = Vec::with_capacity(ordered.len());
    for leader in ordered {
        let team: Vec<&NegotiatorIdentity> = negotiators
            .iter()
            .filter(|n| n.leader_id == leader.id)
            .collect();
        let empty = Vec::new();
        let snaps = by_leader.get(&leader.id).unwrap_or(&empty);
        if snaps.is_empty() && !options.include_without_data {
            continue;
        }

        let with_data: HashSet<i64> = snaps.iter().map(|s| s.negotiator_id).collect();
        let averages = FieldAverages::from_snapshots(snaps);
        let evaluated_count = team.iter().filter(|n| evaluated.contains(&n.id)).count();

        rows.push(LeaderSummaryRow {
            leader: leader.clone(),
            negotiators_with_data: count_u32(with_data.len()),
            averages,
            desempeno: desempeno(&averages),
            compliance: ComplianceMetrics::compute(
                count_u32(team.len()),
                count_u32(evaluated_count),
                options.compliance_target_pct,
            ),
            team_share_pct: None,
        });
    }

    let total: u32 = rows.iter().map(|r| r.negotiators_with_data).sum();
    if total > 0 {
        for row in &mut rows {
            row.team_share_pct = Some(round2(
                100.0 * f64::from(row.negotiators_with_data) / f64::from(total),
            ));
        }
    }

    rows
}

// ---------------------------------------------------------------------------
// Negotiator drill-down
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegotiatorDrilldownRow {
    #[serde(flatten)]
    pub negotiator: NegotiatorIdentity,
    pub snapshot_count: u32,
    #[serde(flatten)]
    pub averages: FieldAverages,
    pub desempeno: Option<f64>,
    pub evaluated_in_range: bool,
}

/// One row per negotiator in `team`, ordered by negotiator name. Negotiators
/// without in-range snapshots are listed with null averages.
#[must_use]
pub fn negotiator_drilldown(
    team: &[NegotiatorIdentity],
    snapshots: &[IndicatorSnapshot],
    evaluated: &HashSet<i64>,
    range: DateRange,
) -> Vec<NegotiatorDrilldownRow> {
    let mut ordered: Vec<&NegotiatorIdentity> = team.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.cedula.cmp(&b.cedula)));

    ordered
        .into_iter()
        .map(|negotiator| {
            let snaps: Vec<&IndicatorSnapshot> = snapshots
                .iter()
                .filter(|s| s.negotiator_id == negotiator.id && range.contains(s.date))
                .collect();
            let averages = FieldAverages::from_snapshots(&snaps);
            NegotiatorDrilldownRow {
                negotiator: negotiator.clone(),
                snapshot_count: count_u32(snaps.len()),
                averages,
                desempeno: desempeno(&averages),
                evaluated_in_range: evaluated.contains(&negotiator.id),
            }
        })
        .collect()
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "equipos")]
    TeamSize,
    #[serde(rename = "avg_conversion")]
    Conversion,
    #[serde(rename = "avg_recaudo")]
    Recaudo,
    #[serde(rename = "avg_tiempo")]
    Tiempo,
    #[serde(rename = "avg_cump_recaudo")]
    CumplimientoRecaudo,
    #[serde(rename = "avg_cump_conv")]
    CumplimientoConversion,
    #[serde(rename = "avg_caidas")]
    Caidas,
    #[serde(rename = "desempeno")]
    Desempeno,
    #[serde(rename = "cumplimiento")]
    CompletionPct,
    #[serde(rename = "pendientes")]
    Pending,
}

impl SortField {
    /// Unknown names fall back to desempeño.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("equipos") => SortField::TeamSize,
            Some("avg_conversion") => SortField::Conversion,
            Some("avg_recaudo") => SortField::Recaudo,
            Some("avg_tiempo") => SortField::Tiempo,
            Some("avg_cump_recaudo") => SortField::CumplimientoRecaudo,
            Some("avg_cump_conv") => SortField::CumplimientoConversion,
            Some("avg_caidas") => SortField::Caidas,
            Some("cumplimiento") => SortField::CompletionPct,
            Some("pendientes") => SortField::Pending,
            _ => SortField::Desempeno,
        }
    }

    fn indicator(self) -> Option<IndicatorField> {
        match self {
            SortField::Conversion => Some(IndicatorField::ConversionDeVentas),
            SortField::Recaudo => Some(IndicatorField::RecaudacionMensual),
            SortField::Tiempo => Some(IndicatorField::TiempoHablando),
            SortField::CumplimientoRecaudo => Some(IndicatorField::CumplimientoRecaudo),
            SortField::CumplimientoConversion => Some(IndicatorField::CumplimientoConversion),
            SortField::Caidas => Some(IndicatorField::CaidasAcuerdos),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `"asc"` sorts ascending; anything else descends.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// A row that exposes numeric sort keys.
pub trait Sortable {
    fn sort_key(&self, field: SortField) -> Option<f64>;
}

impl Sortable for LeaderSummaryRow {
    fn sort_key(&self, field: SortField) -> Option<f64> {
        if let Some(indicator) = field.indicator() {
            return self.averages.get(indicator);
        }
        match field {
            SortField::TeamSize => Some(f64::from(self.negotiators_with_data)),
            SortField::CompletionPct => self.compliance.completion_pct,
            SortField::Pending => Some(f64::from(self.compliance.pending)),
            _ => self.desempeno,
        }
    }
}

impl Sortable for NegotiatorDrilldownRow {
    fn sort_key(&self, field: SortField) -> Option<f64> {
        if let Some(indicator) = field.indicator() {
            return self.averages.get(indicator);
        }
        match field {
            SortField::TeamSize => Some(f64::from(self.snapshot_count)),
            SortField::CompletionPct | SortField::Pending => {
                Some(if self.evaluated_in_range { 1.0 } else { 0.0 })
            }
            _ => self.desempeno,
        }
    }
}

/// Stable sort; rows whose key is `None` go last in either direction.
pub fn sort_rows<T: Sortable>(rows: &mut [T], field: SortField, direction: SortDirection) {
    rows.sort_by(|a, b| match (a.sort_key(field), b.sort_key(field)) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
#[path = "aggregation_test.rs"]
mod tests;
