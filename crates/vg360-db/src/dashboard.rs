//! Loaders that gather the rows the aggregation engine works on.

use std::collections::HashSet;

use sqlx::PgPool;
use vg360_core::{DateRange, IndicatorSnapshot, LeaderIdentity, NegotiatorIdentity};

use crate::evaluations::evaluated_negotiators_in_range;
use crate::indicators::list_snapshots_in_range;
use crate::negotiators::{list_negotiators, list_negotiators_for_leader};
use crate::users::list_leaders;
use crate::DbError;

/// Everything `leader_summary` needs for one range.
#[derive(Debug, Clone, Default)]
pub struct LeaderSummaryInputs {
    pub leaders: Vec<LeaderIdentity>,
    pub negotiators: Vec<NegotiatorIdentity>,
    pub snapshots: Vec<IndicatorSnapshot>,
    pub evaluated: HashSet<i64>,
}

/// Everything `negotiator_drilldown` needs for one leader and range.
#[derive(Debug, Clone, Default)]
pub struct DrilldownInputs {
    pub team: Vec<NegotiatorIdentity>,
    pub snapshots: Vec<IndicatorSnapshot>,
    pub evaluated: HashSet<i64>,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn load_leader_summary_inputs(
    pool: &PgPool,
    range: DateRange,
) -> Result<LeaderSummaryInputs, DbError> {
    let leaders = list_leaders(pool).await?;
    let negotiators = list_negotiators(pool).await?;
    let snapshots = list_snapshots_in_range(pool, range, None).await?;
    let evaluated = evaluated_negotiators_in_range(pool, range).await?;

    Ok(LeaderSummaryInputs {
        leaders: leaders.iter().map(crate::UserRow::leader_identity).collect(),
        negotiators: negotiators.into_iter().map(NegotiatorIdentity::from).collect(),
        snapshots,
        evaluated,
    })
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn load_drilldown_inputs(
    pool: &PgPool,
    leader_id: i64,
    range: DateRange,
) -> Result<DrilldownInputs, DbError> {
    let team: Vec<NegotiatorIdentity> = list_negotiators_for_leader(pool, leader_id)
        .await?
        .into_iter()
        .map(NegotiatorIdentity::from)
        .collect();
    let ids: Vec<i64> = team.iter().map(|n| n.id).collect();
    let snapshots = list_snapshots_in_range(pool, range, Some(&ids)).await?;
    let evaluated = evaluated_negotiators_in_range(pool, range)
        .await?
        .into_iter()
        .filter(|id| ids.contains(id))
        .collect();

    Ok(DrilldownInputs {
        team,
        snapshots,
        evaluated,
    })
}
