//! Leader views: the team with evaluation status, and the pending list.

use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use vg360_core::{
    pending_evaluations, NegotiatorEvaluationState, NegotiatorIdentity, PendingEvaluation, Viewer,
};
use vg360_db::DbError;

use crate::middleware::RequestId;

use super::{map_db_error, require_leader, ApiResponse, AppState, Rejection};

#[derive(Debug, Serialize)]
pub(super) struct DashboardData {
    negotiators: Vec<NegotiatorEvaluationState>,
    pending: Vec<PendingEvaluation>,
    pending_total: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct PendingData {
    pending: Vec<PendingEvaluation>,
    pending_total: usize,
}

/// Every negotiator of the leader with its evaluation history summary,
/// ordered by name.
pub(super) async fn team_states(
    pool: &PgPool,
    leader_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<NegotiatorEvaluationState>, DbError> {
    let team = vg360_db::list_negotiators_for_leader(pool, leader_id).await?;
    let stats: HashMap<i64, vg360_db::EvaluationStatsRow> =
        vg360_db::evaluation_stats_for_leader(pool, leader_id)
            .await?
            .into_iter()
            .map(|s| (s.negotiator_id, s))
            .collect();

    Ok(team
        .into_iter()
        .map(|row| {
            let (last, count) = stats.get(&row.id).map_or((None, 0), |s| {
                (
                    s.last_evaluation,
                    u32::try_from(s.evaluation_count).unwrap_or(u32::MAX),
                )
            });
            NegotiatorEvaluationState::new(NegotiatorIdentity::from(row), last, count, now)
        })
        .collect())
}

pub(super) async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<ApiResponse<DashboardData>>, Rejection> {
    let leader_id = require_leader(&viewer)?;
    let now = Utc::now();

    let negotiators = team_states(&state.pool, leader_id, now)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let pending = pending_evaluations(&negotiators, now);

    Ok(Json(ApiResponse::new(
        DashboardData {
            pending_total: pending.len(),
            negotiators,
            pending,
        },
        req_id.0,
    )))
}

pub(super) async fn pending(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<ApiResponse<PendingData>>, Rejection> {
    let leader_id = require_leader(&viewer)?;
    let now = Utc::now();

    let states = team_states(&state.pool, leader_id, now)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let pending = pending_evaluations(&states, now);

    Ok(Json(ApiResponse::new(
        PendingData {
            pending_total: pending.len(),
            pending,
        },
        req_id.0,
    )))
}
