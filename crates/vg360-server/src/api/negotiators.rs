//! Negotiator views, always scoped to the calling leader's team.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use vg360_core::{
    days_before, hacer_score_since, EvaluationReport, IndicatorField, IndicatorSnapshot,
    NegotiatorEvaluationState, ReportKpi, ScoreBreakdown, Viewer, DEFAULT_WINDOW_DAYS,
};
use vg360_db::{DbError, NegotiatorRow};

use crate::middleware::RequestId;

use super::leader::team_states;
use super::{map_db_error, require_leader, ApiError, ApiResponse, AppState, Rejection};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct NegotiatorDetail {
    #[serde(flatten)]
    state: NegotiatorEvaluationState,
    latest_snapshot: Option<IndicatorSnapshot>,
    scores: ScoreBreakdown,
    hacer_period_days: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct HacerScoreQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct HacerScoreData {
    cedula: String,
    period_days: u32,
    snapshot_count: usize,
    /// `null` when there is no data in the period.
    hacer_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct IndicatorSeries {
    field: IndicatorField,
    label: &'static str,
    values: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub(super) struct IndicatorHistory {
    since: NaiveDate,
    labels: Vec<NaiveDate>,
    series: Vec<IndicatorSeries>,
    latest: Option<IndicatorSnapshot>,
}

#[derive(Debug, Serialize)]
pub(super) struct EvaluationKpiItem {
    name: String,
    kpi_type: String,
    score: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct LastEvaluationData {
    id: i64,
    evaluator_id: i64,
    created_at: DateTime<Utc>,
    overall_score: Option<f64>,
    feedback: String,
    kpis: Vec<EvaluationKpiItem>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a cédula within the leader's team; other teams look like 404.
pub(super) async fn resolve_negotiator(
    pool: &PgPool,
    cedula: &str,
    leader_id: i64,
    request_id: &str,
) -> Result<NegotiatorRow, ApiError> {
    vg360_db::get_negotiator_for_leader(pool, cedula, leader_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => ApiError::new(
                request_id,
                "not_found",
                format!("negotiator '{cedula}' not found"),
            ),
            other => map_db_error(request_id.to_owned(), &other),
        })
}

/// Hacer score over the trailing `days`, and how many snapshots fed it.
pub(super) async fn hacer_for(
    pool: &PgPool,
    negotiator_id: i64,
    today: NaiveDate,
    days: u32,
) -> Result<(Option<f64>, usize), DbError> {
    let since = days_before(today, days);
    let snapshots =
        vg360_db::list_snapshots_for_negotiator_since(pool, negotiator_id, since).await?;
    Ok((
        hacer_score_since(&snapshots, today, days),
        snapshots.len(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn get_negotiator(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
    Path(cedula): Path<String>,
) -> Result<Json<ApiResponse<NegotiatorDetail>>, Rejection> {
    let leader_id = require_leader(&viewer)?;
    let negotiator = resolve_negotiator(&state.pool, &cedula, leader_id, &req_id.0).await?;
    let now = Utc::now();
    let db_err = |e: DbError| map_db_error(req_id.0.clone(), &e);

    let team = team_states(&state.pool, leader_id, now)
        .await
        .map_err(db_err)?;
    let Some(state_row) = team.into_iter().find(|s| s.negotiator.id == negotiator.id) else {
        return Err(ApiError::new(req_id.0.clone(), "not_found", "negotiator not found").into());
    };

    let period = state.scoring.hacer_lookback_days;
    let (hacer, _) = hacer_for(&state.pool, negotiator.id, now.date_naive(), period)
        .await
        .map_err(db_err)?;
    let ser = vg360_db::get_last_ser_evaluation(&state.pool, negotiator.id)
        .await
        .map_err(db_err)?
        .map(|row| row.average());
    let latest_snapshot = vg360_db::get_latest_snapshot(&state.pool, negotiator.id)
        .await
        .map_err(db_err)?;

    Ok(Json(ApiResponse::new(
        NegotiatorDetail {
            state: state_row,
            latest_snapshot,
            scores: ScoreBreakdown::new(hacer, ser),
            hacer_period_days: period,
        },
        req_id.0,
    )))
}

pub(super) async fn hacer_score(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
    Path(cedula): Path<String>,
    Query(query): Query<HacerScoreQuery>,
) -> Result<Json<ApiResponse<HacerScoreData>>, Rejection> {
    let leader_id = require_leader(&viewer)?;
    let negotiator = resolve_negotiator(&state.pool, &cedula, leader_id, &req_id.0).await?;
    let period_days = query
        .days
        .filter(|d| *d > 0)
        .unwrap_or(state.scoring.hacer_lookback_days);

    let (hacer_score, snapshot_count) =
        hacer_for(&state.pool, negotiator.id, Utc::now().date_naive(), period_days)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        HacerScoreData {
            cedula: negotiator.cedula,
            period_days,
            snapshot_count,
            hacer_score,
        },
        req_id.0,
    )))
}

pub(super) async fn indicator_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
    Path(cedula): Path<String>,
) -> Result<Json<ApiResponse<IndicatorHistory>>, Rejection> {
    let leader_id = require_leader(&viewer)?;
    let negotiator = resolve_negotiator(&state.pool, &cedula, leader_id, &req_id.0).await?;
    let since = Utc::now().date_naive() - Duration::days(DEFAULT_WINDOW_DAYS);

    let snapshots = vg360_db::list_snapshots_for_negotiator_since(&state.pool, negotiator.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        build_history(since, snapshots),
        req_id.0,
    )))
}

/// Chart-ready series: one label per snapshot date, one series per field.
fn build_history(since: NaiveDate, snapshots: Vec<IndicatorSnapshot>) -> IndicatorHistory {
    let series = IndicatorField::ALL
        .into_iter()
        .map(|field| IndicatorSeries {
            field,
            label: field.label(),
            values: snapshots.iter().map(|s| s.value(field)).collect(),
        })
        .collect();
    let labels = snapshots.iter().map(|s| s.date).collect();
    IndicatorHistory {
        since,
        labels,
        series,
        latest: snapshots.into_iter().last(),
    }
}

pub(super) async fn last_evaluation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
    Path(cedula): Path<String>,
) -> Result<Json<ApiResponse<LastEvaluationData>>, Rejection> {
    let leader_id = require_leader(&viewer)?;
    let negotiator = resolve_negotiator(&state.pool, &cedula, leader_id, &req_id.0).await?;
    let db_err = |e: DbError| map_db_error(req_id.0.clone(), &e);

    let Some(evaluation) = vg360_db::get_last_evaluation(&state.pool, negotiator.id)
        .await
        .map_err(db_err)?
    else {
        return Err(ApiError::new(req_id.0.clone(), "not_found", "no evaluations yet").into());
    };
    let kpis = vg360_db::list_evaluation_kpis(&state.pool, evaluation.id)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|k| EvaluationKpiItem {
            name: k.kpi_name,
            kpi_type: k.kpi_type,
            score: k.score,
        })
        .collect();

    Ok(Json(ApiResponse::new(
        LastEvaluationData {
            id: evaluation.id,
            evaluator_id: evaluation.evaluator_id,
            created_at: evaluation.created_at,
            overall_score: evaluation.overall_score,
            feedback: evaluation.feedback,
            kpis,
        },
        req_id.0,
    )))
}

/// The record a renderer turns into the downloadable evaluation document.
pub(super) async fn evaluation_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
    Path(cedula): Path<String>,
) -> Result<Json<ApiResponse<EvaluationReport>>, Rejection> {
    let leader_id = require_leader(&viewer)?;
    let negotiator = resolve_negotiator(&state.pool, &cedula, leader_id, &req_id.0).await?;
    let db_err = |e: DbError| map_db_error(req_id.0.clone(), &e);

    let Some(evaluation) = vg360_db::get_last_evaluation(&state.pool, negotiator.id)
        .await
        .map_err(db_err)?
    else {
        return Err(ApiError::new(req_id.0.clone(), "not_found", "no evaluations yet").into());
    };
    let kpis = vg360_db::list_evaluation_kpis(&state.pool, evaluation.id)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|k| ReportKpi {
            name: k.kpi_name,
            value: k.score,
        })
        .collect();
    let ser = vg360_db::get_last_ser_evaluation(&state.pool, negotiator.id)
        .await
        .map_err(db_err)?
        .map(|row| row.average());
    let leader = vg360_db::get_user_by_cedula(&state.pool, viewer.cedula())
        .await
        .map_err(db_err)?;
    let (leader_name, leader_email) = leader.map_or_else(
        || (viewer.cedula().to_owned(), String::new()),
        |u| (u.full_name(), u.email),
    );

    let feedback = Some(evaluation.feedback).filter(|f| !f.trim().is_empty());
    Ok(Json(ApiResponse::new(
        EvaluationReport {
            negotiator_name: negotiator.name,
            negotiator_cedula: negotiator.cedula,
            leader_name,
            leader_email,
            evaluated_at: evaluation.created_at,
            kpis,
            scores: ScoreBreakdown::new(evaluation.overall_score, ser),
            feedback,
        },
        req_id.0,
    )))
}
