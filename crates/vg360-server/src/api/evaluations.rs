//! Evaluation write handlers: Hacer evaluations with KPI lines, and Ser ratings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vg360_core::{build_kpi_lines, KpiDefinition, KpiLine, SerRatings, Viewer};
use vg360_db::NewEvaluation;

use crate::middleware::RequestId;

use super::negotiators::{hacer_for, resolve_negotiator};
use super::{map_db_error, require_leader, ApiResponse, AppState, Rejection};

#[derive(Debug, Default, Deserialize)]
pub(super) struct CreateEvaluationRequest {
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedEvaluation {
    id: i64,
    negotiator_cedula: String,
    created_at: DateTime<Utc>,
    /// `null` records that no indicator data existed at creation time.
    overall_score: Option<f64>,
    feedback: String,
    kpi_lines: Vec<KpiLine>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedSerEvaluation {
    id: i64,
    negotiator_cedula: String,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    ratings: SerRatings,
    promedio: f64,
}

pub(super) async fn create_evaluation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
    Path(cedula): Path<String>,
    Json(body): Json<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedEvaluation>>), Rejection> {
    let leader_id = require_leader(&viewer)?;
    let negotiator = resolve_negotiator(&state.pool, &cedula, leader_id, &req_id.0).await?;
    let db_err = |e: vg360_db::DbError| map_db_error(req_id.0.clone(), &e);

    let (overall_score, _) = hacer_for(
        &state.pool,
        negotiator.id,
        Utc::now().date_naive(),
        state.scoring.hacer_lookback_days,
    )
    .await
    .map_err(db_err)?;

    let catalog: Vec<KpiDefinition> = vg360_db::list_kpis(&state.pool)
        .await
        .map_err(db_err)?
        .iter()
        .filter_map(|row| match row.to_definition() {
            Ok(def) => Some(def),
            Err(e) => {
                tracing::warn!(kpi = %row.name, error = %e, "skipping KPI with unknown type");
                None
            }
        })
        .collect();
    let latest = vg360_db::get_latest_snapshot(&state.pool, negotiator.id)
        .await
        .map_err(db_err)?;

    let new = NewEvaluation {
        negotiator_id: negotiator.id,
        evaluator_id: leader_id,
        overall_score,
        feedback: body.feedback.unwrap_or_default().trim().to_owned(),
        kpi_lines: build_kpi_lines(&catalog, latest.as_ref()),
    };
    let row = vg360_db::create_evaluation(&state.pool, &new, state.scoring.evaluation_cooldown_secs)
        .await
        .map_err(db_err)?;

    tracing::info!(
        negotiator = %negotiator.cedula,
        evaluation_id = row.id,
        overall_score = ?row.overall_score,
        kpi_lines = new.kpi_lines.len(),
        "evaluation created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CreatedEvaluation {
                id: row.id,
                negotiator_cedula: negotiator.cedula,
                created_at: row.created_at,
                overall_score: row.overall_score,
                feedback: row.feedback,
                kpi_lines: new.kpi_lines,
            },
            req_id.0,
        )),
    ))
}

pub(super) async fn create_ser_evaluation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<Viewer>,
    Path(cedula): Path<String>,
    Json(ratings): Json<SerRatings>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedSerEvaluation>>), Rejection> {
    let leader_id = require_leader(&viewer)?;
    let negotiator = resolve_negotiator(&state.pool, &cedula, leader_id, &req_id.0).await?;

    let row = vg360_db::create_ser_evaluation(
        &state.pool,
        negotiator.id,
        leader_id,
        &ratings,
        state.scoring.evaluation_cooldown_secs,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        negotiator = %negotiator.cedula,
        ser_evaluation_id = row.id,
        "ser evaluation created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CreatedSerEvaluation {
                id: row.id,
                negotiator_cedula: negotiator.cedula,
                created_at: row.created_at,
                ratings: row.ratings(),
                promedio: row.average(),
            },
            req_id.0,
        )),
    ))
}
