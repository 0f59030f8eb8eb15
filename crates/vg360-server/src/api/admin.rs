//! Administrator views: leader summary, per-leader drill-down, and the
//! spreadsheet export of the summary.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use vg360_core::{
    leader_summary, negotiator_drilldown, resolve_range, sort_rows, write_leader_summary_csv,
    DateRange, LeaderIdentity, LeaderSummaryOptions, LeaderSummaryRow, NegotiatorDrilldownRow,
    RangeQuery, Role, SortDirection, SortField,
};

use crate::middleware::RequestId;

use super::{map_db_error, require_admin, ApiError, ApiResponse, AppState, Rejection};

/// Range selectors plus sorting, as sent by the admin dashboard.
#[derive(Debug, Default, Deserialize)]
pub(super) struct SummaryQuery {
    pub desde: Option<String>,
    pub hasta: Option<String>,
    pub anio: Option<String>,
    pub semestre: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub include_empty: Option<String>,
}

struct SummaryParams {
    range: DateRange,
    sort: SortField,
    dir: SortDirection,
    include_empty: bool,
}

impl SummaryQuery {
    fn resolve(&self, today: NaiveDate) -> SummaryParams {
        let range = resolve_range(
            &RangeQuery {
                desde: self.desde.clone(),
                hasta: self.hasta.clone(),
                anio: self.anio.clone(),
                semestre: self.semestre.clone(),
            },
            today,
        );
        SummaryParams {
            range,
            sort: SortField::parse_lenient(self.sort.as_deref()),
            dir: SortDirection::parse_lenient(self.dir.as_deref()),
            include_empty: matches!(
                self.include_empty.as_deref().map(str::trim),
                Some("1" | "true" | "yes")
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LeaderSummaryData {
    range: DateRange,
    sort: SortField,
    dir: SortDirection,
    rows: Vec<LeaderSummaryRow>,
}

#[derive(Debug, Serialize)]
pub(super) struct DrilldownData {
    leader: LeaderIdentity,
    range: DateRange,
    sort: SortField,
    dir: SortDirection,
    rows: Vec<NegotiatorDrilldownRow>,
}

async fn summary_rows(
    state: &AppState,
    params: &SummaryParams,
    request_id: &str,
) -> Result<Vec<LeaderSummaryRow>, ApiError> {
    let inputs = vg360_db::load_leader_summary_inputs(&state.pool, params.range)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?;

    let mut rows = leader_summary(
        &inputs.leaders,
        &inputs.negotiators,
        &inputs.snapshots,
        &inputs.evaluated,
        params.range,
        &LeaderSummaryOptions {
            include_without_data: params.include_empty,
            compliance_target_pct: state.scoring.compliance_target_pct,
        },
    );
    sort_rows(&mut rows, params.sort, params.dir);
    Ok(rows)
}

pub(super) async fn list_leaders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<vg360_core::Viewer>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ApiResponse<LeaderSummaryData>>, Rejection> {
    require_admin(&viewer)?;
    let params = query.resolve(Utc::now().date_naive());
    let rows = summary_rows(&state, &params, &req_id.0).await?;

    Ok(Json(ApiResponse::new(
        LeaderSummaryData {
            range: params.range,
            sort: params.sort,
            dir: params.dir,
            rows,
        },
        req_id.0,
    )))
}

pub(super) async fn leader_negotiators(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<vg360_core::Viewer>,
    Path(cedula): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ApiResponse<DrilldownData>>, Rejection> {
    require_admin(&viewer)?;
    let params = query.resolve(Utc::now().date_naive());
    let db_err = |e: vg360_db::DbError| map_db_error(req_id.0.clone(), &e);

    let leader = vg360_db::get_user_by_cedula(&state.pool, &cedula)
        .await
        .map_err(db_err)?
        .filter(|u| u.role == Role::Leader.as_str() && !u.is_superuser);
    let Some(leader) = leader else {
        return Err(ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("leader '{cedula}' not found"),
        )
        .into());
    };

    let inputs = vg360_db::load_drilldown_inputs(&state.pool, leader.id, params.range)
        .await
        .map_err(db_err)?;
    let mut rows =
        negotiator_drilldown(&inputs.team, &inputs.snapshots, &inputs.evaluated, params.range);
    sort_rows(&mut rows, params.sort, params.dir);

    Ok(Json(ApiResponse::new(
        DrilldownData {
            leader: leader.leader_identity(),
            range: params.range,
            sort: params.sort,
            dir: params.dir,
            rows,
        },
        req_id.0,
    )))
}

/// `resumen_lideres_<start>_<end>.csv` with one row per leader.
pub(super) async fn export_leaders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(viewer): Extension<vg360_core::Viewer>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, Rejection> {
    require_admin(&viewer)?;
    let params = query.resolve(Utc::now().date_naive());
    let rows = summary_rows(&state, &params, &req_id.0).await?;

    let body = render_csv(&rows).map_err(|e| {
        tracing::error!(error = %e, "leader summary export failed");
        ApiError::new(
            req_id.0.clone(),
            "export_failed",
            "could not render the leader summary",
        )
    })?;

    let disposition = format!(
        "attachment; filename=\"resumen_lideres_{}.csv\"",
        params.range.slug()
    );
    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

fn render_csv(rows: &[LeaderSummaryRow]) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_leader_summary_csv(rows, &mut buf)?;
    Ok(buf)
}
