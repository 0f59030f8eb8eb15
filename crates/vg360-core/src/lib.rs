pub mod aggregation;
pub mod app_config;
pub mod config;
pub mod evaluations;
pub mod export;
pub mod indicators;
pub mod ingest;
pub mod kpis;
pub mod period;
pub mod roles;
pub mod scoring;

pub use aggregation::{
    desempeno, leader_summary, negotiator_drilldown, sort_rows, ComplianceMetrics,
    FieldAverages, LeaderIdentity, LeaderSummaryOptions, LeaderSummaryRow, NegotiatorDrilldownRow,
    NegotiatorIdentity, SortDirection, SortField, Sortable,
};
pub use app_config::{AppConfig, Environment, ScoringSettings};
pub use config::{load_app_config, load_app_config_from_env};
pub use evaluations::{
    build_kpi_lines, evaluation_status, is_within_cooldown, pending_evaluations, EvaluationStatus,
    KpiLine, NegotiatorEvaluationState, PendingEvaluation, STALE_AFTER_DAYS,
};
pub use export::{write_leader_summary_csv, EvaluationReport, ReportKpi, LEADER_SUMMARY_HEADERS};
pub use indicators::{IndicatorField, IndicatorSnapshot};
pub use ingest::{parse_indicator_csv, IndicatorImportRow};
pub use kpis::{load_kpis, KpiDefinition, KpiType, KpisFile};
pub use period::{
    days_before, resolve_range, DateRange, HalfYear, RangeQuery, DEFAULT_WINDOW_DAYS,
};
pub use roles::{Role, Viewer};
pub use scoring::{
    composite_score, hacer_score, hacer_score_since, round2, ScoreBreakdown, SerRatings,
    DEFAULT_HACER_PERIOD_DAYS,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read KPI catalog at {path}: {source}")]
    KpisFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse KPI catalog: {0}")]
    KpisFileParse(#[source] serde_yaml::Error),
    #[error("KPI catalog validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid KPI type: {0}")]
    InvalidKpiType(String),
    #[error("rating for {dimension} must be between 1 and 5, got {value}")]
    RatingOutOfRange { dimension: &'static str, value: i16 },
    #[error("value {value} for KPI '{kpi}' is outside [{min}, {max}]")]
    KpiValueOutOfBounds {
        kpi: String,
        value: f64,
        min: f64,
        max: f64,
    },
}
