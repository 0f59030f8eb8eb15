use crate::app_config::{AppConfig, Environment, ScoringSettings};
use crate::ConfigError;

/// Upper bound for `VG360_EVALUATION_COOLDOWN_SECS`: one year.
const MAX_EVALUATION_COOLDOWN_SECS: u64 = 365 * 24 * 60 * 60;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("VG360_ENV", "development"))?;
    let bind_addr = parse_addr("VG360_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("VG360_LOG_LEVEL", "info");
    let kpis_path = PathBuf::from(or_default("VG360_KPIS_PATH", "./config/kpis.yaml"));

    let db_max_connections = parse_u32("VG360_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("VG360_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("VG360_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let hacer_lookback_days = parse_u32("VG360_HACER_LOOKBACK_DAYS", "30")?;
    if hacer_lookback_days == 0 {
        return Err(invalid(
            "VG360_HACER_LOOKBACK_DAYS",
            "must be at least 1".to_string(),
        ));
    }

    let target_raw = or_default("VG360_COMPLIANCE_TARGET_PCT", "70");
    let compliance_target_pct = target_raw
        .parse::<f64>()
        .map_err(|e| invalid("VG360_COMPLIANCE_TARGET_PCT", e.to_string()))?;
    if !(0.0..=100.0).contains(&compliance_target_pct) {
        return Err(invalid(
            "VG360_COMPLIANCE_TARGET_PCT",
            format!("must be within 0-100, got {target_raw}"),
        ));
    }

    let evaluation_cooldown_secs = parse_u64("VG360_EVALUATION_COOLDOWN_SECS", "300")?;
    if evaluation_cooldown_secs > MAX_EVALUATION_COOLDOWN_SECS {
        return Err(invalid(
            "VG360_EVALUATION_COOLDOWN_SECS",
            format!("must be at most {MAX_EVALUATION_COOLDOWN_SECS}"),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        kpis_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scoring: ScoringSettings {
            hacer_lookback_days,
            compliance_target_pct,
            evaluation_cooldown_secs,
        },
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VG360_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
