use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Tunables for the scoring and compliance rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringSettings {
    /// Trailing window, in days, used for the Hacer score.
    pub hacer_lookback_days: u32,
    /// Evaluation completion percentage below which a leader is flagged.
    pub compliance_target_pct: f64,
    /// Minimum age of the previous evaluation before another may be recorded.
    pub evaluation_cooldown_secs: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            hacer_lookback_days: 30,
            compliance_target_pct: 70.0,
            evaluation_cooldown_secs: 300,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub kpis_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scoring: ScoringSettings,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("kpis_path", &self.kpis_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scoring", &self.scoring)
            .finish()
    }
}
