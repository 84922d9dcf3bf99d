//! Application-level configuration loading, including the scoring curve and
//! the idle-session expiry policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::scoring::ScoringCurve;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVE_QUIZ_BACK_CONFIG_PATH";

/// Extra tolerance past the answer window absorbing client/network latency.
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
/// How long an untouched session survives before the sweep drops it.
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);
/// Cadence of the idle-session sweep.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    grace_period: Duration,
    session_ttl: Duration,
    sweep_interval: Duration,
    scoring: ScoringCurve,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        grace_period_seconds = app_config.grace_period.as_secs(),
                        session_ttl_seconds = app_config.session_ttl.as_secs(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Tolerance added to the answer window for late submissions.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Idle lifetime after which a session is swept away.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Interval between idle-session sweeps.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Scoring curve applied to correct answers.
    pub fn scoring(&self) -> ScoringCurve {
        self.scoring
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            session_ttl: DEFAULT_SESSION_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            scoring: ScoringCurve::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    grace_period_seconds: Option<u64>,
    session_ttl_seconds: Option<u64>,
    sweep_interval_seconds: Option<u64>,
    scoring: Option<RawScoring>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            grace_period: value
                .grace_period_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.grace_period),
            session_ttl: value
                .session_ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            sweep_interval: value
                .sweep_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            scoring: value.scoring.map(Into::into).unwrap_or(defaults.scoring),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
/// JSON representation of the scoring curve selection.
enum RawScoring {
    SpeedFactor,
    SpeedBonus { multiplier: f64 },
}

impl From<RawScoring> for ScoringCurve {
    fn from(value: RawScoring) -> Self {
        match value {
            RawScoring::SpeedFactor => ScoringCurve::SpeedFactor,
            RawScoring::SpeedBonus { multiplier } => ScoringCurve::SpeedBonus { multiplier },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.grace_period(), DEFAULT_GRACE_PERIOD);
        assert_eq!(config.session_ttl(), DEFAULT_SESSION_TTL);
        assert_eq!(config.scoring(), ScoringCurve::SpeedFactor);
    }

    #[test]
    fn scoring_curve_parses_the_tagged_form() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"grace_period_seconds": 5, "scoring": {"curve": "speed_bonus", "multiplier": 0.5}}"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.grace_period(), Duration::from_secs(5));
        assert_eq!(config.scoring(), ScoringCurve::SpeedBonus { multiplier: 0.5 });
    }
}
