//! Application-level configuration loading: avatars, grades, distance labels and timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::scoring::Distance;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCHERY_SCORE_BACK_CONFIG_PATH";
const DEFAULT_COMPLETION_DELAY_MS: u64 = 500;
const DEFAULT_RECENT_LIMIT: usize = 20;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 30 * 60;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;

/// Display labels for the two shooting distances.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DistanceLabels {
    pub near: String,
    pub far: String,
}

impl DistanceLabels {
    /// Label shown for `distance`.
    pub fn label(&self, distance: Distance) -> &str {
        match distance {
            Distance::Near => &self.near,
            Distance::Far => &self.far,
        }
    }
}

impl Default for DistanceLabels {
    fn default() -> Self {
        Self {
            near: "10m".into(),
            far: "15m".into(),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    avatars: Vec<String>,
    grades: Vec<String>,
    labels: DistanceLabels,
    completion_delay: Duration,
    recent_limit: usize,
    session_idle_ttl: Duration,
    session_sweep_interval: Duration,
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
                        avatars = app_config.avatars.len(),
                        grades = app_config.grades.len(),
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

    /// Avatar glyphs a player may pick from.
    pub fn avatars(&self) -> &[String] {
        &self.avatars
    }

    /// Avatar assigned when a player does not choose one.
    pub fn default_avatar(&self) -> &str {
        self.avatars.first().map(String::as_str).unwrap_or("🏹")
    }

    /// Grades a player may be registered under.
    pub fn grades(&self) -> &[String] {
        &self.grades
    }

    pub fn labels(&self) -> &DistanceLabels {
        &self.labels
    }

    /// Pause between the last reward acknowledgment and the completion signal.
    pub fn completion_delay(&self) -> Duration {
        self.completion_delay
    }

    /// Number of results returned by the recent-scores listing when no limit is given.
    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// How long a session may go without any action before it is abandoned.
    pub fn session_idle_ttl(&self) -> Duration {
        self.session_idle_ttl
    }

    /// Period of the idle-session sweep.
    pub fn session_sweep_interval(&self) -> Duration {
        self.session_sweep_interval
    }

    /// Override the completion delay, mostly useful for tests.
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            avatars: default_avatars(),
            grades: default_grades(),
            labels: DistanceLabels::default(),
            completion_delay: Duration::from_millis(DEFAULT_COMPLETION_DELAY_MS),
            recent_limit: DEFAULT_RECENT_LIMIT,
            session_idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS),
            session_sweep_interval: Duration::from_secs(DEFAULT_SESSION_SWEEP_SECS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    avatars: Vec<String>,
    grades: Vec<String>,
    distance_labels: Option<DistanceLabels>,
    completion_delay_ms: Option<u64>,
    recent_limit: Option<usize>,
    session_idle_ttl_secs: Option<u64>,
    session_sweep_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            avatars: non_empty_or(value.avatars, defaults.avatars),
            grades: non_empty_or(value.grades, defaults.grades),
            labels: value.distance_labels.unwrap_or(defaults.labels),
            completion_delay: value
                .completion_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.completion_delay),
            recent_limit: value
                .recent_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.recent_limit),
            session_idle_ttl: positive_secs(value.session_idle_ttl_secs)
                .unwrap_or(defaults.session_idle_ttl),
            session_sweep_interval: positive_secs(value.session_sweep_secs)
                .unwrap_or(defaults.session_sweep_interval),
        }
    }
}

fn positive_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|secs| *secs > 0).map(Duration::from_secs)
}

fn non_empty_or(values: Vec<String>, fallback: Vec<String>) -> Vec<String> {
    let values: Vec<String> = values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    if values.is_empty() { fallback } else { values }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn default_avatars() -> Vec<String> {
    [
        "🏹", "🎯", "⭐", "🦅", "🐺", "🦁", "🔥", "❄️", "⚡", "🌟", "🏆", "💎",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_grades() -> Vec<String> {
    (3..=12)
        .map(|grade| format!("{}{} Grade", grade, ordinal_suffix(grade)))
        .chain(std::iter::once("Adult".to_string()))
        .collect()
}

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_school_grades_and_adults() {
        let config = AppConfig::default();
        assert_eq!(config.grades().first().map(String::as_str), Some("3rd Grade"));
        assert!(config.grades().iter().any(|g| g == "11th Grade"));
        assert_eq!(config.grades().last().map(String::as_str), Some("Adult"));
        assert_eq!(config.default_avatar(), "🏹");
        assert_eq!(config.recent_limit(), 20);
        assert_eq!(config.completion_delay(), Duration::from_millis(500));
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(1800));
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "grades": ["Open"], "completion_delay_ms": 0 }"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.grades(), ["Open".to_string()]);
        assert_eq!(config.avatars().len(), 12);
        assert_eq!(config.labels().label(Distance::Far), "15m");
        assert_eq!(config.completion_delay(), Duration::ZERO);
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn zero_session_timings_fall_back_to_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "session_idle_ttl_secs": 0, "session_sweep_secs": 5 }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.session_idle_ttl(), Duration::from_secs(1800));
        assert_eq!(config.session_sweep_interval(), Duration::from_secs(5));
    }
}
