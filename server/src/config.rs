use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::warn;

use crate::logic::MinePlacement;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Idle time after which a game actor stops itself.
    pub inactivity_timeout: Duration,
    pub cleanup_interval: Duration,
    /// Number of recent command ids each actor remembers for deduplication.
    pub dedup_window: usize,
    pub mine_placement: MinePlacement,
    /// Rebuild an expired game from its journal instead of starting over.
    pub restore_on_reactivation: bool,
    /// How long the journal of an evicted game is kept before it is purged.
    pub journal_retention: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(86400),
            cleanup_interval: Duration::from_secs(60),
            dedup_window: 1024,
            mine_placement: MinePlacement::Anywhere,
            restore_on_reactivation: true,
            journal_retention: Duration::from_secs(7 * 86400),
            cors_allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let inactivity_secs = env_or(
            "GAME_INACTIVITY_TIMEOUT_SECONDS",
            defaults.inactivity_timeout.as_secs(),
        );
        let cleanup_secs = env_or(
            "CLEANUP_INTERVAL_SECONDS",
            defaults.cleanup_interval.as_secs(),
        );
        let retention_secs = env_or(
            "JOURNAL_RETENTION_SECONDS",
            defaults.journal_retention.as_secs(),
        );
        let allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());

        Self {
            inactivity_timeout: Duration::from_secs(inactivity_secs),
            // a zero period would make the sweep spin
            cleanup_interval: Duration::from_secs(cleanup_secs.max(1)),
            dedup_window: env_or("DEDUP_WINDOW", defaults.dedup_window),
            mine_placement: env_or("MINE_PLACEMENT", defaults.mine_placement),
            restore_on_reactivation: env_or(
                "RESTORE_ON_REACTIVATION",
                defaults.restore_on_reactivation,
            ),
            journal_retention: Duration::from_secs(retention_secs),
            cors_allowed_origins: parse_origins(&allowed_origins),
        }
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|e| {
            warn!("Ignoring invalid {}={:?} ({}), using {}", name, value, e, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();

        assert_eq!(settings.inactivity_timeout, Duration::from_secs(24 * 60 * 60));
        assert_eq!(settings.cleanup_interval, Duration::from_secs(60));
        assert_eq!(settings.dedup_window, 1024);
        assert_eq!(settings.mine_placement, MinePlacement::Anywhere);
        assert!(settings.restore_on_reactivation);
        assert_eq!(settings.journal_retention, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(settings.cors_allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn origins_are_trimmed_and_split() {
        assert_eq!(
            parse_origins(" https://a.test, ,https://b.test "),
            vec!["https://a.test", "https://b.test"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn unset_variable_falls_back_to_default() {
        assert_eq!(env_or("MINESWEEPER_TEST_SURELY_UNSET", 42u64), 42);
    }
}
