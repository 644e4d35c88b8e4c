//! Runtime configuration.

use std::time::Duration;

use eventide_core::error::DomainError;

/// Environment variable holding the parallel-event cap.
pub const MAX_PARALLEL_VAR: &str = "EVENTIDE_MAX_PARALLEL";
/// Environment variable holding the timeline polling interval in milliseconds.
pub const FRAME_INTERVAL_VAR: &str = "EVENTIDE_FRAME_INTERVAL_MS";

/// Tunables of the trigger and execution manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of concurrently running parallel-trigger events.
    pub max_parallel: usize,
    /// How often a timeline track polls the player.
    pub frame_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl RuntimeConfig {
    /// Reads the configuration from the process environment, falling back to
    /// the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a variable is set but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_parallel = match lookup(MAX_PARALLEL_VAR) {
            Some(raw) => parse_number(MAX_PARALLEL_VAR, &raw)?,
            None => defaults.max_parallel,
        };
        let frame_interval = match lookup(FRAME_INTERVAL_VAR) {
            Some(raw) => match parse_number(FRAME_INTERVAL_VAR, &raw)? {
                0 => {
                    return Err(DomainError::Validation(format!(
                        "{FRAME_INTERVAL_VAR} must be greater than zero"
                    )));
                }
                ms => Duration::from_millis(ms),
            },
            None => defaults.frame_interval,
        };

        Ok(Self {
            max_parallel,
            frame_interval,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, DomainError> {
    raw.trim().parse().map_err(|_| {
        DomainError::Validation(format!("{key} must be a non-negative integer, got {raw:?}"))
    })
}
