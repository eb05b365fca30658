//! Executor configuration.
//!
//! Built in code with the `with_*` methods, or read from the environment:
//!
//! | Variable                    | Meaning                                  |
//! |-----------------------------|------------------------------------------|
//! | `FABLE_MAX_CALL_DEPTH`      | call nesting limit                       |
//! | `FABLE_MAX_LOOP_ITERATIONS` | loop iterations per run                  |
//! | `FABLE_DEADLINE_MS`         | wall-clock budget per run                |
//! | `FABLE_SLOW_SCRIPT_MS`      | runs at least this long log a warning    |
//!
//! Each takes a non-negative integer or `unlimited`. Unset variables keep
//! the default.

use std::num::ParseIntError;
use std::time::Duration;

use crate::limits::EvalLimits;

pub const ENV_MAX_CALL_DEPTH: &str = "FABLE_MAX_CALL_DEPTH";
pub const ENV_MAX_LOOP_ITERATIONS: &str = "FABLE_MAX_LOOP_ITERATIONS";
pub const ENV_DEADLINE_MS: &str = "FABLE_DEADLINE_MS";
pub const ENV_SLOW_SCRIPT_MS: &str = "FABLE_SLOW_SCRIPT_MS";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: expected a non-negative integer or `unlimited`, got `{value}`")]
    InvalidNumber {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub limits: EvalLimits,
    /// Runs taking at least this long are logged at `warn`. `None` disables
    /// the warning.
    pub slow_script_warn_ms: Option<u64>,
}

impl ExecutorConfig {
    pub const DEFAULT_SLOW_SCRIPT_MS: u64 = 100;

    #[must_use]
    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_slow_script_warn_ms(mut self, ms: Option<u64>) -> Self {
        self.slow_script_warn_ms = ms;
        self
    }

    /// Defaults overridden by the `FABLE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ExecutorConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(depth) = parse_limit(&lookup, ENV_MAX_CALL_DEPTH)? {
            config.limits.max_call_depth =
                depth.map(|d| usize::try_from(d).unwrap_or(usize::MAX));
        }
        if let Some(iterations) = parse_limit(&lookup, ENV_MAX_LOOP_ITERATIONS)? {
            config.limits.max_loop_iterations = iterations;
        }
        if let Some(ms) = parse_limit(&lookup, ENV_DEADLINE_MS)? {
            config.limits.deadline = ms.map(Duration::from_millis);
        }
        if let Some(ms) = parse_limit(&lookup, ENV_SLOW_SCRIPT_MS)? {
            config.slow_script_warn_ms = ms;
        }
        Ok(config)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            limits: EvalLimits::default(),
            slow_script_warn_ms: Some(Self::DEFAULT_SLOW_SCRIPT_MS),
        }
    }
}

/// `None` when unset, `Some(None)` for `unlimited`.
fn parse_limit<F>(lookup: &F, key: &'static str) -> Result<Option<Option<u64>>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.eq_ignore_ascii_case("unlimited") {
        return Ok(Some(None));
    }
    value
        .parse::<u64>()
        .map(|n| Some(Some(n)))
        .map_err(|source| ConfigError::InvalidNumber {
            key,
            value: raw.clone(),
            source,
        })
}
