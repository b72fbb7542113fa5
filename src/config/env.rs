//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use crate::models::ExecutionMode;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_SCHEDULER";

/// Overrides read from `SUITE_SCHEDULER_*` variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Mode from SUITE_SCHEDULER_MODE
    pub mode: Option<ExecutionMode>,
    /// Worker count from SUITE_SCHEDULER_WORKERS
    pub workers: Option<i64>,
    /// Drain timeout (seconds) from SUITE_SCHEDULER_DRAIN_TIMEOUT
    pub drain_timeout: Option<u64>,
    /// Rounds from SUITE_SCHEDULER_ROUNDS
    pub rounds: Option<u32>,
    /// Output format from SUITE_SCHEDULER_FORMAT
    pub format: Option<String>,
    /// Log level from SUITE_SCHEDULER_LOG
    pub log_level: Option<String>,
    /// Config file from SUITE_SCHEDULER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, keyed by full variable name
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));
        let parse = |name: &str| get(name).and_then(|v| v.trim().parse().ok());

        Self {
            mode: get("MODE").and_then(|v| ExecutionMode::from_str(&v)),
            workers: parse("WORKERS"),
            drain_timeout: parse("DRAIN_TIMEOUT").and_then(|v: i64| u64::try_from(v).ok()),
            rounds: parse("ROUNDS").and_then(|v: i64| u32::try_from(v).ok()),
            format: get("FORMAT"),
            log_level: get("LOG"),
            config_file: get("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_MODE:          {:?}", ENV_PREFIX, self.mode);
        println!("  {}_WORKERS:       {:?}", ENV_PREFIX, self.workers);
        println!("  {}_DRAIN_TIMEOUT: {:?}", ENV_PREFIX, self.drain_timeout);
        println!("  {}_ROUNDS:        {:?}", ENV_PREFIX, self.rounds);
        println!("  {}_FORMAT:        {:?}", ENV_PREFIX, self.format);
        println!("  {}_LOG:           {:?}", ENV_PREFIX, self.log_level);
        println!("  {}_CONFIG:        {:?}", ENV_PREFIX, self.config_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_environment() {
        let env = EnvConfig::from_lookup(lookup(&[]));
        assert!(!env.has_any());
    }

    #[test]
    fn test_parse_overrides() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("SUITE_SCHEDULER_MODE", "parallel"),
            ("SUITE_SCHEDULER_WORKERS", "-1"),
            ("SUITE_SCHEDULER_DRAIN_TIMEOUT", " 90 "),
            ("SUITE_SCHEDULER_ROUNDS", "5"),
            ("SUITE_SCHEDULER_FORMAT", "csv"),
            ("SUITE_SCHEDULER_LOG", "debug"),
        ]));

        assert!(env.has_any());
        assert_eq!(env.mode, Some(ExecutionMode::Parallel));
        assert_eq!(env.workers, Some(-1));
        assert_eq!(env.drain_timeout, Some(90));
        assert_eq!(env.rounds, Some(5));
        assert_eq!(env.format.as_deref(), Some("csv"));
        assert_eq!(env.log_level.as_deref(), Some("debug"));
        assert_eq!(env.config_file, None);
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("SUITE_SCHEDULER_MODE", "sometimes"),
            ("SUITE_SCHEDULER_WORKERS", "four"),
            ("SUITE_SCHEDULER_DRAIN_TIMEOUT", "-5"),
        ]));
        assert_eq!(env.mode, None);
        assert_eq!(env.workers, None);
        assert_eq!(env.drain_timeout, None);
    }
}
