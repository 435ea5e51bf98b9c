//! Process-wide configuration, built once at start and threaded through
//! every constructor — the "global-ish settings" design note from the
//! engine's redesign flags: no ambient statics, just an `Arc<KingpinConfig>`
//! passed down from the Runner.

use std::sync::Arc;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

fn default_timeout_secs() -> u64 {
    3600
}

fn default_group_timeout_secs() -> u64 {
    0
}

/// Feature flags for enabling or disabling ambient functionality.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FeatureFlags {
    /// Enable metrics collection via the `metrics` crate.
    #[serde(default)]
    pub enable_metrics: bool,
    /// Enable verbose tracing spans around actor execution.
    #[serde(default)]
    pub enable_tracing: bool,
}

/// Engine-wide configuration, sourced from an optional config file and the
/// process environment (§6: `DEFAULT_TIMEOUT`, `SKIP_DRY`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KingpinConfig {
    /// Default per-actor timeout in seconds (`DEFAULT_TIMEOUT`), used when
    /// a node's `timeout` option is absent.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    /// Default timeout for group actors, which disable timeouts by default.
    #[serde(default = "default_group_timeout_secs")]
    pub default_group_timeout_secs: u64,
    /// If set, the Runner skips the rehearsal pass entirely (`SKIP_DRY`).
    #[serde(default)]
    pub skip_dry: bool,
    /// Feature flags.
    #[serde(default)]
    pub features: FeatureFlags,
}

impl Default for KingpinConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            default_group_timeout_secs: default_group_timeout_secs(),
            skip_dry: false,
            features: FeatureFlags::default(),
        }
    }
}

impl KingpinConfig {
    /// Loads configuration from an optional `kingpin.toml`/`kingpin.yaml`
    /// file in the working directory, layered under environment variables
    /// prefixed `KINGPIN_` and the two bare variables named in §6.
    pub fn load() -> Result<Arc<Self>, ConfigError> {
        let mut builder = Config::builder()
            .set_default("default_timeout_secs", default_timeout_secs())?
            .set_default("default_group_timeout_secs", default_group_timeout_secs())?
            .set_default("skip_dry", false)?
            .add_source(File::with_name("kingpin").required(false))
            .add_source(Environment::with_prefix("KINGPIN"));

        if let Ok(raw) = std::env::var("DEFAULT_TIMEOUT") {
            if let Ok(secs) = raw.parse::<u64>() {
                builder = builder.set_override("default_timeout_secs", secs)?;
            }
        }
        if let Ok(raw) = std::env::var("SKIP_DRY") {
            builder = builder.set_override("skip_dry", is_truthy(&raw))?;
        }

        let config = builder.build()?;
        Ok(Arc::new(config.try_deserialize()?))
    }

    /// The default per-actor timeout as a [`Duration`]; `0` disables it.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// The default timeout for group actors; `0` disables it.
    pub fn default_group_timeout(&self) -> Duration {
        Duration::from_secs(self.default_group_timeout_secs)
    }
}

/// Parses the truthy strings recognized for `condition` and
/// `warn_on_failure`: `false`, `0`, `"0"`, `"false"` (case-insensitive)
/// are falsy, everything else is truthy, matching §4.5.
pub fn is_truthy(raw: &str) -> bool {
    !matches!(raw.trim().to_ascii_lowercase().as_str(), "false" | "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_parsing_matches_condition_rules() {
        assert!(!is_truthy("false"));
        assert!(!is_truthy("FALSE"));
        assert!(!is_truthy("0"));
        assert!(is_truthy(""));
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
    }

    #[test]
    fn default_config_has_one_hour_timeout() {
        let config = KingpinConfig::default();
        assert_eq!(config.default_timeout(), Duration::from_secs(3600));
        assert_eq!(config.default_group_timeout(), Duration::ZERO);
    }
}
