//! Configuration for the approval pipeline.

use serde::{Deserialize, Serialize};

use indicators::DEFAULT_ELIGIBILITY_THRESHOLD;
use verification::TaskKind;

use crate::types::{PipelineError, Result};

/// Longest session lifetime accepted (one week).
pub const MAX_SESSION_TTL_SECS: u64 = 7 * 24 * 3600;

/// Configuration for an approval pipeline instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Scoring configuration
    pub scoring: ScoringConfig,
    /// Verification configuration
    pub verification: VerificationConfig,
    /// Authority configuration
    pub authority: AuthorityConfig,
    /// Event delivery configuration
    pub events: EventsConfig,
    /// Audit trail configuration
    pub audit: AuditConfig,
}

impl PipelineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// The threshold's upper bound depends on the catalog and is checked when
    /// the service is built.
    pub fn validate(&self) -> Result<()> {
        if self.scoring.eligibility_threshold == 0 {
            return Err(PipelineError::Config(
                "scoring.eligibility_threshold must be positive".to_string(),
            ));
        }
        if self.verification.required_kinds.is_empty() {
            return Err(PipelineError::Config(
                "verification.required_kinds must name at least one task kind".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(PipelineError::Config(
                "events.channel_capacity must be positive".to_string(),
            ));
        }
        let ttl = self.authority.session_ttl_secs;
        if ttl == 0 || ttl > MAX_SESSION_TTL_SECS {
            return Err(PipelineError::Config(format!(
                "authority.session_ttl_secs must be between 1 and {MAX_SESSION_TTL_SECS}, got {ttl}"
            )));
        }
        Ok(())
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Totals strictly below this are recommended eligible
    pub eligibility_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            eligibility_threshold: DEFAULT_ELIGIBILITY_THRESHOLD,
        }
    }
}

/// Verification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Task kinds that must be submitted positive before an application is verified
    pub required_kinds: Vec<TaskKind>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            required_kinds: vec![TaskKind::Village],
        }
    }
}

/// Authority configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Refuse callers whose second factor is not verified
    pub require_second_factor: bool,
    /// Session lifetime (seconds)
    pub session_ttl_secs: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            require_second_factor: true,
            session_ttl_secs: 8 * 3600, // one working day
        }
    }
}

/// Event delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Audit trail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Maximum entries retained before the oldest are pruned
    pub max_entries: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.eligibility_threshold, 70);
        assert_eq!(config.verification.required_kinds, vec![TaskKind::Village]);
        assert!(config.authority.require_second_factor);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = PipelineConfig::from_yaml(
            "scoring:\n  eligibility_threshold: 60\nverification:\n  required_kinds: [village, committee]\n",
        )
        .unwrap();
        assert_eq!(config.scoring.eligibility_threshold, 60);
        assert_eq!(
            config.verification.required_kinds,
            vec![TaskKind::Village, TaskKind::Committee]
        );
        assert_eq!(config.events.channel_capacity, 256);
        assert_eq!(config.audit.max_entries, 10_000);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = PipelineConfig::default();
        config.scoring.eligibility_threshold = 0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = PipelineConfig::default();
        config.verification.required_kinds.clear();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.events.channel_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.authority.session_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_ttl_upper_bound() {
        let mut config = PipelineConfig::default();
        config.authority.session_ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());

        config.authority.session_ttl_secs = MAX_SESSION_TTL_SECS + 1;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let err = PipelineConfig::from_yaml("authority:\n  session_ttl_secs: 1000000000000000\n")
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_threshold_not_capped_by_config() {
        let mut config = PipelineConfig::default();
        config.scoring.eligibility_threshold = 150;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip_preserves_threshold() {
        let mut config = PipelineConfig::default();
        config.scoring.eligibility_threshold = 55;
        let yaml = config.to_yaml().unwrap();
        let parsed = PipelineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.scoring.eligibility_threshold, 55);
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = PipelineConfig::from_yaml("scoring: [").unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
