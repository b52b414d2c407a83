//! # Lifecycle Configuration
//!
//! Tunables for the time-driven guards, loaded from YAML. Every field has a
//! default, so an empty document is a valid configuration.
//!
//! ```yaml
//! webhook:
//!   retry_policy:
//!     kind: exponential
//!     base_secs: 60
//!     factor: 2
//!     max_secs: 3600
//! workflow:
//!   timeout_secs: 3600
//! ```

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::webhook::RetryPolicy;

/// Default run-time limit for a workflow execution: one hour.
pub const DEFAULT_WORKFLOW_TIMEOUT_SECS: u32 = 3600;

/// Errors from loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The document is not valid YAML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but a value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Webhook delivery settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebhookConfig {
    /// Delay between delivery attempts.
    pub retry_policy: RetryPolicy,
}

/// Workflow execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Maximum run time before a RUNNING execution times out.
    pub timeout_secs: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_WORKFLOW_TIMEOUT_SECS,
        }
    }
}

impl WorkflowConfig {
    /// The timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::seconds(i64::from(self.timeout_secs))
    }
}

/// Top-level lifecycle configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Webhook delivery settings.
    pub webhook: WebhookConfig,
    /// Workflow execution settings.
    pub workflow: WorkflowConfig,
}

impl LifecycleConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty, comment-only or marker-only document is YAML null, not an
        // empty map.
        let blank = text.lines().map(str::trim).all(|line| {
            line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
        });
        if blank {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded lifecycle config");
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.webhook
            .retry_policy
            .validate()
            .map_err(ConfigError::Invalid)?;
        if self.workflow.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "workflow timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = LifecycleConfig::from_yaml_str("").unwrap();
        assert_eq!(config, LifecycleConfig::default());
        assert_eq!(
            LifecycleConfig::from_yaml_str("# nothing here\n").unwrap(),
            config
        );
        assert_eq!(config.webhook.retry_policy, RetryPolicy::Fixed { delay_secs: 300 });
        assert_eq!(config.workflow.timeout(), Duration::hours(1));
    }

    #[test]
    fn test_marker_only_document_uses_defaults() {
        for text in ["---\n", "---\n...\n", "# lifecycle\n---\n", "...\n"] {
            assert_eq!(
                LifecycleConfig::from_yaml_str(text).unwrap(),
                LifecycleConfig::default(),
                "document {text:?}"
            );
        }
        let config = LifecycleConfig::from_yaml_str("---\nworkflow:\n  timeout_secs: 60\n").unwrap();
        assert_eq!(config.workflow.timeout_secs, 60);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config = LifecycleConfig::from_yaml_str("workflow:\n  timeout_secs: 120\n").unwrap();
        assert_eq!(config.workflow.timeout_secs, 120);
        assert_eq!(config.webhook, WebhookConfig::default());
    }

    #[test]
    fn test_exponential_policy() {
        let yaml = "webhook:\n  retry_policy:\n    kind: exponential\n    base_secs: 60\n    factor: 2\n    max_secs: 3600\n";
        let config = LifecycleConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.webhook.retry_policy,
            RetryPolicy::Exponential {
                base_secs: 60,
                factor: 2,
                max_secs: 3600
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = "webhook:\n  retry_policy:\n    kind: exponential\n    base_secs: 0\n    factor: 2\n    max_secs: 10\n";
        assert!(matches!(
            LifecycleConfig::from_yaml_str(yaml),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LifecycleConfig::from_yaml_str("workflow:\n  timeout_secs: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            LifecycleConfig::from_yaml_str("webhooks: {}\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle.yaml");
        std::fs::write(&path, "workflow:\n  timeout_secs: 90\n").unwrap();
        assert_eq!(LifecycleConfig::load(&path).unwrap().workflow.timeout_secs, 90);
        assert!(matches!(
            LifecycleConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
