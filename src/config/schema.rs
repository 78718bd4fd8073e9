//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::store::IdStrategy;

/// Root configuration for the resource service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Entry store settings.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,

    /// Behaviour of the mounted resources.
    pub resources: ResourcesConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed per request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Entry store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How fresh ids are generated: "sequential" or "uuid".
    pub id_strategy: IdStrategy,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,

    /// Emit `X-Decision-Trace` headers with the visited graph nodes.
    pub decision_trace: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
            decision_trace: false,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `x-content-type-options` and `x-frame-options` to every response.
    pub enable_headers: bool,

    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Behaviour of the mounted resources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// PUT to an unknown entry id creates it.
    pub allow_put_create: bool,

    /// POST to the collection answers 303 instead of 201.
    pub post_redirect: bool,

    /// Granularity of the clock resource, in seconds.
    pub clock_granularity_secs: u64,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            allow_put_create: true,
            post_redirect: false,
            clock_granularity_secs: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.store.id_strategy, IdStrategy::Sequential);
        assert!(config.resources.allow_put_create);
        assert_eq!(config.observability.log_format, LogFormat::Full);
    }

    #[test]
    fn test_partial_sections() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [store]
            id_strategy = "uuid"

            [observability]
            log_format = "compact"
            decision_trace = true

            [resources]
            post_redirect = true
            "#,
        )
        .unwrap();
        assert_eq!(config.store.id_strategy, IdStrategy::Uuid);
        assert_eq!(config.observability.log_format, LogFormat::Compact);
        assert!(config.observability.decision_trace);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.resources.post_redirect);
        assert!(config.resources.allow_put_create);
    }
}
