//! Client configuration.
//!
//! # Design
//! A `ClientConfig` can be built in code or loaded from JSON, so hosts that
//! only speak C can hand the client a configuration string. Every field has
//! a default; an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "synchttp/1.0";

/// Timeout applied to every phase (resolve, connect, send, receive).
pub const DEFAULT_TIMEOUT_MS: u32 = 30_000;

/// Session-level settings for an `HttpClient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub timeout_ms: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The configured user agent, or `DEFAULT_USER_AGENT`.
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = ClientConfig::from_json("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn fields_override_defaults() {
        let config = ClientConfig::from_json(r#"{"user_agent":"MyApp/1.0","timeout_ms":500}"#).unwrap();
        assert_eq!(config.user_agent(), "MyApp/1.0");
        assert_eq!(config.timeout_ms, 500);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = ClientConfig::from_json(r#"{"timeout_ms":"soon"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn default_user_agent_is_not_serialized() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap();
        assert!(json.get("user_agent").is_none());
        assert_eq!(json["timeout_ms"], 30_000);
    }
}
