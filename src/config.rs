//! Generator configuration.

use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticsLevel;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Package prefix searched for controllers; empty means everything.
    pub scan_scope: String,
    pub entity_scope: String,
    pub repository_scope: String,
    pub rest_base_path: String,
    pub dates_as_string: bool,
    pub implicit_nullable: DiagnosticsLevel,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub enabled: bool,
    pub configurer_superclass: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            scan_scope: String::new(),
            entity_scope: String::new(),
            repository_scope: String::new(),
            rest_base_path: "/api".to_string(),
            dates_as_string: false,
            implicit_nullable: DiagnosticsLevel::Warn,
            security: SecurityConfig::default(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            configurer_superclass: "WebSecurityConfigurerAdapter".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// `rest_base_path` without a trailing slash; `""` for the root.
    pub fn base_path(&self) -> &str {
        self.rest_base_path.trim_end_matches('/')
    }

    pub fn with_implicit_nullable(mut self, level: &str) -> Result<Self, ConfigError> {
        self.implicit_nullable = DiagnosticsLevel::from_str(level)
            .ok_or_else(|| ConfigError::InvalidLevel(level.to_string()))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_json("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.base_path(), "/api");
        assert!(config.security.enabled);
    }

    #[test]
    fn test_partial_json() {
        let config = GeneratorConfig::from_json(
            r#"{"entity_scope": "com.example", "implicit_nullable": "error", "security": {"enabled": false}}"#,
        )
        .unwrap();
        assert_eq!(config.entity_scope, "com.example");
        assert_eq!(config.implicit_nullable, DiagnosticsLevel::Error);
        assert!(!config.security.enabled);
        assert_eq!(config.security.configurer_superclass, "WebSecurityConfigurerAdapter");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            GeneratorConfig::from_json("{\"dates_as_string\": 3}"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_with_implicit_nullable() {
        let config = GeneratorConfig::default().with_implicit_nullable("ALLOW").unwrap();
        assert_eq!(config.implicit_nullable, DiagnosticsLevel::Allow);
        assert!(GeneratorConfig::default().with_implicit_nullable("loud").is_err());
    }

    #[test]
    fn test_base_path_trailing_slash() {
        let config = GeneratorConfig {
            rest_base_path: "/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.base_path(), "");
    }
}
