//! Answer set and layered resolution
//!
//! Answers come from three layers. From lowest to highest precedence:
//! the static defaults, the configuration saved by a previous run, and the
//! answers given in this run.

use crate::error::{Result, StarterError};
use serde::{Deserialize, Serialize};

/// Resolved generator answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Manage PHP dependencies with Composer
    pub composer: bool,

    /// Selected Drupal release
    pub drupal_version: String,

    /// Whether the site uses the Features module
    pub features: bool,

    /// Theme machine name
    pub drupal_theme: String,

    /// Download and unpack a fresh copy of Drupal core
    pub install_drupal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            composer: true,
            drupal_version: String::new(),
            features: true,
            drupal_theme: "gesso".to_string(),
            install_drupal: false,
        }
    }
}

impl Config {
    /// Resolve the three layers into a complete answer set
    pub fn resolve(defaults: Config, saved: &PartialConfig, answers: &PartialConfig) -> Config {
        answers.over(saved.over(defaults))
    }

    /// Check the invariants a persisted answer set must hold
    pub fn validate(&self) -> Result<()> {
        validate_theme_name(&self.drupal_theme).map_err(|e| StarterError::Validation(e.into()))
    }
}

/// A layer of answers where any question may be unanswered
///
/// The saved config file deserializes into this type, so a file written by
/// an older generator with fewer keys still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drupal_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drupal_theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_drupal: Option<bool>,
}

impl PartialConfig {
    /// Apply this layer on top of `base`; answered questions win
    pub fn over(&self, base: Config) -> Config {
        Config {
            composer: self.composer.unwrap_or(base.composer),
            drupal_version: self
                .drupal_version
                .clone()
                .unwrap_or(base.drupal_version),
            features: self.features.unwrap_or(base.features),
            drupal_theme: self.drupal_theme.clone().unwrap_or(base.drupal_theme),
            install_drupal: self.install_drupal.unwrap_or(base.install_drupal),
        }
    }
}

impl From<Config> for PartialConfig {
    fn from(config: Config) -> Self {
        Self {
            composer: Some(config.composer),
            drupal_version: Some(config.drupal_version),
            features: Some(config.features),
            drupal_theme: Some(config.drupal_theme),
            install_drupal: Some(config.install_drupal),
        }
    }
}

/// Theme machine names may be anything except empty
pub fn validate_theme_name(value: &str) -> std::result::Result<(), &'static str> {
    if value.is_empty() {
        Err("Theme name is required")
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.composer);
        assert!(config.features);
        assert!(!config.install_drupal);
        assert_eq!(config.drupal_theme, "gesso");
        assert_eq!(config.drupal_version, "");
    }

    #[test]
    fn test_saved_overrides_defaults() {
        let saved = PartialConfig {
            features: Some(false),
            drupal_theme: Some("saved_theme".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(Config::default(), &saved, &PartialConfig::default());

        assert!(!config.features);
        assert_eq!(config.drupal_theme, "saved_theme");
        assert!(config.composer);
    }

    #[test]
    fn test_answers_override_saved() {
        let saved = PartialConfig {
            drupal_version: Some("8.8.12".to_string()),
            drupal_theme: Some("saved_theme".to_string()),
            ..Default::default()
        };
        let answers = PartialConfig {
            drupal_theme: Some("custom_theme".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(Config::default(), &saved, &answers);

        assert_eq!(config.drupal_theme, "custom_theme");
        assert_eq!(config.drupal_version, "8.8.12");
    }

    #[test]
    fn test_theme_validation_rejects_only_empty() {
        assert!(validate_theme_name("").is_err());
        for name in ["gesso", "custom_theme", " ", "a", "Theme With Spaces"] {
            assert!(validate_theme_name(name).is_ok(), "{:?} rejected", name);
        }
    }

    #[test]
    fn test_validate_config() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.drupal_theme.clear();
        assert!(matches!(config.validate(), Err(StarterError::Validation(_))));
    }
}
