//! Call subsystem configuration.
//!
//! [`Config`] is process-level and loaded from environment variables.
//! [`MediaConfiguration`] is the per-call capture selection supplied by the
//! user-facing layer on every change.

use std::{collections::HashMap, env, str::FromStr};

use thiserror::Error;

/// Default signaling endpoint.
pub const DEFAULT_SIGNALING_URL: &str = "ws://localhost:8080/api/ws";

/// Default start-up latency of virtual capture devices, in milliseconds.
pub const DEFAULT_DEVICE_LATENCY_MS: u64 = 50;

/// Process-level configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Signaling endpoint the duplex channel connects to.
    pub signaling_url: String,

    /// Ask the platform for noise suppression on captured microphone audio.
    pub noise_suppression: bool,

    /// Ask the platform for echo cancellation on captured microphone audio.
    pub echo_cancellation: bool,

    /// Start-up latency of virtual capture devices.
    pub device_latency_ms: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_string(),
            noise_suppression: true,
            echo_cancellation: true,
            device_latency_ms: DEFAULT_DEVICE_LATENCY_MS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let signaling_url = vars
            .get("CALL_SIGNALING_URL")
            .cloned()
            .unwrap_or(defaults.signaling_url);

        let noise_suppression =
            parse_var(vars, "CALL_NOISE_SUPPRESSION")?
                .unwrap_or(defaults.noise_suppression);

        let echo_cancellation =
            parse_var(vars, "CALL_ECHO_CANCELLATION")?
                .unwrap_or(defaults.echo_cancellation);

        let device_latency_ms = parse_var(vars, "CALL_DEVICE_LATENCY_MS")?
            .unwrap_or(defaults.device_latency_ms);

        Ok(Self {
            signaling_url,
            noise_suppression,
            echo_cancellation,
            device_latency_ms,
        })
    }
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    var: &str,
) -> Result<Option<T>, ConfigError> {
    vars.get(var)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: value.clone(),
            })
        })
        .transpose()
}

/// Enablement of one capture category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediaToggles {
    pub audio: bool,
    pub video: bool,
}

/// Which capture media the user wants in the call.
///
/// Immutable per observation: a change is a new value handed to
/// [`CallMedia::reconfigure`](crate::component::CallMedia::reconfigure).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediaConfiguration {
    /// Camera and microphone.
    pub user_media: MediaToggles,

    /// Screen share and its optional audio.
    pub display_media: MediaToggles,
}

impl MediaConfiguration {
    /// Camera and microphone both on, no screen share.
    pub fn camera_and_mic() -> Self {
        Self {
            user_media: MediaToggles {
                audio: true,
                video: true,
            },
            display_media: MediaToggles::default(),
        }
    }

    pub fn with_user_media(mut self, audio: bool, video: bool) -> Self {
        self.user_media = MediaToggles { audio, video };
        self
    }

    pub fn with_display_media(mut self, audio: bool, video: bool) -> Self {
        self.display_media = MediaToggles { audio, video };
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&HashMap::new())
            .expect("Config should load successfully");

        assert_eq!(config, Config::default());
        assert_eq!(config.signaling_url, DEFAULT_SIGNALING_URL);
        assert!(config.noise_suppression);
        assert!(config.echo_cancellation);
    }

    #[test]
    fn test_from_vars_custom_values() {
        let mut vars = HashMap::new();
        vars.insert(
            "CALL_SIGNALING_URL".to_string(),
            "wss://chat.example.com/api/ws".to_string(),
        );
        vars.insert("CALL_NOISE_SUPPRESSION".to_string(), "false".to_string());
        vars.insert("CALL_DEVICE_LATENCY_MS".to_string(), " 5 ".to_string());

        let config = Config::from_vars(&vars)
            .expect("Config should load successfully");

        assert_eq!(config.signaling_url, "wss://chat.example.com/api/ws");
        assert!(!config.noise_suppression);
        assert!(config.echo_cancellation);
        assert_eq!(config.device_latency_ms, 5);
    }

    #[test]
    fn test_from_vars_invalid_bool() {
        let mut vars = HashMap::new();
        vars.insert("CALL_ECHO_CANCELLATION".to_string(), "yes".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { var, .. })
                if var == "CALL_ECHO_CANCELLATION"
        ));
    }

    #[test]
    fn test_media_configuration_builders() {
        let config =
            MediaConfiguration::camera_and_mic().with_display_media(true, true);

        assert!(config.user_media.audio && config.user_media.video);
        assert!(config.display_media.audio && config.display_media.video);
        assert_eq!(
            MediaConfiguration::default().with_user_media(false, true),
            MediaConfiguration {
                user_media: MediaToggles {
                    audio: false,
                    video: true
                },
                display_media: MediaToggles::default(),
            }
        );
    }
}
