//! Layered settings: defaults, optional `rom-engine.toml`, then
//! `ROM_ENGINE__SECTION__KEY` environment variables

use config::{Config, ConfigError, Environment, File};
use frame_dispatch::DispatchConfig;
use joint_resolver::ResolverConfig;
use measurement_session::SessionConfig;
use posture_metrics::PostureConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// trace, debug, info, warn, or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub resolver: ResolverConfig,
    pub session: SessionConfig,
    pub dispatch: DispatchConfig,
    pub posture: PostureConfig,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("rom-engine")
    }

    /// Load with `file` (extension optional) as the file layer
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("ROM_ENGINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load_from("does-not-exist").unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.resolver.visibility_threshold, 0.5);
        assert_eq!(settings.session.capture_buffer_capacity, 30);
        assert_eq!(settings.dispatch.snapshot_quality, 80);
        assert_eq!(settings.posture.capture_visibility, 0.6);
    }
}
