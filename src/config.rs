//! Runtime settings, layered from defaults, an optional `cytoserve.toml`,
//! and `CYTOSERVE_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub model: ModelSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where the model artifact lives and how inputs must be prepared.
/// The normalization constants must match the model's training-time
/// preprocessing exactly.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    #[serde(default = "default_input_size")]
    pub input_width: u32,
    #[serde(default = "default_input_size")]
    pub input_height: u32,
    #[serde(default = "default_channel_mean")]
    pub mean: [f32; 3],
    #[serde(default = "default_channel_std")]
    pub std: [f32; 3],
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/swin_model.onnx")
}

fn default_input_size() -> u32 {
    224
}

fn default_channel_mean() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}

fn default_channel_std() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            path: default_model_path(),
            input_width: default_input_size(),
            input_height: default_input_size(),
            mean: default_channel_mean(),
            std: default_channel_std(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("cytoserve").required(false))
            .add_source(Environment::with_prefix("CYTOSERVE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_model_training() {
        let settings = Settings::default();
        assert_eq!(settings.model.input_width, 224);
        assert_eq!(settings.model.input_height, 224);
        assert_eq!(settings.model.mean, [0.5, 0.5, 0.5]);
        assert_eq!(settings.model.std, [0.5, 0.5, 0.5]);
        assert_eq!(settings.server.port, 8000);
    }
}
