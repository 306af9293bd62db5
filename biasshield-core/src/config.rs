//! Configuration system for BiasShield.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from the platform config dir (`~/.config/biasshield/config.toml` on
//! Linux) and/or `.biasshield/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::synth::Noise;
use crate::trend::TimeRange;

/// Top-level configuration for the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub trend: TrendConfig,
}

/// Connection settings for the prediction backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:8000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// When false, every call goes straight to the local fallback.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            enabled: true,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Settings for the synthetic datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Noise amplitude added to synthetic values (capped at 0.02).
    #[serde(default = "default_noise_amplitude")]
    pub noise_amplitude: f64,
    /// Fixed seed for reproducible noise; OS entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            noise_amplitude: default_noise_amplitude(),
            seed: None,
        }
    }
}

impl SynthesisConfig {
    pub fn noise(&self) -> Noise {
        Noise::from_settings(self.seed, self.noise_amplitude)
    }
}

fn default_noise_amplitude() -> f64 {
    0.02
}

/// Defaults for trend views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_window")]
    pub moving_average_window: usize,
    #[serde(default)]
    pub default_range: TimeRange,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            moving_average_window: default_window(),
            default_range: TimeRange::All,
        }
    }
}

fn default_window() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "biasshield", "biasshield")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".biasshield").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `BIASSHIELD_`)
/// 3. Workspace-local config (`.biasshield/config.toml`)
/// 4. User config
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&DashboardConfig>,
) -> std::result::Result<DashboardConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(DashboardConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // BIASSHIELD_BACKEND__BASE_URL, BIASSHIELD_SYNTHESIS__SEED, ...
    figment = figment.merge(Env::prefixed("BIASSHIELD_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Writes a default `.biasshield/config.toml` into the workspace.
///
/// Returns the path and whether a new file was written; an existing file is
/// left untouched.
pub fn write_default_config(workspace: &Path) -> Result<(PathBuf, bool)> {
    let path = workspace_config_path(workspace);
    if path.exists() {
        return Ok((path, false));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let toml_str = toml::to_string_pretty(&DashboardConfig::default())?;
    std::fs::write(&path, toml_str)?;
    Ok((path, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.backend.enabled);
        assert_eq!(config.synthesis.noise_amplitude, 0.02);
        assert!(config.synthesis.seed.is_none());
        assert_eq!(config.trend.moving_average_window, 3);
        assert_eq!(config.trend.default_range, TimeRange::All);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = DashboardConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: DashboardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend.base_url, config.backend.base_url);
        assert_eq!(
            parsed.trend.moving_average_window,
            config.trend.moving_average_window
        );
    }

    #[test]
    fn test_load_config_with_overrides() {
        let mut overrides = DashboardConfig::default();
        overrides.backend.base_url = "http://backend.internal:9000".to_string();
        overrides.synthesis.seed = Some(42);

        let config = load_config(None, Some(&overrides)).unwrap();
        assert_eq!(config.backend.base_url, "http://backend.internal:9000");
        assert_eq!(config.synthesis.seed, Some(42));
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".biasshield");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            r#"
[backend]
base_url = "http://127.0.0.1:8765"
enabled = false

[trend]
moving_average_window = 5
default_range = "quarter"
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8765");
        assert!(!config.backend.enabled);
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.trend.moving_average_window, 5);
        assert_eq!(config.trend.default_range, TimeRange::Quarter);
    }

    #[test]
    fn test_write_default_config_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (path, created) = write_default_config(dir.path()).unwrap();
        assert!(created);
        assert!(path.exists());

        let (_, created_again) = write_default_config(dir.path()).unwrap();
        assert!(!created_again);

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_synthesis_noise_respects_seed() {
        let config = SynthesisConfig {
            noise_amplitude: 0.01,
            seed: Some(9),
        };
        let mut a = config.noise();
        let mut b = config.noise();
        assert_eq!(a.sample(), b.sample());
        assert_eq!(a.amplitude(), 0.01);
    }
}
