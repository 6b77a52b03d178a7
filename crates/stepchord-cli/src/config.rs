use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stepchord_core::SessionConfig;
use tracing::warn;

#[derive(serde::Serialize, serde::Deserialize, Default, Debug, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stepchord")
        .join("config.toml")
}

/// An explicit path must exist and parse. The default location falls back
/// to defaults when absent or malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        let s = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        return toml::from_str(&s).with_context(|| format!("parsing {}", path.display()));
    }

    let path = config_path();
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Ok(AppConfig::default());
    };
    Ok(toml::from_str(&s).unwrap_or_else(|e| {
        warn!("Ignoring malformed {}: {}", path.display(), e);
        AppConfig::default()
    }))
}

pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let s = toml::to_string_pretty(config)?;
    std::fs::write(path, s).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str("[session]\nbpm = 90.0\nkey = \"A\"\n").unwrap();
        assert_eq!(config.session.bpm, 90.0);
        assert_eq!(config.session.key, "A");
        assert_eq!(config.session.history_capacity, 50);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("stepchord-test-{}", std::process::id()))
            .join("config.toml");
        let mut config = AppConfig::default();
        config.session.seed = Some(7);
        config.session.total_steps = 32;

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/stepchord.toml"))).is_err());
    }
}
