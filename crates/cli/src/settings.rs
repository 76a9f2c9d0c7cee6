//! Observer settings for the CLI
//!
//! Values come from an optional TOML file, then command-line overrides.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use watcher::ObserverConfig;

/// Command-line overrides applied on top of the file configuration
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub quiescence_ms: Option<u64>,
    pub poll_ms: Option<u64>,
    pub ignore: Vec<String>,
    pub show_hidden: bool,
}

/// Load the configuration file, or defaults when none is given
pub fn load(path: Option<&Path>) -> Result<ObserverConfig> {
    let Some(path) = path else {
        return Ok(ObserverConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Apply command-line overrides
pub fn apply(config: &mut ObserverConfig, overrides: &Overrides) {
    if let Some(ms) = overrides.quiescence_ms {
        config.quiescence = Duration::from_millis(ms);
    }
    if let Some(ms) = overrides.poll_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    if overrides.show_hidden {
        config.ignore.hidden = false;
    }
    config.ignore.patterns.extend(overrides.ignore.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.quiescence, Duration::from_millis(100));
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("fsobserve.toml");
        fs::write(&path, "quiescence_ms = 300\n\n[ignore]\npatterns = [\"*.log\"]\n")?;

        let config = load(Some(&path))?;
        assert_eq!(config.quiescence, Duration::from_millis(300));
        assert_eq!(config.ignore.patterns, vec!["*.log".to_string()]);
        Ok(())
    }

    #[test]
    fn test_load_reports_bad_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "quiescence_ms = \"soon\"").unwrap();

        let error = load(Some(&path)).unwrap_err();
        assert!(error.to_string().contains("Invalid config file"));

        let missing = load(Some(&temp_dir.path().join("missing.toml"))).unwrap_err();
        assert!(missing.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = ObserverConfig::default();
        config.ignore.patterns.push("*.log".to_string());

        apply(
            &mut config,
            &Overrides {
                quiescence_ms: Some(50),
                poll_ms: Some(5),
                ignore: vec!["target/".to_string()],
                show_hidden: true,
            },
        );

        assert_eq!(config.quiescence, Duration::from_millis(50));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert!(!config.ignore.hidden);
        assert!(config.ignore.backup);
        assert_eq!(
            config.ignore.patterns,
            vec!["*.log".to_string(), "target/".to_string()]
        );
    }
}
