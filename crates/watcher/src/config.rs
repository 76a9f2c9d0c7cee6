//! Observer configuration

use crate::ignore::IgnoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an [`Observer`](crate::Observer)
///
/// Durations are spelled in milliseconds when (de)serialized:
///
/// ```toml
/// quiescence_ms = 100
/// poll_interval_ms = 10
/// high_water_mark = 1024
///
/// [ignore]
/// hidden = true
/// backup = true
/// patterns = ["*.log", "target/"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// How long a file's size must stay unchanged before an update is emitted (default: 100ms)
    #[serde(rename = "quiescence_ms", with = "millis", default = "default_quiescence")]
    pub quiescence: Duration,

    /// Delay between debounce rechecks of a pending file (default: 10ms)
    #[serde(rename = "poll_interval_ms", with = "millis", default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Unread event count at which the emitter signals pressure (default: 1024)
    #[serde(default = "default_high_water_mark")]
    pub high_water_mark: usize,

    /// Ignore rules applied to notification names
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            quiescence: default_quiescence(),
            poll_interval: default_poll_interval(),
            high_water_mark: default_high_water_mark(),
            ignore: IgnoreConfig::default(),
        }
    }
}

fn default_quiescence() -> Duration {
    Duration::from_millis(100)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(10)
}

fn default_high_water_mark() -> usize {
    1024
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ObserverConfig::default();
        assert_eq!(config.quiescence, Duration::from_millis(100));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.high_water_mark, 1024);
        assert!(config.ignore.hidden);
        assert!(config.ignore.backup);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: ObserverConfig = toml::from_str("").unwrap();
        assert_eq!(config.quiescence, Duration::from_millis(100));
        assert!(config.ignore.patterns.is_empty());
    }

    #[test]
    fn test_toml_overrides() {
        let config: ObserverConfig = toml::from_str(
            r#"
            quiescence_ms = 250
            poll_interval_ms = 5

            [ignore]
            hidden = false
            patterns = ["*.log"]
            "#,
        )
        .unwrap();

        assert_eq!(config.quiescence, Duration::from_millis(250));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.high_water_mark, 1024);
        assert!(!config.ignore.hidden);
        assert!(config.ignore.backup);
        assert_eq!(config.ignore.patterns, vec!["*.log".to_string()]);
    }
}
