//! TOML-based cycle configuration.
//!
//! Configuration comes in layers, every key optional:
//! - built-in defaults
//! - a config file (`pomato.toml`)
//! - environment variables and command-line flags (assembled by the CLI)
//!
//! Each layer is a [`Settings`]; [`Settings::layer`] stacks them and
//! [`CycleConfig::resolve`] turns the result into the immutable snapshot the
//! cycle controller runs on.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_POMODORO_TIME: u64 = 25;
pub const DEFAULT_BREAK_TIME: u64 = 5;
pub const DEFAULT_LONG_BREAK_TIME: u64 = 15;
pub const DEFAULT_LONG_BREAK_EACH: u32 = 4;
pub const DEFAULT_AUTOSTART_NEXT: bool = false;
pub const DEFAULT_SHOW_NOTIFICATION: bool = true;

/// Longest accepted pomodoro or break.
pub const MAX_SEGMENT: Duration = Duration::from_secs(24 * 60 * 60);

/// Multiplier for the numeric duration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    #[default]
    Minutes,
    Seconds,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Minutes => "m",
            TimeUnit::Seconds => "s",
        }
    }

    pub fn duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            TimeUnit::Seconds => Duration::from_secs(amount),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" => Ok(TimeUnit::Minutes),
            "s" => Ok(TimeUnit::Seconds),
            other => Err(ConfigError::InvalidValue {
                key: "time-unit".into(),
                message: format!("expected \"m\" or \"s\", got \"{other}\""),
            }),
        }
    }
}

/// One configuration layer. Keys match the config file and the flag names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pomodoro_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_each: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autostart_next: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_notification: Option<bool>,
}

impl Settings {
    /// Every key set to its built-in default.
    pub fn defaults() -> Self {
        Self {
            pomodoro_time: Some(DEFAULT_POMODORO_TIME),
            break_time: Some(DEFAULT_BREAK_TIME),
            long_break_time: Some(DEFAULT_LONG_BREAK_TIME),
            long_break_each: Some(DEFAULT_LONG_BREAK_EACH),
            time_unit: Some(TimeUnit::Minutes.as_str().into()),
            autostart_next: Some(DEFAULT_AUTOSTART_NEXT),
            show_notification: Some(DEFAULT_SHOW_NOTIFICATION),
        }
    }

    /// Parse a config file body. `path` is only used for error reporting.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    /// Callers decide whether a missing file is acceptable.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: String::new(),
            message: e.to_string(),
        })
    }

    /// Stack `upper` on top of `self`; keys set in `upper` win.
    pub fn layer(self, upper: Settings) -> Settings {
        Settings {
            pomodoro_time: upper.pomodoro_time.or(self.pomodoro_time),
            break_time: upper.break_time.or(self.break_time),
            long_break_time: upper.long_break_time.or(self.long_break_time),
            long_break_each: upper.long_break_each.or(self.long_break_each),
            time_unit: upper.time_unit.or(self.time_unit),
            autostart_next: upper.autostart_next.or(self.autostart_next),
            show_notification: upper.show_notification.or(self.show_notification),
        }
    }
}

/// Immutable snapshot the cycle controller runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleConfig {
    pub pomodoro_time: Duration,
    pub break_time: Duration,
    pub long_break_time: Duration,
    /// Pomodoros per round; the last break of a round is the long one.
    pub long_break_each: u32,
    pub autostart_next: bool,
    pub show_notification: bool,
}

impl Default for CycleConfig {
    fn default() -> Self {
        let unit = TimeUnit::Minutes;
        Self {
            pomodoro_time: unit.duration(DEFAULT_POMODORO_TIME),
            break_time: unit.duration(DEFAULT_BREAK_TIME),
            long_break_time: unit.duration(DEFAULT_LONG_BREAK_TIME),
            long_break_each: DEFAULT_LONG_BREAK_EACH,
            autostart_next: DEFAULT_AUTOSTART_NEXT,
            show_notification: DEFAULT_SHOW_NOTIFICATION,
        }
    }
}

impl CycleConfig {
    /// Resolve a stacked [`Settings`] into a config.
    ///
    /// Absent or zero numeric values fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown `time-unit` or a
    /// segment longer than [`MAX_SEGMENT`].
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let unit = match settings.time_unit.as_deref() {
            Some(s) => s.parse::<TimeUnit>()?,
            None => TimeUnit::default(),
        };
        let defaults = Self::default();
        let duration_or = |key: &str, value: Option<u64>, fallback: Duration| match value {
            Some(n) if n > 0 => {
                let d = unit.duration(n);
                if d > MAX_SEGMENT {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("{n}{} is longer than 24 hours", unit.as_str()),
                    });
                }
                Ok(d)
            }
            _ => Ok(fallback),
        };

        Ok(Self {
            pomodoro_time: duration_or(
                "pomodoro-time",
                settings.pomodoro_time,
                defaults.pomodoro_time,
            )?,
            break_time: duration_or("break-time", settings.break_time, defaults.break_time)?,
            long_break_time: duration_or(
                "long-break-time",
                settings.long_break_time,
                defaults.long_break_time,
            )?,
            long_break_each: settings
                .long_break_each
                .filter(|n| *n > 0)
                .unwrap_or(defaults.long_break_each),
            autostart_next: settings.autostart_next.unwrap_or(defaults.autostart_next),
            show_notification: settings
                .show_notification
                .unwrap_or(defaults.show_notification),
        })
    }

    /// Express this config as a fully-populated layer.
    ///
    /// Minutes are used when every duration is a whole number of minutes,
    /// seconds otherwise.
    pub fn to_settings(&self) -> Settings {
        let durations = [self.pomodoro_time, self.break_time, self.long_break_time];
        let unit = if durations.iter().all(|d| d.as_secs() % 60 == 0) {
            TimeUnit::Minutes
        } else {
            TimeUnit::Seconds
        };
        let amount = |d: Duration| match unit {
            TimeUnit::Minutes => d.as_secs() / 60,
            TimeUnit::Seconds => d.as_secs(),
        };

        Settings {
            pomodoro_time: Some(amount(self.pomodoro_time)),
            break_time: Some(amount(self.break_time)),
            long_break_time: Some(amount(self.long_break_time)),
            long_break_each: Some(self.long_break_each),
            time_unit: Some(unit.as_str().into()),
            autostart_next: Some(self.autostart_next),
            show_notification: Some(self.show_notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Settings, ConfigError> {
        Settings::from_toml(s, Path::new("pomato.toml"))
    }

    #[test]
    fn config_default_values() {
        let cfg = CycleConfig::default();
        assert_eq!(cfg.pomodoro_time, Duration::from_secs(25 * 60));
        assert_eq!(cfg.break_time, Duration::from_secs(5 * 60));
        assert_eq!(cfg.long_break_time, Duration::from_secs(15 * 60));
        assert_eq!(cfg.long_break_each, 4);
        assert!(!cfg.autostart_next);
        assert!(cfg.show_notification);
    }

    #[test]
    fn empty_settings_resolve_to_defaults() {
        let cfg = CycleConfig::resolve(&Settings::default()).unwrap();
        assert_eq!(cfg, CycleConfig::default());
        assert_eq!(
            CycleConfig::resolve(&Settings::defaults()).unwrap(),
            CycleConfig::default()
        );
    }

    #[test]
    fn flag_layer_overrides_file_and_default() {
        let file = parse("pomodoro-time = 25\nbreak-time = 7\n").unwrap();
        let flags = Settings {
            pomodoro_time: Some(10),
            ..Settings::default()
        };
        let cfg = CycleConfig::resolve(&Settings::defaults().layer(file).layer(flags)).unwrap();
        assert_eq!(cfg.pomodoro_time, Duration::from_secs(10 * 60));
        assert_eq!(cfg.break_time, Duration::from_secs(7 * 60));
    }

    #[test]
    fn zero_falls_back_to_default() {
        let settings = Settings {
            pomodoro_time: Some(0),
            long_break_each: Some(0),
            ..Settings::default()
        };
        let cfg = CycleConfig::resolve(&settings).unwrap();
        assert_eq!(cfg.pomodoro_time, Duration::from_secs(25 * 60));
        assert_eq!(cfg.long_break_each, 4);
    }

    #[test]
    fn seconds_unit_applies_to_all_durations() {
        let settings = parse(
            "pomodoro-time = 3\nbreak-time = 2\nlong-break-time = 4\ntime-unit = \"s\"\n",
        )
        .unwrap();
        let cfg = CycleConfig::resolve(&settings).unwrap();
        assert_eq!(cfg.pomodoro_time, Duration::from_secs(3));
        assert_eq!(cfg.break_time, Duration::from_secs(2));
        assert_eq!(cfg.long_break_time, Duration::from_secs(4));
    }

    #[test]
    fn unknown_time_unit_is_rejected() {
        let settings = Settings {
            time_unit: Some("h".into()),
            ..Settings::default()
        };
        let err = CycleConfig::resolve(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "time-unit"));
    }

    #[test]
    fn overlong_segment_is_rejected() {
        let settings = Settings {
            pomodoro_time: Some(u64::MAX),
            time_unit: Some("s".into()),
            ..Settings::default()
        };
        let err = CycleConfig::resolve(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "pomodoro-time"));

        let settings = Settings {
            long_break_time: Some(24 * 60 + 1),
            ..Settings::default()
        };
        let err = CycleConfig::resolve(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "long-break-time"));

        let settings = Settings {
            break_time: Some(24 * 60),
            ..Settings::default()
        };
        assert_eq!(
            CycleConfig::resolve(&settings).unwrap().break_time,
            MAX_SEGMENT
        );
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let err = parse("pomodoro_time = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn booleans_take_highest_layer() {
        let file = parse("autostart-next = true\nshow-notification = false\n").unwrap();
        let flags = Settings {
            show_notification: Some(true),
            ..Settings::default()
        };
        let cfg = CycleConfig::resolve(&file.layer(flags)).unwrap();
        assert!(cfg.autostart_next);
        assert!(cfg.show_notification);
    }

    #[test]
    fn to_settings_prefers_minutes_when_exact() {
        let settings = CycleConfig::default().to_settings();
        assert_eq!(settings, Settings::defaults());

        let cfg = CycleConfig {
            pomodoro_time: Duration::from_secs(90),
            ..CycleConfig::default()
        };
        let settings = cfg.to_settings();
        assert_eq!(settings.time_unit.as_deref(), Some("s"));
        assert_eq!(settings.pomodoro_time, Some(90));
        assert_eq!(settings.break_time, Some(300));
    }

    #[test]
    fn settings_toml_roundtrip_preserves_layer() {
        let settings = Settings::defaults();
        let text = settings.to_toml().unwrap();
        assert!(text.contains("pomodoro-time = 25"));
        assert_eq!(parse(&text).unwrap(), settings);
    }
}
