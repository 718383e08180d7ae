pub mod config;
pub mod run;

use std::path::{Path, PathBuf};

use clap::Args;
use pomato_core::{ConfigError, CycleConfig, Settings};

/// Options shared by every subcommand. Flags win over `POMATO_*`
/// environment variables, which win over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct Options {
    /// Config file [default: ./pomato.toml, ~/.config/pomato/config.toml, /etc/pomato.toml]
    #[arg(long, global = true, env = "POMATO_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Pomodoro time (Unit: time-unit)
    #[arg(long, global = true, env = "POMATO_POMODORO_TIME", value_name = "N")]
    pub pomodoro_time: Option<u64>,

    /// Break time (Unit: time-unit)
    #[arg(long, global = true, env = "POMATO_BREAK_TIME", value_name = "N")]
    pub break_time: Option<u64>,

    /// Long break time (Unit: time-unit)
    #[arg(long, global = true, env = "POMATO_LONG_BREAK_TIME", value_name = "N")]
    pub long_break_time: Option<u64>,

    /// Pomodoros per round; the round ends with a long break
    #[arg(long, global = true, env = "POMATO_LONG_BREAK_EACH", value_name = "N")]
    pub long_break_each: Option<u32>,

    /// Time unit: "m" or "s"
    #[arg(long, global = true, env = "POMATO_TIME_UNIT", value_name = "UNIT")]
    pub time_unit: Option<String>,

    /// Start the next pomodoro right after a short break
    #[arg(
        long,
        global = true,
        env = "POMATO_AUTOSTART_NEXT",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub autostart_next: Option<bool>,

    /// Show desktop notifications around breaks
    #[arg(
        long,
        global = true,
        env = "POMATO_SHOW_NOTIFICATION",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub show_notification: Option<bool>,

    /// Read whole lines instead of single keystrokes (disables pause)
    #[arg(long, global = true)]
    pub no_raw: bool,

    /// Disable colored labels (also honors NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Options {
    /// The flag/environment layer.
    pub fn settings(&self) -> Settings {
        Settings {
            pomodoro_time: self.pomodoro_time,
            break_time: self.break_time,
            long_break_time: self.long_break_time,
            long_break_each: self.long_break_each,
            time_unit: self.time_unit.clone(),
            autostart_next: self.autostart_next,
            show_notification: self.show_notification,
        }
    }

    pub fn color(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
    }
}

/// `~/.config/pomato/`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pomato")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Search order when no `--config` is given.
pub fn candidate_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("pomato.toml"),
        default_config_path(),
        PathBuf::from("/etc/pomato.toml"),
    ]
}

/// The config file in use, if any. An explicit path is returned even when
/// it does not exist so that loading it reports the error.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => candidate_paths().into_iter().find(|p| p.is_file()),
    }
}

/// Defaults, then the config file, then flags and environment.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub fn load_settings(options: &Options) -> Result<Settings, ConfigError> {
    let file = match locate(options.config.as_deref()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            Settings::load(&path)?
        }
        None => Settings::default(),
    };
    Ok(Settings::defaults().layer(file).layer(options.settings()))
}

pub fn load_config(options: &Options) -> Result<CycleConfig, ConfigError> {
    CycleConfig::resolve(&load_settings(options)?)
}
