use clap::Subcommand;
use pomato_core::{ConfigError, Settings};

use super::{candidate_paths, default_config_path, load_config, locate, Options};
use crate::error::CliError;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the resolved configuration as TOML
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file in use
    Path,
    /// Write the defaults to ~/.config/pomato/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(action: ConfigAction, options: &Options) -> Result<(), CliError> {
    match action {
        ConfigAction::Show { json } => {
            let settings = load_config(options)?.to_settings();
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                print!("{}", settings.to_toml()?);
            }
        }
        ConfigAction::Path => match locate(options.config.as_deref()) {
            Some(path) => println!("{}", path.display()),
            None => {
                let searched: Vec<String> = candidate_paths()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                eprintln!("no config file found (searched: {})", searched.join(", "));
            }
        },
        ConfigAction::Init { force } => {
            let path = options.config.clone().unwrap_or_else(default_config_path);
            if path.exists() && !force {
                return Err(ConfigError::Write {
                    path,
                    message: "file already exists (use --force to overwrite)".into(),
                }
                .into());
            }
            let write_failed = |e: std::io::Error| ConfigError::Write {
                path: path.clone(),
                message: e.to_string(),
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(write_failed)?;
            }
            std::fs::write(&path, Settings::defaults().to_toml()?).map_err(write_failed)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
