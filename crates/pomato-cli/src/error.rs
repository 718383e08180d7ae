use pomato_core::{ConfigError, EngineError};
use thiserror::Error;

/// Everything that can end the process early.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("pomato run fail: {0}")]
    Engine(#[from] EngineError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("interrupted")]
    Interrupted,
}

impl CliError {
    /// 1 for configuration problems, 2 for engine failures, 130 for Ctrl-C.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Json(_) => 1,
            CliError::Engine(_) | CliError::Runtime(_) => 2,
            CliError::Interrupted => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_failure_class() {
        let config = CliError::from(ConfigError::InvalidValue {
            key: "time-unit".into(),
            message: "bad".into(),
        });
        assert_eq!(config.exit_code(), 1);
        assert_eq!(CliError::from(EngineError::InputClosed).exit_code(), 2);
        assert_eq!(CliError::Interrupted.exit_code(), 130);
    }
}
