use std::convert::Infallible;
use std::io::Write;

use pomato_core::input::{self, TerminalMode};
use pomato_core::style::styler;
use pomato_core::{
    Advance, CycleConfig, CycleController, EngineError, KeyInput, Keystrokes, LineInput,
};

use super::{load_config, Options};
use crate::error::CliError;

/// Start the cycle. Only returns on error or Ctrl-C.
pub fn run(options: &Options) -> Result<(), CliError> {
    let config = load_config(options)?;
    tracing::debug!(?config, "starting cycle");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let result = runtime.block_on(drive(options, config));

    // The stdin reader thread may still be blocked in read(); don't wait on it.
    runtime.shutdown_background();
    result
}

async fn drive(options: &Options, config: CycleConfig) -> Result<(), CliError> {
    let terminal = if options.no_raw {
        None
    } else {
        TerminalMode::cbreak().map_err(EngineError::Terminal)?
    };

    match terminal {
        Some(terminal) => {
            let (bytes, _reader) =
                input::spawn_reader(std::io::stdin()).map_err(EngineError::Terminal)?;
            let keys = Keystrokes::spawn(bytes);
            cycle(options, config, KeyInput::new(keys, Some(terminal))).await
        }
        None => {
            tracing::debug!("stdin is not a terminal or --no-raw given; reading lines");
            cycle(options, config, LineInput::stdin()).await
        }
    }
}

async fn cycle<A: Advance>(
    options: &Options,
    config: CycleConfig,
    input: A,
) -> Result<(), CliError> {
    let mut controller = CycleController::new(config, std::io::stdout(), input)
        .with_styler(styler(options.color()));

    let outcome: Result<Infallible, CliError> = tokio::select! {
        result = controller.run() => result.map_err(CliError::from),
        _ = tokio::signal::ctrl_c() => Err(CliError::Interrupted),
    };
    // Dropping the controller restores the terminal before the error is printed.
    drop(controller);
    let _ = writeln!(std::io::stdout());

    match outcome {
        Ok(never) => match never {},
        Err(e) => Err(e),
    }
}
