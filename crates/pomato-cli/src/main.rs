use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;
mod error;
mod logging;

#[derive(Parser)]
#[command(
    name = "pomato",
    version,
    about = "Pomodoro timer for the terminal",
    long_about = "Pomodoro timer for the terminal.\n\nSpace pauses and resumes the running countdown; enter moves on after a break."
)]
struct Cli {
    #[command(flatten)]
    options: commands::Options,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pomodoro cycle (default)
    Run,
    /// Configuration inspection
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&cli.options),
        Commands::Config { action } => commands::config::run(action, &cli.options),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pomato", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
