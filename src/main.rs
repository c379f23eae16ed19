use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use cotacao::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for cotacao::AppCommand {
    fn from(cmd: Commands) -> cotacao::AppCommand {
        match cmd {
            Commands::Serve => cotacao::AppCommand::Serve,
            Commands::Fetch => cotacao::AppCommand::Fetch,
            Commands::History { limit } => cotacao::AppCommand::History { limit },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the USD-BRL quote on /cotacao
    Serve,
    /// Request the current quote from the service and append it to the output file
    Fetch,
    /// Display the most recent recorded quotes
    History {
        /// Number of quotes to show
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cotacao::cli::setup::setup(),
        Some(cmd) => cotacao::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
