use clap::Parser;
use docente_cli::app::dispatch;
use docente_cli::cli_args::Cli;
use docente_core::logging::{LoggingDestination, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(LoggingDestination::for_verbosity(cli.verbose)) {
        eprintln!("Warning: logging disabled: {err}");
    }
    if let Err(err) = dispatch(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
