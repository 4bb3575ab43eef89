use std::process::ExitCode;

use clap::Parser;
use emma::cli::{
    commands::{Cli, Commands},
    run_cli,
};
use emma::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Failed to open log file: {}", e);
        return ExitCode::FAILURE;
    }

    let command = cli.command.unwrap_or(Commands::Chat {
        personality: None,
        resume: None,
    });
    run_cli(command, &cli.config, cli.verbose).await
}
