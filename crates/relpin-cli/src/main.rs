mod commands;

use clap::Parser;
use commands::{release_version_override, EXIT_FAILURE};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "Usage: relpin <TemplateFile> <OutFile>";

#[derive(Debug, Parser)]
#[command(
    name = "relpin",
    about = "Generate a release descriptor pinned to the installed application versions",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Release template, a `.rel` or `.rel.src` file.
    #[arg(value_name = "TemplateFile", allow_hyphen_values = true)]
    template: PathBuf,

    /// Path of the descriptor to write.
    #[arg(value_name = "OutFile", allow_hyphen_values = true)]
    out: PathBuf,
}

fn main() -> ExitCode {
    // Exactly two positional arguments; anything else gets the usage line.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            println!("{USAGE}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    // stdout is reserved for the usage and error report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RELPIN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match commands::generate::run(&cli.template, &cli.out, release_version_override()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            println!("Error: {e}");
            for line in e.trace() {
                println!("    {line}");
            }
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
