//! `lint-jenkinsfile` entry point.
//!
//! ```bash
//! lint-jenkinsfile --jenkins-url https://ci.example.com Jenkinsfile
//! ```

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use jflint_cli::{Cli, execute, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let color = !cli.no_color && std::io::stdout().is_terminal();
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();

    let verdict = execute(&cli, &mut stdout, &mut stderr, color).await;
    ExitCode::from(verdict.exit_code())
}
