//! layerdeps CLI entry point
//!
//! Parses the command line, runs the command, and prints failures through
//! [`user_friendly_error`] with a non-zero exit status.

use anyhow::Result;
use clap::Parser;
use layerdeps::cli;
use layerdeps::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
