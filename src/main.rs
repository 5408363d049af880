use clap::Parser;
use usergate::{cli::Cli, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; only report problems other than a missing file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    usergate::cli::run_cli(Cli::parse()).await
}
