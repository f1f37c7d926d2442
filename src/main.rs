use clap::Parser;
use tracing_subscriber::EnvFilter;

use runafter::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();

    // --verbose forces debug; otherwise RUST_LOG decides. Logs go to stderr
    // so command output stays clean.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::dispatch(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
