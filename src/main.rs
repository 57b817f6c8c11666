use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use covmap::cli::{cmd_ingest, Cli, Command};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("COVMAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = match &cli.command {
        Command::Ingest(args) => cmd_ingest(args)?,
    };
    print!("{}", output);
    Ok(())
}
