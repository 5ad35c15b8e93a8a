use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use vitrina::cli;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  // Logs go to stderr so command output stays pipeable.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let args = cli::Args::parse();
  cli::run(args).await
}
