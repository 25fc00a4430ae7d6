use clap::Parser;
use opsdesk::cli::{Cli, Reported};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the config singleton is first touched
    dotenvy::dotenv().ok();

    let default_level = if opsdesk::is_production!() { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = opsdesk::cli::run(cli).await {
        // API failures were already printed in the requested format
        if e.downcast_ref::<Reported>().is_none() {
            match std::env::var("CLI_VERBOSE").as_deref() {
                Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
                _ => eprintln!("Error: {e}"),
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
