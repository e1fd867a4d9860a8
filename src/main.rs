use anyhow::Context;
use clap::Parser;
use rmqdump::{config::Cli, env, Settings};
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let dotenv_path = env::load_dotenv();
    env::init_tracing();
    if let Some(path) = dotenv_path {
        debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    let settings = Settings::from_cli(cli, &mut rand::rng()).context("Invalid command line")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let outcome = runtime.block_on(rmqdump::run(settings));
    // Stdin is read on a blocking thread that cannot be cancelled.
    runtime.shutdown_background();

    outcome.context("rmqdump failed")
}
