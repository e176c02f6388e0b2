use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use labelwise::config::DEFAULT_CONFIG_PATH;
use labelwise::server::run_server;
use labelwise::{load_or_default, ClassificationService};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults apply when it is absent
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Ignore any persisted model and train a new one
    #[arg(short, long)]
    fresh: bool,

    /// Override the bind address from the config file
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = load_or_default(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
        config.validate()?;
    }

    info!("=== Starting labelwise {} ===", env!("CARGO_PKG_VERSION"));
    let start_time = Instant::now();

    let mut service = ClassificationService::from_config(&config)?;
    let fresh = args.fresh;
    let service = tokio::task::spawn_blocking(move || {
        service.start(fresh).map(|()| service)
    })
    .await
    .context("Startup task panicked")??;

    if let Some(info) = service.info() {
        info!(
            "=== Classifier ready in {:.2?}: {} labels {:?}, {} tokens, {} dimensions ===",
            start_time.elapsed(),
            info.num_labels,
            info.labels,
            info.vocabulary_size,
            info.embedding_size
        );
    }

    run_server(Arc::new(service), &config.server.bind).await
}
