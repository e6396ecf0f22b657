//! Lorelink CLI entry point

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use lorelink_cli::{
    cli::{Cli, Commands},
    config::AppConfig,
    demo,
    error::Result,
    store::FileSnapshotStore,
};
use lorelink_runtime::SnapshotStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.into();
    }

    match cli.command {
        Commands::Demo { name, peers } => {
            let host_name = name.unwrap_or_else(|| config.identity.display_name.clone());
            let peers = peers.unwrap_or(config.demo.peers);
            let store = Arc::new(FileSnapshotStore::new(config.storage.data_dir.clone()));

            info!(host = %host_name, peers, "starting mesh demo");
            demo::run(&config, &host_name, peers, store).await?;
            info!("demo finished");
        }
        Commands::Snapshot { account } => {
            let store = FileSnapshotStore::new(config.storage.data_dir.clone());
            match store.load(&account).await? {
                Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
                None => println!("no snapshot for account '{account}'"),
            }
        }
    }

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
