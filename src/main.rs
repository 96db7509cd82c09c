//! chanfilter - offline administration of the channel visibility store.
//!
//! Usage: `chanfilter [config.toml] [command ...]`, e.g.
//! `chanfilter chanfilter.toml ListChannels phone`.

use chanfilter::config::{self, Config, StoreBackend};
use chanfilter::{Admin, VisibilityStore, db};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .unwrap_or_else(|| "chanfilter.toml".to_string());
    let command = {
        let words: Vec<String> = args.collect();
        if words.is_empty() {
            "Help".to_string()
        } else {
            words.join(" ")
        }
    };

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            errors.len()
        ));
    }

    if config.store.backend == StoreBackend::Memory {
        warn!("Memory backend selected; changes are discarded on exit");
    }

    let kv = db::open(&config.store)?;
    let store = VisibilityStore::load(kv)?;
    info!(
        backend = ?config.store.backend,
        identifiers = store.identifiers().len(),
        "Visibility store ready"
    );

    for line in Admin::offline(&store).execute(&command) {
        println!("{line}");
    }
    Ok(())
}
