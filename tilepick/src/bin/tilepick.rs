use std::env;
use std::fs;
use std::sync::Arc;

use clap::Parser;
use log::log_enabled;
use tilepick::{TilepickError, TilepickResult};
use tilepick::args::Args;
use tilepick::config::{Config, read_config};
use tilepick::logging::{ensure_core_log_level_matches, init_tracing};
use tilepick::pick::pick;
use tilepick_core::tiles::HttpTileFetcher;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> TilepickResult<()> {
    info!("Starting tilepick v{VERSION}");

    let mut config = if let Some(ref cfg_filename) = args.meta.config {
        info!("Using {}", cfg_filename.display());
        read_config(cfg_filename, &subst::Env)?
    } else {
        info!("Config file is not specified, using defaults and command line arguments");
        Config::default()
    };
    args.merge_into_config(&mut config);

    if let Some(file_name) = &args.meta.save_config {
        config.save_to_file(file_name)?;
    }

    let fetcher = HttpTileFetcher::with_settings(config.source.user_agent(), config.source.timeout())
        .map_err(TilepickError::HttpClientError)?;
    let picked = pick(&config, &args.view, Arc::new(fetcher)).await?;

    if let Some(file_name) = &args.view.svg {
        fs::write(file_name, picked.canvas.to_svg())?;
        info!("Wrote {}", file_name.display());
    }
    for event in &picked.events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = ensure_core_log_level_matches(env::var("RUST_LOG").ok());
    init_tracing(&filter, env::var("TILEPICK_FORMAT").ok());

    let args = Args::parse();
    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
