//! Hue Cache - colorized GIF animations of local images.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use huecache::{
    animation::{AnimationCache, AnimationService, LockMode},
    config::Config,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting server...");
    info!("Configuration:");
    info!("  Root: {}", config.root.display());
    info!(
        "  Cache: {}s sliding TTL, {}MB",
        config.cache_ttl,
        config.cache_size / (1024 * 1024)
    );
    match config.lock_mode() {
        LockMode::PerKey => info!("  Rendering: single-flight per path"),
        LockMode::Global => warn!("  Rendering: SERIALIZED - one render at a time for all paths"),
    }
    info!(
        "  In-flight limit: {} ({})",
        config.max_in_flight,
        if config.reject_when_busy {
            "reject when busy"
        } else {
            "queue when busy"
        }
    );
    if let Some(seed) = config.color_seed {
        info!("  Color seed: {}", seed);
    }

    let cache =
        AnimationCache::with_options(config.cache_ttl(), config.cache_size, config.lock_mode());
    let mut service = AnimationService::with_cache(config.root.clone(), cache);
    if let Some(seed) = config.color_seed {
        service = service.with_color_seed(seed);
    }

    let router = create_router(service, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  Try: curl -o out.gif 'http://{}/?f=photo.png'", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "huecache=debug,tower_http=debug"
    } else {
        "huecache=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    RouterConfig::new()
        .with_max_in_flight(config.max_in_flight)
        .with_reject_when_busy(config.reject_when_busy)
        .with_tracing(!config.no_tracing)
}
