//! Configuration management for Hue Cache.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `HUE_` prefix
//! - Sensible defaults for all settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use huecache::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//!
//! println!("Listening on {}", config.bind_address());
//! println!("Serving images from {}", config.root.display());
//! ```
//!
//! # Environment Variables
//!
//! - `HUE_HOST` - Server bind address (default: 127.0.0.1)
//! - `HUE_PORT` - Server port (default: 5050)
//! - `HUE_ROOT` - Directory request paths are resolved against (default: .)
//! - `HUE_CACHE_TTL` - Sliding cache expiration in seconds (default: 300)
//! - `HUE_CACHE_SIZE` - Max cached bytes (default: 256MB)
//! - `HUE_SERIALIZE_COMPUTE` - One render at a time across all paths (default: false)
//! - `HUE_MAX_IN_FLIGHT` - Max concurrently handled requests (default: 64)
//! - `HUE_REJECT_WHEN_BUSY` - Answer 503 instead of queueing (default: false)
//! - `HUE_COLOR_SEED` - Fixed seed for frame colors (default: random per render)

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::animation::{LockMode, DEFAULT_CACHE_CAPACITY};
use crate::server::DEFAULT_MAX_IN_FLIGHT;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5050;

/// Default sliding cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Hue Cache - colorized GIF animations of local images, cached.
///
/// Request `GET /?f=<path>` to receive a 10-frame animated GIF of the image
/// at `<path>`, tinted with random colors.
#[derive(Parser, Debug, Clone)]
#[command(name = "huecache")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HUE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "HUE_PORT")]
    pub port: u16,

    /// Directory that relative image paths are resolved against.
    #[arg(long, default_value = ".", env = "HUE_ROOT")]
    pub root: PathBuf,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Seconds an animation may sit unused before it expires.
    ///
    /// Every cache hit restarts the countdown.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, env = "HUE_CACHE_TTL")]
    pub cache_ttl: u64,

    /// Maximum total size of cached animations in bytes.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "HUE_CACHE_SIZE")]
    pub cache_size: usize,

    /// Run at most one cache lookup-or-render at a time, across all paths.
    ///
    /// By default only requests for the same path wait on each other.
    #[arg(long, default_value_t = false, env = "HUE_SERIALIZE_COMPUTE")]
    pub serialize_compute: bool,

    // =========================================================================
    // Concurrency Configuration
    // =========================================================================
    /// Maximum number of requests handled concurrently.
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT, env = "HUE_MAX_IN_FLIGHT")]
    pub max_in_flight: usize,

    /// Answer 503 when at the in-flight limit instead of queueing.
    #[arg(long, default_value_t = false, env = "HUE_REJECT_WHEN_BUSY")]
    pub reject_when_busy: bool,

    // =========================================================================
    // Rendering Configuration
    // =========================================================================
    /// Seed for frame colors, making renders reproducible.
    #[arg(long, env = "HUE_COLOR_SEED")]
    pub color_seed: Option<u64>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_ttl == 0 {
            return Err("cache_ttl must be greater than 0".to_string());
        }
        if self.cache_size == 0 {
            return Err("cache_size must be greater than 0".to_string());
        }
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be greater than 0".to_string());
        }
        if !self.root.is_dir() {
            return Err(format!(
                "root '{}' is not a directory. Set --root or HUE_ROOT",
                self.root.display()
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Sliding cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Cache lock mode selected by `--serialize-compute`.
    pub fn lock_mode(&self) -> LockMode {
        if self.serialize_compute {
            LockMode::Global
        } else {
            LockMode::PerKey
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
