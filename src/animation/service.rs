//! Animation Service for orchestrating render and cache.
//!
//! The AnimationService is the entry point for accepted requests. It runs the
//! render pipeline through the cache:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        AnimationService                          │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │                     get_animation()                        │  │
//! │  │  1. Cache lookup        3. Decode + synthesize frames      │  │
//! │  │  2. Read source file    4. Encode GIF, store & return      │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! │          │                      │                     │          │
//! │          ▼                      ▼                     ▼          │
//! │  ┌────────────────┐  ┌──────────────────┐  ┌──────────────────┐  │
//! │  │ AnimationCache │  │ FrameSynthesizer │  │ AnimationEncoder │  │
//! │  └────────────────┘  └──────────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::error::RenderError;

use super::cache::AnimationCache;
use super::encoder::{AnimationEncoder, GifAnimationEncoder};
use super::frames::FrameSynthesizer;

// =============================================================================
// Animation Response
// =============================================================================

/// Response from the animation service.
#[derive(Debug, Clone)]
pub struct AnimationResponse {
    /// The encoded GIF
    pub data: Bytes,

    /// Whether this animation was served from cache
    pub cache_hit: bool,
}

// =============================================================================
// Animation Service
// =============================================================================

/// Service for rendering and caching colorized animations.
///
/// Source paths are resolved against a root directory; the cache key is
/// always the path exactly as requested.
///
/// # Example
///
/// ```ignore
/// use huecache::animation::{AnimationCache, AnimationService};
///
/// let service = AnimationService::with_cache("./images", AnimationCache::default());
/// let response = service.get_animation("photo.png").await?;
///
/// println!("{} bytes, cache hit: {}", response.data.len(), response.cache_hit);
/// ```
pub struct AnimationService {
    /// Cache for encoded animations
    cache: AnimationCache,

    /// Frame synthesizer
    synthesizer: FrameSynthesizer,

    /// Animation encoder (shared with blocking render tasks)
    encoder: Arc<dyn AnimationEncoder>,

    /// Directory that relative request paths are resolved against
    root: PathBuf,

    /// Fixed seed for color generation; fresh entropy per render when unset
    color_seed: Option<u64>,

    /// Number of renders started
    renders: AtomicU64,
}

impl AnimationService {
    /// Create a service with a default cache (5 minute sliding TTL).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cache(root, AnimationCache::default())
    }

    /// Create a service around an existing cache.
    pub fn with_cache(root: impl Into<PathBuf>, cache: AnimationCache) -> Self {
        Self {
            cache,
            synthesizer: FrameSynthesizer::new(),
            encoder: Arc::new(GifAnimationEncoder::new()),
            root: root.into(),
            color_seed: None,
            renders: AtomicU64::new(0),
        }
    }

    /// Replace the animation encoder.
    pub fn with_encoder(mut self, encoder: Arc<dyn AnimationEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Seed every render's color generator with `seed`.
    ///
    /// Renders of the same file then produce identical payloads.
    pub fn with_color_seed(mut self, seed: u64) -> Self {
        self.color_seed = Some(seed);
        self
    }

    /// Get an animation, using cache when available.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, decoded or encoded.
    /// Errors are never cached.
    pub async fn get_animation(&self, path: &str) -> Result<AnimationResponse, RenderError> {
        let lookup = self
            .cache
            .get_or_compute(path, || self.render(path))
            .await?;

        if lookup.cache_hit {
            info!("Cache hit for {}", path);
        }

        Ok(AnimationResponse {
            data: lookup.payload,
            cache_hit: lookup.cache_hit,
        })
    }

    /// Render an animation without consulting or filling the cache.
    ///
    /// Decoding, frame synthesis and encoding run on the blocking pool.
    pub async fn render(&self, path: &str) -> Result<Bytes, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        info!("Processing request for {}", path);

        let file = self.resolve(path);
        let source = tokio::fs::read(&file)
            .await
            .map_err(|e| RenderError::Read {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let synthesizer = self.synthesizer.clone();
        let encoder = Arc::clone(&self.encoder);
        let mut rng = match self.color_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&source).map_err(|e| RenderError::Decode {
                message: e.to_string(),
            })?;
            let frames = synthesizer.synthesize(image, &mut rng);
            encoder.encode(&frames)
        })
        .await
        .map_err(|e| RenderError::Internal {
            message: e.to_string(),
        })?
    }

    /// Resolve a requested path against the root directory.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Directory relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of renders started since creation (cache misses that computed).
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }

    /// Get animation cache statistics.
    ///
    /// Returns `(current_size, capacity, entry_count)`.
    pub async fn cache_stats(&self) -> (usize, usize, usize) {
        let size = self.cache.size().await;
        let capacity = self.cache.capacity();
        let count = self.cache.len().await;
        (size, capacity, count)
    }

    /// Get a reference to the underlying cache.
    pub fn cache(&self) -> &AnimationCache {
        &self.cache
    }
}

// =============================================================================
// Tests
// =============================================================================
