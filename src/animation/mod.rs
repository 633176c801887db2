//! Animation service layer.
//!
//! This module turns a source image into a cached, colorized GIF animation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            Animation Service            │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │AnimationCache│  │ Synthesizer +   │  │
//! │  │ (sliding TTL,│  │ GIF Encoder     │  │
//! │  │ single-flight│  │ (decode → 10    │  │
//! │  │  per key)    │  │  frames → GIF)  │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           Local filesystem              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`AnimationService`]: Entry point for accepted requests, orchestrates the pipeline
//! - [`AnimationCache`]: Payload cache with sliding expiration and single-flight fills
//! - [`FrameSynthesizer`]: Cumulatively colorizes one buffer into [`FRAME_COUNT`] frames
//! - [`AnimationEncoder`]: Encoder seam; [`GifAnimationEncoder`] is the real one

mod cache;
mod encoder;
mod frames;
mod service;

pub use cache::{
    AnimationCache, CacheLookup, LockMode, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL,
};
pub use encoder::{AnimationEncoder, GifAnimationEncoder, DEFAULT_GIF_SPEED, FRAME_DELAY_MS};
pub use frames::{colorize, random_colors, Frame, FrameSynthesizer, FRAME_COUNT, OVERLAY_STRENGTH};
pub use service::{AnimationResponse, AnimationService};
