//! Frame synthesis.
//!
//! An animation is built by colorizing one working buffer ten times with
//! random colors and snapshotting it after every step.
//!
//! # Cumulative Colorization
//!
//! The buffer is never reset to the source image between steps, so frame `i`
//! carries the blended colors of frames `0..=i`. Animations therefore drift
//! toward the later colors instead of flashing independent tints over the
//! source image.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use rand::Rng;

/// Number of frames in every animation.
pub const FRAME_COUNT: usize = 10;

/// Overlay opacity used by [`colorize`], out of 255.
pub const OVERLAY_STRENGTH: u8 = 128;

/// One frame of the animation and the color applied to produce it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Snapshot of the working buffer after this step
    pub buffer: RgbaImage,

    /// Color blended in at this step
    pub color: Rgba<u8>,
}

/// Draw one opaque random color per frame.
pub fn random_colors<R: Rng + ?Sized>(rng: &mut R) -> [Rgba<u8>; FRAME_COUNT] {
    std::array::from_fn(|_| Rgba([rng.gen(), rng.gen(), rng.gen(), u8::MAX]))
}

/// Blend `color` over every pixel of `buffer` in place.
///
/// RGB channels move [`OVERLAY_STRENGTH`]/255 of the way toward the color;
/// alpha is left untouched.
pub fn colorize(buffer: &mut RgbaImage, color: Rgba<u8>) {
    let strength = u16::from(OVERLAY_STRENGTH);
    for pixel in buffer.pixels_mut() {
        for channel in 0..3 {
            pixel[channel] = blend_channel(pixel[channel], color[channel], strength);
        }
    }
}

#[inline]
fn blend_channel(source: u8, overlay: u8, strength: u16) -> u8 {
    let keep = u16::from(u8::MAX) - strength;
    // Max value is 255 * 255 + 127, which fits in u16
    ((u16::from(source) * keep + u16::from(overlay) * strength + 127) / 255) as u8
}

// =============================================================================
// Frame Synthesizer
// =============================================================================

/// Turns a decoded image into [`FRAME_COUNT`] cumulatively colorized frames.
#[derive(Debug, Clone, Default)]
pub struct FrameSynthesizer {}

impl FrameSynthesizer {
    /// Create a new frame synthesizer.
    pub fn new() -> Self {
        Self {}
    }

    /// Produce exactly [`FRAME_COUNT`] frames from `image`.
    ///
    /// Colors come from `rng`; callers seed it per invocation. Each step
    /// colorizes the shared buffer, resizes it to its current size and
    /// snapshots the result.
    pub fn synthesize<R: Rng + ?Sized>(&self, image: DynamicImage, rng: &mut R) -> Vec<Frame> {
        let colors = random_colors(rng);
        let mut buffer = image.into_rgba8();
        let mut frames = Vec::with_capacity(FRAME_COUNT);

        for color in colors {
            colorize(&mut buffer, color);

            let (width, height) = buffer.dimensions();
            buffer = imageops::resize(&buffer, width, height, FilterType::Nearest);

            frames.push(Frame {
                buffer: buffer.clone(),
                color,
            });
        }

        frames
    }
}

// =============================================================================
// Tests
// =============================================================================
