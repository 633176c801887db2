//! GIF animation encoder.
//!
//! The encoder is the last step of the render pipeline: it turns the frame
//! sequence into the bytes that are cached and sent to the client.
//!
//! # Design Decisions
//!
//! - **Payload is the encoder output**: the returned buffer is exactly what
//!   the GIF encoder wrote, trailer included. An empty result is an error.
//!
//! - **Loop forever**: animations repeat infinitely with a fixed delay.
//!
//! - **Fixed quantizer speed**: NeuQuant speed 10 trades a little palette
//!   quality for much faster encodes than the slowest setting.

use bytes::Bytes;
use image::codecs::gif::{GifEncoder, Repeat};
use image::Delay;

use crate::error::RenderError;

use super::frames::Frame;

/// Delay between frames in milliseconds.
pub const FRAME_DELAY_MS: u32 = 100;

/// NeuQuant sampling speed (1 = best quality, 30 = fastest).
pub const DEFAULT_GIF_SPEED: i32 = 10;

/// Serializes a frame sequence into an animation payload.
///
/// Implementations must be deterministic for identical input and must return
/// a non-empty payload for one or more frames.
pub trait AnimationEncoder: Send + Sync {
    /// Encode `frames` in order.
    fn encode(&self, frames: &[Frame]) -> Result<Bytes, RenderError>;
}

// =============================================================================
// GIF Encoder
// =============================================================================

/// Encodes frames as an infinitely looping animated GIF.
#[derive(Debug, Clone)]
pub struct GifAnimationEncoder {
    speed: i32,
    delay_ms: u32,
}

impl GifAnimationEncoder {
    /// Create an encoder with the default speed and frame delay.
    pub fn new() -> Self {
        Self {
            speed: DEFAULT_GIF_SPEED,
            delay_ms: FRAME_DELAY_MS,
        }
    }

    /// Frame delay in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}

impl Default for GifAnimationEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationEncoder for GifAnimationEncoder {
    fn encode(&self, frames: &[Frame]) -> Result<Bytes, RenderError> {
        if frames.is_empty() {
            return Err(RenderError::Encode {
                message: "no frames to encode".to_string(),
            });
        }

        let mut output = Vec::new();
        {
            // The GIF trailer is written when the encoder is dropped
            let mut encoder = GifEncoder::new_with_speed(&mut output, self.speed);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| RenderError::Encode {
                    message: e.to_string(),
                })?;

            let delay = Delay::from_numer_denom_ms(self.delay_ms, 1);
            encoder
                .encode_frames(
                    frames
                        .iter()
                        .map(|frame| image::Frame::from_parts(frame.buffer.clone(), 0, 0, delay)),
                )
                .map_err(|e| RenderError::Encode {
                    message: e.to_string(),
                })?;
        }

        if output.is_empty() {
            return Err(RenderError::Encode {
                message: "encoder produced no output".to_string(),
            });
        }

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Tests
// =============================================================================
