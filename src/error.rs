use thiserror::Error;

/// Reasons an inbound request is rejected before any cache or render work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Only GET is served (maps to HTTP 405)
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The query string carried no value to use as a path
    #[error("Missing image path in query string")]
    MissingPath,

    /// The path does not point at an existing regular file
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The file extension is not one of jpg, png or gif
    #[error("Unsupported extension for {path} (allowed: .jpg, .png, .gif)")]
    UnsupportedExtension { path: String },
}

/// Errors raised while producing an animation for an accepted path.
///
/// These are `Clone` so that every request waiting on the same in-flight
/// computation receives the same failure.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Reading the source file failed
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// The source bytes could not be decoded as an image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// The frame sequence could not be encoded as a GIF
    #[error("Failed to encode animation: {message}")]
    Encode { message: String },

    /// The blocking render task failed to complete (panic or cancellation)
    #[error("Render task failed: {message}")]
    Internal { message: String },
}

impl RenderError {
    /// Whether the failure was caused by the input rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RenderError::Internal { .. })
    }
}
