//! Error types for the host side of the renderer.
//!
//! The tracing core itself never fails: degenerate numeric cases are clamped in
//! place. Errors only arise while loading configuration and input textures.

use thiserror::Error;

/// Renderer-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Texture could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
