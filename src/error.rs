//! Error types for M02S printer operations.
//!
//! This module defines all possible errors that can occur during printer
//! communication, image preprocessing, and raster encoding.

use thiserror::Error;

/// Main error type for M02S printer operations.
///
/// This enum encompasses all possible errors that can occur when using
/// the printer, from transport failures to raster format violations.
#[derive(Error, Debug)]
pub enum Error {
    /// Serial port error.
    ///
    /// Wraps underlying serialport errors for port open, configuration,
    /// or permission problems.
    #[error(transparent)]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Bitmap width is not a multiple of 8.
    ///
    /// The raster wire format packs 8 pixels per byte, so any other width
    /// cannot be represented. Raised before any bytes are written.
    #[error("Bitmap width {0} is not a multiple of 8")]
    InvalidWidth(u32),

    /// Bitmap has no rows or more rows than one raster command can carry.
    ///
    /// The header reserves two bytes for the row count but the device only
    /// accepts up to 255 rows per command; taller images must be chunked.
    #[error("Bitmap height {0} outside the 1..=255 row range")]
    InvalidHeight(u32),

    #[error("Source image has degenerate dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Status response shorter than its format requires.
    #[error("Response too short: needed {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    /// The transport returned fewer bytes than requested.
    #[error("Short read: requested {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// The transport connection was closed by the peer.
    #[error("Printer disconnected")]
    Disconnected,

    #[error("Invalid Bluetooth address: {0}")]
    InvalidAddress(String),

    /// Image decode or encode error.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
