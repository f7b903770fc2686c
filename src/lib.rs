//! Phomemo M02S Printer Driver
//!
//! This crate provides a driver for the Phomemo M02S Bluetooth thermal
//! printer, reachable over a serial link or a Bluetooth RFCOMM socket.
//!
//! # Example
//!
//! ```rust,no_run
//! use phomemo_m02s::{Printer, PrintConfig, RfcommTransport};
//!
//! let transport = RfcommTransport::connect_default("04:7F:0E:AA:BB:CC").unwrap();
//! let mut printer = Printer::new(transport);
//! printer.initialize().unwrap();
//! let image = image::open("photo.png").unwrap();
//! printer.print_image(&image, &PrintConfig::new().width(512)).unwrap();
//! ```

mod command;
mod error;
mod preprocess;
mod printer;
mod raster;
mod transport;

pub use crate::{
    command::{decode_firmware_version, decode_uint_le, Alignment},
    error::Error,
    preprocess::{binarize, chunks, save_debug_bitmap, Chunks, DEFAULT_PADDING_TOP, DEFAULT_THRESHOLD},
    printer::{PrintConfig, Printer},
    raster::{encode, Bitmap, MAX_CHUNK_ROWS},
    transport::{RfcommTransport, SerialTransport, Transport},
};

/// Printable width in pixels of the M02S head.
///
/// Figured out empirically; a full-width raster row is 72 bytes
/// (576 / 8 = 72).
pub const MAX_WIDTH: u32 = 576;
