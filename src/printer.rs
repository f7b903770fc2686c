use image::DynamicImage;
use log::{debug, info};

use crate::{
    command::{self, Alignment},
    error::Error,
    preprocess::{self, DEFAULT_PADDING_TOP, DEFAULT_THRESHOLD},
    raster::{self, Bitmap},
    transport::Transport,
    MAX_WIDTH,
};

/// Print job configuration.
///
/// Holds the preprocessing parameters for [`Printer::print_image`].
///
/// # Example
///
/// ```
/// use phomemo_m02s::PrintConfig;
///
/// let config = PrintConfig::new().width(512).padding_top(5);
/// ```
#[derive(Debug, Clone)]
pub struct PrintConfig {
    width: u32,
    threshold: u8,
    padding_top: u32,
}

impl PrintConfig {
    /// Initialize configuration data with default values.
    pub fn new() -> PrintConfig {
        PrintConfig {
            width: MAX_WIDTH,
            threshold: DEFAULT_THRESHOLD,
            padding_top: DEFAULT_PADDING_TOP,
        }
    }

    /// Target print width in pixels. Must be a multiple of 8.
    pub fn width(self, width: u32) -> Self {
        PrintConfig { width, ..self }
    }

    /// Binarization cutoff on the inverted 0-255 luminance scale.
    pub fn threshold(self, threshold: u8) -> Self {
        PrintConfig { threshold, ..self }
    }

    /// Height of the blank lead-in chunk.
    pub fn padding_top(self, padding_top: u32) -> Self {
        PrintConfig { padding_top, ..self }
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver for one M02S printer over an open transport.
///
/// All methods are synchronous; query methods block until the fixed-length
/// reply arrives or the transport times out. The transport must not be
/// shared between callers — the protocol has no request IDs to untangle
/// interleaved exchanges.
pub struct Printer<T: Transport> {
    transport: T,
}

impl<T: Transport> Printer<T> {
    pub fn new(transport: T) -> Self {
        Printer { transport }
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), Error> {
        debug!("TX {} bytes: {:02X?}", frame.len(), &frame[..frame.len().min(16)]);
        self.transport.write(frame)?;
        self.transport.flush()
    }

    fn query(&mut self, frame: &[u8], response_len: usize) -> Result<Vec<u8>, Error> {
        self.write(frame)?;
        let mut buf = vec![0u8; response_len];
        self.transport.read(&mut buf)?;
        debug!("RX: {:02X?}", buf);
        Ok(buf)
    }

    /// Reset the printer to its power-on state.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.write(&command::initialize())
    }

    /// Reset the printer, discarding buffered data.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.write(&command::reset())
    }

    pub fn set_concentration(&mut self, val: u8) -> Result<(), Error> {
        self.write(&command::set_concentration(val))
    }

    pub fn set_device_timer(&mut self, val: u8) -> Result<(), Error> {
        self.write(&command::set_device_timer(val))
    }

    pub fn print_concentration(&mut self, val: u8) -> Result<(), Error> {
        self.write(&command::print_concentration(val))
    }

    /// Query the device serial number.
    pub fn serial_number(&mut self) -> Result<u64, Error> {
        let response = self.query(&command::get_serial_number(), command::UINT_RESPONSE_LEN)?;
        command::decode_uint_le(&response, 2)
    }

    /// Query the firmware version as a dotted string.
    pub fn firmware_version(&mut self) -> Result<String, Error> {
        let response = self.query(
            &command::get_firmware_version(),
            command::FIRMWARE_RESPONSE_LEN,
        )?;
        command::decode_firmware_version(&response)
    }

    /// Query the battery energy level.
    pub fn energy(&mut self) -> Result<u64, Error> {
        let response = self.query(&command::get_energy(), command::UINT_RESPONSE_LEN)?;
        command::decode_uint_le(&response, 2)
    }

    /// Query the auto power-off timer.
    pub fn device_timer(&mut self) -> Result<u64, Error> {
        let response = self.query(&command::get_device_timer(), command::UINT_RESPONSE_LEN)?;
        command::decode_uint_le(&response, 2)
    }

    /// Query the paper state.
    pub fn paper_state(&mut self) -> Result<u64, Error> {
        let response = self.query(&command::get_paper_state(), command::UINT_RESPONSE_LEN)?;
        command::decode_uint_le(&response, 2)
    }

    pub fn align(&mut self, alignment: Alignment) -> Result<(), Error> {
        self.write(&command::align(alignment))
    }

    pub fn feed_lines(&mut self, num: u8) -> Result<(), Error> {
        self.write(&command::feed_lines(num))
    }

    pub fn feed_paper(&mut self, num: u8) -> Result<(), Error> {
        self.write(&command::feed_paper(num))
    }

    /// Feed to the tear bar and cut.
    pub fn cut(&mut self) -> Result<(), Error> {
        self.write(&command::cut())
    }

    pub fn cut_partial(&mut self) -> Result<(), Error> {
        self.write(&command::cut_partial())
    }

    pub fn emphasis(&mut self, on: bool) -> Result<(), Error> {
        self.write(&command::emphasis(on))
    }

    pub fn line_feed(&mut self) -> Result<(), Error> {
        self.write(&command::line_feed())
    }

    /// Print one bitmap chunk as a raster bit image command.
    ///
    /// The bitmap must satisfy the wire format constraints (width a
    /// multiple of 8, at most 255 rows); [`Printer::print_image`] handles
    /// the chunking for arbitrary images.
    pub fn print_raster(&mut self, bitmap: &Bitmap) -> Result<(), Error> {
        let frame = raster::encode(bitmap)?;
        self.write(&frame)
    }

    /// Print an image, then cut.
    ///
    /// Runs the preprocessing pipeline and writes each raster chunk as it
    /// is produced. The source image is left untouched; the working bitmap
    /// is consumed by the chunk iterator.
    pub fn print_image(&mut self, image: &DynamicImage, config: &PrintConfig) -> Result<(), Error> {
        let bitmap = preprocess::binarize(image, config.width, config.threshold)?;
        info!(
            "printing {}x{} bitmap in {} row chunks",
            bitmap.width(),
            bitmap.height(),
            raster::MAX_CHUNK_ROWS
        );

        for chunk in preprocess::chunks(bitmap, config.padding_top) {
            self.print_raster(&chunk)?;
        }

        self.cut()
    }
}
