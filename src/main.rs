//! # Phomemo M02S CLI
//!
//! Command-line utility for printing images on the M02S.
//!
//! ## Usage
//!
//! ```bash
//! # Print an image over the default serial port
//! phomemo-m02s photo.png
//!
//! # Print over Bluetooth RFCOMM
//! phomemo-m02s photo.png --mac 04:7F:0E:AA:BB:CC
//!
//! # Generate and print the width test image
//! phomemo-m02s --test
//!
//! # Only run the preprocessing pipeline and save converted.png
//! phomemo-m02s photo.png --convert-only
//! ```

use clap::Parser;
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use std::process;

use phomemo_m02s::{
    binarize, save_debug_bitmap, Alignment, Error, PrintConfig, Printer, RfcommTransport,
    SerialTransport, Transport, DEFAULT_THRESHOLD, MAX_WIDTH,
};

/// Phomemo M02S thermal printer utility
#[derive(Parser, Debug)]
#[command(name = "phomemo-m02s")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image file to print
    #[arg(required_unless_present = "test")]
    image: Option<PathBuf>,

    /// Target print width in pixels
    #[arg(long, default_value_t = MAX_WIDTH)]
    width: u32,

    /// Generate a test image and print that instead
    #[arg(long)]
    test: bool,

    /// Run the preprocessing pipeline, save converted.png, and exit
    #[arg(long)]
    convert_only: bool,

    /// Serial port device path
    #[arg(long, default_value = "/dev/tty.M02S")]
    port: String,

    /// Bluetooth address (selects the RFCOMM transport)
    #[arg(long)]
    mac: Option<String>,

    /// RFCOMM channel
    #[arg(long, default_value_t = 6)]
    channel: u8,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    let image_path = match (cli.test, &cli.image) {
        (true, _) => make_test_image(cli.width)?,
        (false, Some(path)) => path.clone(),
        (false, None) => {
            // clap enforces required_unless_present = "test"
            eprintln!("an image path is required unless --test is given");
            process::exit(2);
        }
    };

    let image = image::open(&image_path)?;

    if cli.convert_only {
        let bitmap = binarize(&image, cli.width, DEFAULT_THRESHOLD)?;
        save_debug_bitmap(&bitmap, "converted.png")?;
        println!("Saved converted.png");
        return Ok(());
    }

    let transport: Box<dyn Transport> = match &cli.mac {
        Some(mac) => Box::new(RfcommTransport::connect(mac, cli.channel)?),
        None => Box::new(SerialTransport::open(&cli.port)?),
    };
    let mut printer = Printer::new(transport);

    printer.initialize()?;
    printer.reset()?;
    println!("Serial number: {}", printer.serial_number()?);
    println!("Firmware: {}", printer.firmware_version()?);
    println!("Paper state: {}", printer.paper_state()?);
    println!("Energy: {}", printer.energy()?);

    printer.initialize()?;
    printer.align(Alignment::Center)?;

    printer.print_image(&image, &PrintConfig::new().width(cli.width))?;

    printer.reset()
}

/// Draw the framed test bar used to verify width and alignment.
fn make_test_image(width: u32) -> Result<PathBuf, Error> {
    let height = 30;
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let black = Rgb([0u8, 0, 0]);

    for y in 10..height.saturating_sub(9) {
        for x in 10..width.saturating_sub(9) {
            img.put_pixel(x, y, black);
        }
    }
    for x in 0..width {
        img.put_pixel(x, 0, black);
        img.put_pixel(x, height - 1, black);
    }
    for y in 0..height {
        img.put_pixel(0, y, black);
        img.put_pixel(width - 1, y, black);
    }

    let path = PathBuf::from("test.png");
    img.save(&path)?;
    Ok(path)
}
