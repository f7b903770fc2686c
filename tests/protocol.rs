//! Protocol-level tests driving the printer over a scripted transport.
//!
//! Every exchange is checked against the literal wire bytes the device
//! expects, so these tests pin the hardware contract without hardware.

use image::{DynamicImage, GrayImage, Luma};
use std::collections::VecDeque;

use phomemo_m02s::{Alignment, Error, PrintConfig, Printer, Transport};

/// In-memory transport that records writes and replays scripted replies.
struct ScriptedTransport {
    written: Vec<u8>,
    replies: VecDeque<u8>,
    connected: bool,
}

impl ScriptedTransport {
    fn new() -> Self {
        ScriptedTransport {
            written: Vec::new(),
            replies: VecDeque::new(),
            connected: true,
        }
    }

    fn with_reply(reply: &[u8]) -> Self {
        let mut transport = Self::new();
        transport.replies.extend(reply);
        transport
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        if !self.connected {
            return Err(Error::Disconnected);
        }
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if !self.connected {
            return Err(Error::Disconnected);
        }
        for (i, slot) in buf.iter_mut().enumerate() {
            match self.replies.pop_front() {
                Some(byte) => *slot = byte,
                None => {
                    return Err(Error::ShortRead {
                        expected: buf.len(),
                        actual: i,
                    })
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

fn uniform_image(width: u32, height: u32, luma: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([luma])))
}

#[test]
fn serial_number_query_round_trip() {
    let mut transport = ScriptedTransport::with_reply(&[0x00, 0x00, 0x2A]);
    let mut printer = Printer::new(&mut transport);

    assert_eq!(printer.serial_number().unwrap(), 42);
    drop(printer);
    assert_eq!(transport.written, vec![0x1F, 0x11, 0x13]);
}

#[test]
fn firmware_version_query_round_trip() {
    let mut transport = ScriptedTransport::with_reply(&[0x00, 0x00, 1, 2, 3]);
    let mut printer = Printer::new(&mut transport);

    assert_eq!(printer.firmware_version().unwrap(), "3.2.1");
    drop(printer);
    assert_eq!(transport.written, vec![0x1F, 0x11, 0x07]);
}

#[test]
fn energy_and_paper_state_queries() {
    let mut transport = ScriptedTransport::with_reply(&[0x00, 0x00, 0x5F, 0x00, 0x00, 0x01]);
    let mut printer = Printer::new(&mut transport);

    assert_eq!(printer.energy().unwrap(), 95);
    assert_eq!(printer.paper_state().unwrap(), 1);
    drop(printer);
    assert_eq!(
        transport.written,
        vec![0x1F, 0x11, 0x08, 0x1F, 0x11, 0x11]
    );
}

#[test]
fn query_with_empty_reply_is_a_short_read() {
    let mut transport = ScriptedTransport::new();
    let mut printer = Printer::new(&mut transport);

    match printer.device_timer() {
        Err(Error::ShortRead {
            expected: 3,
            actual: 0,
        }) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn disconnect_surfaces_unchanged() {
    let mut transport = ScriptedTransport::new();
    transport.connected = false;
    let mut printer = Printer::new(&mut transport);

    assert!(matches!(printer.initialize(), Err(Error::Disconnected)));
    assert!(matches!(printer.serial_number(), Err(Error::Disconnected)));
}

#[test]
fn control_commands_write_literal_frames() {
    let mut transport = ScriptedTransport::new();
    let mut printer = Printer::new(&mut transport);

    printer.initialize().unwrap();
    printer.reset().unwrap();
    printer.set_concentration(2).unwrap();
    printer.align(Alignment::Center).unwrap();
    printer.emphasis(true).unwrap();
    printer.feed_lines(4).unwrap();
    printer.cut().unwrap();
    drop(printer);

    let expected: Vec<u8> = [
        vec![0x1B, 0x40],
        vec![0x1B, 0x40, 0x02],
        vec![0x1B, 0x4E, 0x04, 0x02],
        vec![0x1B, 0x61, 0x01],
        vec![0x1B, 0x45, 0x01],
        vec![0x1B, 0x64, 0x04],
        vec![0x1D, 0x56, 0x01],
    ]
    .concat();
    assert_eq!(transport.written, expected);
}

/// Walk one raster frame in `data`, returning (byte_width, rows, rest).
fn parse_raster_frame(data: &[u8]) -> (u16, u16, &[u8]) {
    assert_eq!(&data[..4], &[0x1D, 0x76, 0x30, 0x00], "frame selector");
    let byte_width = u16::from_le_bytes([data[4], data[5]]);
    let rows = u16::from_le_bytes([data[6], data[7]]);
    let len = 8 + byte_width as usize * rows as usize;
    (byte_width, rows, &data[len..])
}

#[test]
fn print_image_emits_padding_chunks_and_cut() {
    let mut transport = ScriptedTransport::new();
    let mut printer = Printer::new(&mut transport);

    // Black 1024x512 source at width 512 scales to 512x256:
    // one 5 row padding chunk, a 255 row chunk, and a 1 row remainder.
    let image = uniform_image(1024, 512, 0);
    let config = PrintConfig::new().width(512);
    printer.print_image(&image, &config).unwrap();
    drop(printer);

    let stream = &transport.written[..];

    let (byte_width, rows, rest) = parse_raster_frame(stream);
    assert_eq!((byte_width, rows), (64, 5));
    assert!(
        stream[8..8 + 64 * 5].iter().all(|&b| b == 0x00),
        "padding chunk is blank"
    );

    let (byte_width, rows, rest2) = parse_raster_frame(rest);
    assert_eq!((byte_width, rows), (64, 255));
    assert!(
        rest[8..8 + 64 * 255].iter().all(|&b| b == 0xFF),
        "black source burns every dot"
    );

    let (byte_width, rows, rest3) = parse_raster_frame(rest2);
    assert_eq!((byte_width, rows), (64, 1));

    assert_eq!(rest3, &[0x1D, 0x56, 0x01], "job ends with a cut");
}

#[test]
fn print_image_rejects_unpackable_width_before_writing() {
    let mut transport = ScriptedTransport::new();
    let mut printer = Printer::new(&mut transport);

    let image = uniform_image(100, 100, 0);
    let config = PrintConfig::new().width(100);
    assert!(matches!(
        printer.print_image(&image, &config),
        Err(Error::InvalidWidth(100))
    ));
    drop(printer);

    assert!(
        transport.written.is_empty(),
        "no partial frame reaches the wire"
    );
}

#[test]
fn print_image_rejects_degenerate_source() {
    let mut transport = ScriptedTransport::new();
    let mut printer = Printer::new(&mut transport);

    let image = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
    let config = PrintConfig::new();
    assert!(matches!(
        printer.print_image(&image, &config),
        Err(Error::InvalidDimensions { .. })
    ));
}
