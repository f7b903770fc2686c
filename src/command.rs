//! Command framing for the M02S protocol.
//!
//! Commands are fixed-layout byte sequences: one or two prefix bytes
//! selecting a command class, an opcode, and an optional payload. The
//! builders here do pure framing with no I/O; [`crate::Printer`] writes
//! the frames and reads the fixed-length replies.
//!
//! Multi-byte integers in status replies use little-endian encoding. The
//! firmware version reply is the one exception: its three segments arrive
//! in reverse display order. That asymmetry is device behavior, not a
//! design choice, and is preserved exactly.

use crate::error::Error;

/// NAK (0x15) - prefix for the non-standard concentration command.
pub const NAK: u8 = 0x15;

/// ESC (0x1B) - prefix for most control commands.
pub const ESC: u8 = 0x1B;

/// GS (0x1D) - prefix for raster graphics and cut commands.
pub const GS: u8 = 0x1D;

/// US (0x1F) - prefix for status query commands.
///
/// The vendor app issues some queries with NAK instead, but the device
/// only answers them reliably under US.
pub const US: u8 = 0x1F;

/// LF (0x0A) - print buffer contents and advance one line.
pub const LF: u8 = 0x0A;

/// Number of bytes in an integer query reply (2 echo bytes + 1 data byte).
pub const UINT_RESPONSE_LEN: usize = 3;

/// Number of bytes in a firmware version reply.
pub const FIRMWARE_RESPONSE_LEN: usize = 5;

/// Horizontal alignment for subsequent text and graphics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left = 0,
    Center = 1,
    Right = 2,
}

/// ESC @ : reset the printer to its power-on state.
pub fn initialize() -> Vec<u8> {
    vec![ESC, 0x40]
}

/// ESC @ 02 : reset, clearing buffered data.
pub fn reset() -> Vec<u8> {
    vec![ESC, 0x40, 0x02]
}

/// ESC N 04 v : set burn concentration.
pub fn set_concentration(val: u8) -> Vec<u8> {
    vec![ESC, 0x4E, 0x04, val]
}

/// ESC N 07 v : set the auto power-off timer.
pub fn set_device_timer(val: u8) -> Vec<u8> {
    vec![ESC, 0x4E, 0x07, val]
}

/// US 11 13 : query the device serial number.
pub fn get_serial_number() -> Vec<u8> {
    vec![US, 0x11, 0x13]
}

/// US 11 07 : query the firmware version.
pub fn get_firmware_version() -> Vec<u8> {
    vec![US, 0x11, 0x07]
}

/// US 11 08 : query the battery energy level.
pub fn get_energy() -> Vec<u8> {
    vec![US, 0x11, 0x08]
}

/// US 11 0E : query the auto power-off timer.
pub fn get_device_timer() -> Vec<u8> {
    vec![US, 0x11, 0x0E]
}

/// US 11 11 : query the paper state.
pub fn get_paper_state() -> Vec<u8> {
    vec![US, 0x11, 0x11]
}

/// NAK 11 02 v : set print concentration (non-standard command).
pub fn print_concentration(val: u8) -> Vec<u8> {
    vec![NAK, 0x11, 0x02, val]
}

/// ESC a n : set horizontal alignment.
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, 0x61, alignment as u8]
}

/// ESC d n : print and feed n lines.
pub fn feed_lines(num: u8) -> Vec<u8> {
    vec![ESC, 0x64, num]
}

/// ESC J n : print and feed n dot rows.
pub fn feed_paper(num: u8) -> Vec<u8> {
    vec![ESC, 0x4A, num]
}

/// GS V 01 : feed to the tear bar and cut.
pub fn cut() -> Vec<u8> {
    vec![GS, 0x56, 0x01]
}

/// GS V 42 00 : partial cut.
pub fn cut_partial() -> Vec<u8> {
    vec![GS, 0x56, 0x42, 0x00]
}

/// ESC E n : emphasized printing on or off.
pub fn emphasis(on: bool) -> Vec<u8> {
    vec![ESC, 0x45, on as u8]
}

/// LF : print the line buffer.
pub fn line_feed() -> Vec<u8> {
    vec![LF]
}

/// Decode an integer status reply.
///
/// The first `skip` bytes are framing/echo bytes and are discarded; the
/// remainder is a little-endian unsigned integer. Integer replies carry at
/// least one data byte, so anything shorter fails with
/// [`Error::ShortResponse`].
pub fn decode_uint_le(response: &[u8], skip: usize) -> Result<u64, Error> {
    if response.len() <= skip {
        return Err(Error::ShortResponse {
            expected: skip + 1,
            actual: response.len(),
        });
    }

    // Replies carry at most 8 data bytes.
    let mut value: u64 = 0;
    for (i, byte) in response[skip..].iter().take(8).enumerate() {
        value |= (*byte as u64) << (8 * i);
    }
    Ok(value)
}

/// Decode a firmware version reply into a dotted string.
///
/// The 5-byte reply carries the version segments at indices 4, 3 and 2,
/// most significant last on the wire. `[_, _, 1, 2, 3]` decodes to
/// "3.2.1". Unlike the integer replies this is not little-endian; the
/// reversed-segment order matches observed device behavior.
pub fn decode_firmware_version(response: &[u8]) -> Result<String, Error> {
    if response.len() < FIRMWARE_RESPONSE_LEN {
        return Err(Error::ShortResponse {
            expected: FIRMWARE_RESPONSE_LEN,
            actual: response.len(),
        });
    }

    Ok(format!(
        "{}.{}.{}",
        response[4], response[3], response[2]
    ))
}
