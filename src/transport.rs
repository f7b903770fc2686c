//! Transport layer abstraction for printer communication.
//!
//! This module provides a unified interface over the two links the M02S
//! exposes: a serial port and a Bluetooth RFCOMM socket. The protocol
//! layer only ever sees the byte-stream contract; which backend carries it
//! is decided once, at construction.

use crate::error::Error;

/// Duplex byte stream carrying frames to and responses from the printer.
pub trait Transport {
    /// Write bytes to the transport.
    fn write(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Read exactly `buf.len()` bytes into the buffer.
    ///
    /// Fails with [`Error::ShortRead`] when the transport times out with
    /// fewer bytes, or [`Error::Disconnected`] when the peer closes the
    /// connection.
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error>;

    /// Flush any buffered data.
    fn flush(&mut self) -> Result<(), Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        (**self).read(buf)
    }

    fn flush(&mut self) -> Result<(), Error> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        (**self).read(buf)
    }

    fn flush(&mut self) -> Result<(), Error> {
        (**self).flush()
    }
}

pub mod serial {
    //! Serial port transport implementation.

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{self, Read, Write};
    use std::time::Duration;

    /// Device path the M02S registers under on macOS.
    pub const DEFAULT_PORT: &str = "/dev/tty.M02S";

    const READ_TIMEOUT: Duration = Duration::from_secs(10);

    /// Serial port transport.
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port in raw 8N1 mode with no flow control.
        ///
        /// Flow control must stay off: 0x11 (XON) and 0x13 (XOFF) both
        /// occur in raster data and in the query opcodes.
        pub fn open(device: &str) -> Result<Self, Error> {
            let port = serialport::new(device, 115_200)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(READ_TIMEOUT)
                .open()?;

            log::info!("Opened serial port {}", device);

            Ok(Self { port })
        }

        /// Open the default device path.
        pub fn open_default() -> Result<Self, Error> {
            Self::open(DEFAULT_PORT)
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<(), Error> {
            self.port.write_all(data)?;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            let mut filled = 0;
            while filled < buf.len() {
                match self.port.read(&mut buf[filled..]) {
                    Ok(0) => return Err(Error::Disconnected),
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                        return Err(Error::ShortRead {
                            expected: buf.len(),
                            actual: filled,
                        })
                    }
                    Err(e) => return Err(Error::Io(e)),
                }
            }
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Error> {
            self.port.flush()?;
            Ok(())
        }
    }
}

pub mod bluetooth {
    //! Raw Bluetooth RFCOMM socket transport.
    //!
    //! Uses AF_BLUETOOTH + SOCK_STREAM + BTPROTO_RFCOMM directly via libc.

    use super::*;
    use std::io;
    use std::os::unix::io::RawFd;
    use std::time::Duration;

    // Bluetooth socket constants (from <bluetooth/bluetooth.h> and <bluetooth/rfcomm.h>)
    const AF_BLUETOOTH: i32 = 31;
    const BTPROTO_RFCOMM: i32 = 3;

    /// RFCOMM channel the M02S answers on.
    ///
    /// The channel can be found by running `sdptool browse` but should be
    /// the same across devices.
    pub const DEFAULT_CHANNEL: u8 = 6;

    const IO_TIMEOUT: Duration = Duration::from_secs(10);

    /// sockaddr_rc structure for RFCOMM connections.
    #[repr(C)]
    struct SockaddrRc {
        rc_family: u16,
        rc_bdaddr: [u8; 6],
        rc_channel: u8,
    }

    /// Bluetooth RFCOMM socket transport.
    pub struct RfcommTransport {
        fd: RawFd,
    }

    impl RfcommTransport {
        /// Connect to a printer by address string (e.g. "04:7F:0E:AA:BB:CC").
        pub fn connect(addr: &str, channel: u8) -> Result<Self, Error> {
            let bdaddr = parse_bdaddr(addr)?;

            let fd = unsafe { libc::socket(AF_BLUETOOTH, libc::SOCK_STREAM, BTPROTO_RFCOMM) };
            if fd < 0 {
                return Err(Error::Io(io::Error::last_os_error()));
            }

            let sa = SockaddrRc {
                rc_family: AF_BLUETOOTH as u16,
                rc_bdaddr: bdaddr,
                rc_channel: channel,
            };

            let ret = unsafe {
                libc::connect(
                    fd,
                    &sa as *const SockaddrRc as *const libc::sockaddr,
                    std::mem::size_of::<SockaddrRc>() as libc::socklen_t,
                )
            };
            if ret < 0 {
                let err = io::Error::last_os_error();
                unsafe {
                    libc::close(fd);
                }
                return Err(Error::Io(err));
            }

            let transport = Self { fd };
            transport.set_timeout(IO_TIMEOUT)?;

            log::info!("Connected to {} on RFCOMM channel {}", addr, channel);

            Ok(transport)
        }

        /// Connect on the default RFCOMM channel.
        pub fn connect_default(addr: &str) -> Result<Self, Error> {
            Self::connect(addr, DEFAULT_CHANNEL)
        }

        fn set_timeout(&self, timeout: Duration) -> Result<(), Error> {
            let tv = libc::timeval {
                tv_sec: timeout.as_secs() as libc::time_t,
                tv_usec: timeout.subsec_micros() as libc::suseconds_t,
            };
            for opt in [libc::SO_RCVTIMEO, libc::SO_SNDTIMEO] {
                let ret = unsafe {
                    libc::setsockopt(
                        self.fd,
                        libc::SOL_SOCKET,
                        opt,
                        &tv as *const libc::timeval as *const libc::c_void,
                        std::mem::size_of::<libc::timeval>() as libc::socklen_t,
                    )
                };
                if ret < 0 {
                    return Err(Error::Io(io::Error::last_os_error()));
                }
            }
            Ok(())
        }
    }

    impl Transport for RfcommTransport {
        fn write(&mut self, data: &[u8]) -> Result<(), Error> {
            let mut sent = 0;
            while sent < data.len() {
                let n = unsafe {
                    libc::send(
                        self.fd,
                        data[sent..].as_ptr() as *const libc::c_void,
                        data.len() - sent,
                        0,
                    )
                };
                if n < 0 {
                    let err = io::Error::last_os_error();
                    return match err.kind() {
                        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => {
                            Err(Error::Disconnected)
                        }
                        _ => Err(Error::Io(err)),
                    };
                }
                sent += n as usize;
            }
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            let mut filled = 0;
            while filled < buf.len() {
                let n = unsafe {
                    libc::recv(
                        self.fd,
                        buf[filled..].as_mut_ptr() as *mut libc::c_void,
                        buf.len() - filled,
                        0,
                    )
                };
                if n == 0 {
                    return Err(Error::Disconnected);
                }
                if n < 0 {
                    let err = io::Error::last_os_error();
                    return match err.kind() {
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                            Err(Error::ShortRead {
                                expected: buf.len(),
                                actual: filled,
                            })
                        }
                        io::ErrorKind::ConnectionReset | io::ErrorKind::NotConnected => {
                            Err(Error::Disconnected)
                        }
                        _ => Err(Error::Io(err)),
                    };
                }
                filled += n as usize;
            }
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Error> {
            // Socket writes are not buffered on our side.
            Ok(())
        }
    }

    impl Drop for RfcommTransport {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.fd);
            }
        }
    }

    /// Parse a Bluetooth address string "XX:XX:XX:XX:XX:XX" into 6 bytes.
    /// BlueZ uses reversed byte order (LSB first).
    fn parse_bdaddr(addr: &str) -> Result<[u8; 6], Error> {
        let parts: Vec<&str> = addr.split(':').collect();
        if parts.len() != 6 {
            return Err(Error::InvalidAddress(addr.to_string()));
        }
        let mut bdaddr = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bdaddr[5 - i] = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidAddress(addr.to_string()))?;
        }
        Ok(bdaddr)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parse_bdaddr_reverses_bytes() {
            let addr = parse_bdaddr("04:7F:0E:AA:BB:CC").unwrap();
            assert_eq!(addr, [0xCC, 0xBB, 0xAA, 0x0E, 0x7F, 0x04]);
        }

        #[test]
        fn parse_bdaddr_rejects_garbage() {
            assert!(parse_bdaddr("not-an-address").is_err());
            assert!(parse_bdaddr("04:7F:0E:AA:BB").is_err());
            assert!(parse_bdaddr("04:7F:0E:AA:BB:XX").is_err());
        }
    }
}

pub use bluetooth::RfcommTransport;
pub use serial::SerialTransport;
