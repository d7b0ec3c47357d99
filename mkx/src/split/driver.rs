//! The abstracted driver layer of the split keyboard.

use embedded_io::{Read, ReadReady, Write};

pub use crate::error::SplitDriverError;

/// A byte link between the central and one peripheral.
///
/// Both sides are polled: `try_receive` must not block when nothing has arrived.
pub trait SplitTransport {
    /// Read whatever bytes are available into `buf`, returning how many were read.
    /// `Ok(0)` means nothing is pending.
    fn try_receive(&mut self, buf: &mut [u8]) -> Result<usize, SplitDriverError>;

    /// Send a complete frame
    fn send(&mut self, frame: &[u8]) -> Result<(), SplitDriverError>;
}

/// Split transport over a serial port, e.g. a UART
pub struct SerialSplitDriver<S: Read + ReadReady + Write> {
    serial: S,
}

impl<S: Read + ReadReady + Write> SerialSplitDriver<S> {
    pub fn new(serial: S) -> Self {
        Self { serial }
    }

    pub fn into_inner(self) -> S {
        self.serial
    }
}

impl<S: Read + ReadReady + Write> SplitTransport for SerialSplitDriver<S> {
    fn try_receive(&mut self, buf: &mut [u8]) -> Result<usize, SplitDriverError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let ready = self.serial.read_ready().map_err(|_e| SplitDriverError::SerialError)?;
        if !ready {
            return Ok(0);
        }
        match self.serial.read(buf) {
            // A ready port returning nothing has reached its end
            Ok(0) => Err(SplitDriverError::Disconnected),
            Ok(n) => Ok(n),
            Err(_e) => {
                error!("Serial split read error");
                Err(SplitDriverError::SerialError)
            }
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), SplitDriverError> {
        self.serial.write_all(frame).map_err(|_e| SplitDriverError::SerialError)?;
        self.serial.flush().map_err(|_e| SplitDriverError::SerialError)
    }
}
