use super::codec::encode;
use super::driver::SplitTransport;
use super::message::{DeviceId, Message};
use crate::config::PeripheralConfig;
use crate::error::MkxError;

/// Sending side of a peripheral: encodes its key events and keeps its clock synced with the
/// central.
pub struct Peripheral<T: SplitTransport> {
    transport: T,
    device_id: DeviceId,
    sync_interval_ms: u32,
    last_sync: Option<u32>,
}

impl<T: SplitTransport> Peripheral<T> {
    pub fn new(transport: T, device_id: DeviceId, config: PeripheralConfig) -> Self {
        Self {
            transport,
            device_id,
            sync_interval_ms: config.sync_interval.as_millis() as u32,
            last_sync: None,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send a key state change, `timestamp` is the peripheral's local clock in ms
    pub fn send_key_event(&mut self, timestamp: u32, col: u8, row: u8, pressed: bool) -> Result<(), MkxError> {
        debug!("Peripheral {} sending key ({}, {}) pressed: {}", self.device_id.as_str(), col, row, pressed);
        self.send(&Message::key(timestamp, self.device_id.clone(), col, row, pressed))
    }

    /// Send a clock sync message
    pub fn send_sync(&mut self, timestamp: u32) -> Result<(), MkxError> {
        self.send(&Message::sync(timestamp, self.device_id.clone()))?;
        self.last_sync = Some(timestamp);
        Ok(())
    }

    /// Call periodically, sends a sync message on the first call and then every `sync_interval`
    pub fn tick(&mut self, now: u32) -> Result<(), MkxError> {
        let due = match self.last_sync {
            None => true,
            Some(last) => crate::elapsed_ms(last, now) >= self.sync_interval_ms,
        };
        if due {
            trace!("Peripheral {} syncing clock at {}", self.device_id.as_str(), now);
            self.send_sync(now)?;
        }
        Ok(())
    }

    fn send(&mut self, message: &Message) -> Result<(), MkxError> {
        let frame = encode(message)?;
        self.transport.send(&frame)?;
        Ok(())
    }
}
