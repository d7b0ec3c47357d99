use heapless::index_map::FnvIndexMap;

use crate::MAX_DEVICES;
use crate::elapsed_ms;
use crate::error::ConfigError;
use crate::split::message::{DeviceId, Message, MessageBatch, MessageKind};

/// Offset from a device's clock to host time, `host ≈ remote + offset` in wrapping arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockOffset {
    pub offset: u32,
    /// Host time of the last message from the device
    pub last_seen: u32,
}

impl ClockOffset {
    pub fn to_host(&self, remote: u32) -> u32 {
        remote.wrapping_add(self.offset)
    }
}

/// Clock offsets of all known devices.
///
/// An offset is (re)established when a device is first seen, when it sends `sync`, or when it
/// has been silent for longer than the resync idle time.
pub struct ClockSync {
    offsets: FnvIndexMap<DeviceId, ClockOffset, MAX_DEVICES>,
    resync_idle_ms: u32,
}

impl ClockSync {
    pub fn new(resync_idle_ms: u32) -> Self {
        Self {
            offsets: FnvIndexMap::new(),
            resync_idle_ms,
        }
    }

    pub fn offset(&self, device_id: &DeviceId) -> Option<ClockOffset> {
        self.offsets.get(device_id).copied()
    }

    pub fn forget(&mut self, device_id: &DeviceId) {
        self.offsets.remove(device_id);
    }

    pub fn align(&mut self, batch: &mut MessageBatch, host_now: u32) -> Result<(), ConfigError> {
        for message in batch.iter_mut() {
            let clock = self.clock_for(message, host_now)?;
            message.timestamp = clock.to_host(message.timestamp);
        }
        sort_by_timestamp(batch);
        Ok(())
    }

    fn clock_for(&mut self, message: &Message, host_now: u32) -> Result<ClockOffset, ConfigError> {
        let resync = ClockOffset {
            offset: host_now.wrapping_sub(message.timestamp),
            last_seen: host_now,
        };
        match self.offsets.get_mut(&message.device_id) {
            Some(clock) => {
                if message.kind == MessageKind::Sync {
                    trace!("Clock sync from {}", message.device_id.as_str());
                    *clock = resync;
                } else if elapsed_ms(clock.last_seen, host_now) > self.resync_idle_ms {
                    debug!("Device {} was idle, resyncing its clock", message.device_id.as_str());
                    *clock = resync;
                } else {
                    clock.last_seen = host_now;
                }
                Ok(*clock)
            }
            None => {
                debug!(
                    "First message from {}, clock offset {}",
                    message.device_id.as_str(),
                    resync.offset
                );
                self.offsets
                    .insert(message.device_id.clone(), resync)
                    .map_err(|_| {
                        error!("Clock table is full, can't track {}", message.device_id.as_str());
                        ConfigError::ClockTableFull
                    })?;
                Ok(resync)
            }
        }
    }
}

/// Stable sort, ties keep their input order.
///
/// Timestamps are compared on the wrapping clock, so ordering survives the u32 rollover.
fn sort_by_timestamp(batch: &mut [Message]) {
    for i in 1..batch.len() {
        let mut j = i;
        while j > 0 && (batch[j - 1].timestamp.wrapping_sub(batch[j].timestamp) as i32) > 0 {
            batch.swap(j - 1, j);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::split::message::device_id;

    fn batch(messages: &[Message]) -> MessageBatch {
        MessageBatch::from_slice(messages).unwrap()
    }

    fn key(ts: u32, id: &str, col: u8) -> Message {
        Message::key(ts, device_id(id).unwrap(), col, 0, true)
    }

    #[test]
    fn test_offset_established_on_first_sight() {
        let mut clock = ClockSync::new(5000);
        let mut b = batch(&[key(100, "left", 0), key(105, "left", 1)]);
        clock.align(&mut b, 1000).unwrap();
        assert_eq!(b[0].timestamp, 1000);
        assert_eq!(b[1].timestamp, 1005);

        // The offset is kept for later batches
        let mut b = batch(&[key(150, "left", 0)]);
        clock.align(&mut b, 1052).unwrap();
        assert_eq!(b[0].timestamp, 1050);
    }

    #[test]
    fn test_devices_are_merged_in_time_order() {
        let mut clock = ClockSync::new(5000);
        let mut b = batch(&[key(0, "left", 0), key(50_000, "right", 0)]);
        clock.align(&mut b, 1000).unwrap();

        let mut b = batch(&[key(30, "left", 1), key(50_020, "right", 1), key(10, "left", 2)]);
        clock.align(&mut b, 1040).unwrap();
        let order: std::vec::Vec<(u32, u8)> = b
            .iter()
            .map(|m| match m.kind {
                MessageKind::Key(e) => (m.timestamp, e.col),
                MessageKind::Sync => (m.timestamp, u8::MAX),
            })
            .collect();
        assert_eq!(order, [(1010, 2), (1020, 1), (1030, 1)]);
        assert_eq!(b[1].device_id.as_str(), "right");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let mut clock = ClockSync::new(5000);
        let mut b = batch(&[key(0, "a", 0), key(0, "b", 0)]);
        clock.align(&mut b, 10).unwrap();
        let mut b = batch(&[key(5, "b", 7), key(5, "a", 8)]);
        clock.align(&mut b, 20).unwrap();
        assert_eq!(b[0].device_id.as_str(), "b");
        assert_eq!(b[1].device_id.as_str(), "a");
    }

    #[test]
    fn test_resync_after_idle_and_on_sync() {
        let mut clock = ClockSync::new(5000);
        let left = device_id("left").unwrap();
        let mut b = batch(&[key(0, "left", 0)]);
        clock.align(&mut b, 1000).unwrap();
        assert_eq!(clock.offset(&left).unwrap().offset, 1000);

        // Silent for 6 s, the device rebooted and its clock restarted
        let mut b = batch(&[key(3, "left", 0)]);
        clock.align(&mut b, 7000).unwrap();
        assert_eq!(b[0].timestamp, 7000);

        let mut b = batch(&[Message::sync(500, left.clone())]);
        clock.align(&mut b, 7600).unwrap();
        assert_eq!(clock.offset(&left).unwrap().offset, 7100);
    }

    #[test]
    fn test_wrapping_offset() {
        let mut clock = ClockSync::new(5000);
        let mut b = batch(&[key(u32::MAX - 5, "left", 0)]);
        clock.align(&mut b, 10).unwrap();
        assert_eq!(b[0].timestamp, 10);
        let mut b = batch(&[key(4, "left", 0)]);
        clock.align(&mut b, 20).unwrap();
        assert_eq!(b[0].timestamp, 20);
    }

    #[test]
    fn test_clock_table_full() {
        let mut clock = ClockSync::new(5000);
        let ids = ["d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7"];
        for id in ids {
            clock.align(&mut batch(&[key(0, id, 0)]), 0).unwrap();
        }
        assert_eq!(
            clock.align(&mut batch(&[key(0, "d8", 0)]), 0),
            Err(ConfigError::ClockTableFull)
        );
    }
}
