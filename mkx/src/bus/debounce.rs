use heapless::index_map::FnvIndexMap;

use crate::elapsed_ms;
use crate::split::message::{DeviceId, KeyEvent, MessageBatch, MessageKind};

/// Number of physical keys tracked by the debouncer
pub const DEBOUNCE_TABLE_SIZE: usize = 256;

/// Last accepted state of one physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceState {
    pub last_pressed: bool,
    pub last_change: u32,
}

/// Time-window debouncer keyed by `(device_id, col, row)`.
///
/// A state flip is accepted only when at least `window_ms` passed since the key's last observed
/// event. Repeated events with the same state always pass and refresh the timestamp.
pub struct Debouncer {
    states: FnvIndexMap<(DeviceId, u8, u8), DebounceState, DEBOUNCE_TABLE_SIZE>,
    window_ms: u32,
}

impl Debouncer {
    pub fn new(window_ms: u32) -> Self {
        Self {
            states: FnvIndexMap::new(),
            window_ms,
        }
    }

    pub fn state(&self, device_id: &DeviceId, col: u8, row: u8) -> Option<DebounceState> {
        self.states.get(&(device_id.clone(), col, row)).copied()
    }

    pub fn debounce(&mut self, batch: &mut MessageBatch) {
        batch.retain(|message| match message.kind {
            MessageKind::Key(event) => self.accept(&message.device_id, event, message.timestamp),
            MessageKind::Sync => false,
        });
    }

    /// Returns whether the event passes
    pub fn accept(&mut self, device_id: &DeviceId, event: KeyEvent, timestamp: u32) -> bool {
        let key = (device_id.clone(), event.col, event.row);
        match self.states.get_mut(&key) {
            Some(state) if state.last_pressed == event.pressed => {
                state.last_change = timestamp;
                true
            }
            Some(state) => {
                if elapsed_ms(state.last_change, timestamp) >= self.window_ms {
                    state.last_pressed = event.pressed;
                    state.last_change = timestamp;
                    true
                } else {
                    trace!(
                        "Debounced {} ({}, {}) at {}",
                        device_id.as_str(),
                        event.col,
                        event.row,
                        timestamp
                    );
                    false
                }
            }
            None => {
                let state = DebounceState {
                    last_pressed: event.pressed,
                    last_change: timestamp,
                };
                if self.states.insert(key, state).is_err() {
                    warn!("Debounce table full, {} passes untracked", device_id.as_str());
                }
                true
            }
        }
    }

    pub fn forget(&mut self, device_id: &DeviceId) {
        self.states.retain(|(id, _, _), _| id != device_id);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::split::message::{Message, device_id};

    fn run(debouncer: &mut Debouncer, messages: &[Message]) -> usize {
        let mut batch = MessageBatch::from_slice(messages).unwrap();
        debouncer.debounce(&mut batch);
        batch.len()
    }

    fn key(ts: u32, col: u8, pressed: bool) -> Message {
        Message::key(ts, device_id("left").unwrap(), col, 0, pressed)
    }

    #[test]
    fn test_debounce_boundary() {
        let mut d = Debouncer::new(5);
        assert_eq!(run(&mut d, &[key(100, 0, true)]), 1);
        assert_eq!(run(&mut d, &[key(104, 0, false)]), 0);
        assert_eq!(run(&mut d, &[key(105, 0, false)]), 1);
    }

    #[test]
    fn test_same_state_passes_and_refreshes() {
        let mut d = Debouncer::new(5);
        assert_eq!(run(&mut d, &[key(100, 0, true), key(102, 0, true)]), 2);
        // 5 ms after the first press, but only 3 ms after the refresh
        assert_eq!(run(&mut d, &[key(105, 0, false)]), 0);
        assert_eq!(run(&mut d, &[key(107, 0, false)]), 1);
        assert_eq!(
            d.state(&device_id("left").unwrap(), 0, 0),
            Some(DebounceState {
                last_pressed: false,
                last_change: 107
            })
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let mut d = Debouncer::new(5);
        assert_eq!(run(&mut d, &[key(100, 0, true), key(101, 1, true), key(102, 1, false)]), 2);
        assert_eq!(run(&mut d, &[key(103, 0, false), key(107, 1, false)]), 1);
    }

    #[test]
    fn test_non_key_messages_are_dropped() {
        let mut d = Debouncer::new(5);
        assert_eq!(run(&mut d, &[Message::sync(0, device_id("left").unwrap())]), 0);
    }
}
