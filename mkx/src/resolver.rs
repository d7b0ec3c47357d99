use heapless::index_map::FnvIndexMap;

use crate::action::KeyAction;
use crate::error::ConfigError;
use crate::hid::HidSink;
use crate::key::sticky::StickyTracker;
use crate::key::{KeyRef, TimedKeyRegistry};
use crate::keymap::KeyMap;
use crate::layer::LayerStack;
use crate::split::message::DeviceId;

/// Maximum number of keys held at once across all devices
pub const PRESSED_KEY_MAP_SIZE: usize = 64;

/// Resolves `(device, logical index, pressed)` events into key behavior.
///
/// The key instance resolved at press time is remembered per position, and its release is always
/// routed to that same instance, whatever happened to the layer stack in between.
pub struct KeyResolver<'k> {
    keymap: KeyMap<'k>,
    layers: LayerStack,
    pressed: FnvIndexMap<(DeviceId, u16), KeyRef, PRESSED_KEY_MAP_SIZE>,
    timed: TimedKeyRegistry,
    sticky: StickyTracker,
}

impl<'k> KeyResolver<'k> {
    pub fn new(keymap: KeyMap<'k>, default_layer: u8) -> Result<Self, ConfigError> {
        let layers = LayerStack::new(default_layer, keymap.num_layers())?;
        Ok(Self {
            keymap,
            layers,
            pressed: FnvIndexMap::new(),
            timed: TimedKeyRegistry::new(),
            sticky: StickyTracker::new(),
        })
    }

    pub fn keymap(&self) -> &KeyMap<'k> {
        &self.keymap
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn timed_keys(&self) -> &TimedKeyRegistry {
        &self.timed
    }

    /// Key instance resolved for a held position
    pub fn pressed_key(&self, device_id: &DeviceId, index: u16) -> Option<KeyRef> {
        self.pressed.get(&(device_id.clone(), index)).copied()
    }

    /// Number of held positions
    pub fn pressed_count(&self) -> usize {
        self.pressed.len()
    }

    pub fn process<H: HidSink>(&mut self, device_id: &DeviceId, index: u16, pressed: bool, timestamp: u32, hid: &mut H) {
        if pressed {
            self.press(device_id, index, timestamp, hid);
        } else {
            self.release(device_id, index, timestamp, hid);
        }
    }

    /// Poll armed timed keys
    pub fn update_timers<H: HidSink>(&mut self, now: u32, hid: &mut H) {
        if !self.timed.is_empty() {
            self.timed.update(&mut self.keymap, &mut self.layers, hid, now);
        }
    }

    fn press<H: HidSink>(&mut self, device_id: &DeviceId, index: u16, timestamp: u32, hid: &mut H) {
        let pos = (device_id.clone(), index);
        if self.pressed.contains_key(&pos) {
            debug!("Ignoring repeated press of {} on {}", index, device_id.as_str());
            return;
        }

        let key = KeyRef::new(self.layers.top(), index);
        let (sticky, layer_control, timed) = match self.keymap.get(key) {
            None => {
                warn!("No key at index {} on layer {}", index, key.layer);
                return;
            }
            Some(KeyAction::No) => return,
            Some(action) => (action.is_sticky(), action.is_layer_control(), action.is_timed()),
        };

        // Remember the key before it runs, its own layer changes must not affect its release
        if self.pressed.insert(pos, key).is_err() {
            warn!("Too many keys held, release of {} will use the top layer", index);
        }

        if !sticky && !layer_control && !self.sticky.is_empty() {
            self.sticky.interrupt_all(&mut self.keymap);
        }

        if let Some(action) = self.keymap.get_mut(key) {
            trace!("Pressing {:?} at {:?}", action, key);
            action.on_press(&mut self.layers, hid, timestamp);
        }

        if timed {
            self.timed.register(key);
        }
        if sticky {
            self.sticky.register(&self.keymap, key);
        }
    }

    fn release<H: HidSink>(&mut self, device_id: &DeviceId, index: u16, timestamp: u32, hid: &mut H) {
        let key = match self.pressed.remove(&(device_id.clone(), index)) {
            Some(key) => key,
            None => {
                debug!("Untracked release of {} on {}, using the top layer", index, device_id.as_str());
                KeyRef::new(self.layers.top(), index)
            }
        };

        let Some(action) = self.keymap.get_mut(key) else {
            warn!("No key at index {} on layer {}", index, key.layer);
            return;
        };
        if matches!(action, KeyAction::No) {
            return;
        }

        trace!("Releasing {:?} at {:?}", action, key);
        action.on_release(&mut self.layers, hid, timestamp);
        if action.is_layer_control() || action.is_sticky() {
            return;
        }

        if !self.sticky.is_empty() {
            self.sticky.clear_all(&mut self.keymap, &mut self.layers, hid);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::action::{Action, LayerAction};
    use crate::hid::{HidCode, HidEvent};
    use crate::key::sticky::{Sticky, StickyState};
    use crate::keycode::KeyCode;
    use crate::modifier::ModifierCombination;
    use crate::split::message::device_id;

    type Events = heapless::Vec<HidEvent, 16>;

    fn key(code: KeyCode) -> KeyAction {
        KeyAction::Single(Action::Key(code))
    }

    #[test]
    fn test_release_follows_press_layer() {
        let mut l0 = [key(KeyCode::A), KeyAction::Single(Action::Layer(LayerAction::Toggle(1)))];
        let mut l1 = [key(KeyCode::B), KeyAction::No];
        let mut layers: [&mut [KeyAction]; 2] = [&mut l0, &mut l1];
        let mut resolver = KeyResolver::new(KeyMap::new(&mut layers).unwrap(), 0).unwrap();
        let left = device_id("left").unwrap();
        let mut hid = Events::new();

        resolver.process(&left, 0, true, 0, &mut hid);
        resolver.process(&left, 1, true, 1, &mut hid);
        resolver.process(&left, 1, false, 2, &mut hid);
        assert_eq!(resolver.layers().top(), 1);
        resolver.process(&left, 0, false, 3, &mut hid);

        assert_eq!(
            hid,
            [
                HidEvent::Press(HidCode::Key(KeyCode::A)),
                HidEvent::Release(HidCode::Key(KeyCode::A)),
            ]
        );
        assert_eq!(resolver.pressed_count(), 0);
    }

    #[test]
    fn test_duplicate_press_is_ignored() {
        let mut l0 = [KeyAction::Single(Action::Modified(ModifierCombination::LSHIFT, KeyCode::A))];
        let mut layers: [&mut [KeyAction]; 1] = [&mut l0];
        let mut resolver = KeyResolver::new(KeyMap::new(&mut layers).unwrap(), 0).unwrap();
        let left = device_id("left").unwrap();
        let mut hid = Events::new();

        resolver.process(&left, 0, true, 0, &mut hid);
        resolver.process(&left, 0, true, 1, &mut hid);
        assert_eq!(hid.len(), 4);
        assert!(resolver.pressed_key(&left, 0).is_some());
    }

    #[test]
    fn test_same_index_on_two_devices() {
        let mut l0 = [key(KeyCode::A)];
        let mut layers: [&mut [KeyAction]; 1] = [&mut l0];
        let mut resolver = KeyResolver::new(KeyMap::new(&mut layers).unwrap(), 0).unwrap();
        let left = device_id("left").unwrap();
        let right = device_id("right").unwrap();
        let mut hid = Events::new();

        resolver.process(&left, 0, true, 0, &mut hid);
        resolver.process(&right, 0, true, 1, &mut hid);
        assert_eq!(resolver.pressed_count(), 2);
        resolver.process(&left, 0, false, 2, &mut hid);
        assert!(resolver.pressed_key(&right, 0).is_some());
    }

    #[test]
    fn test_empty_slot_and_out_of_range() {
        let mut l0 = [KeyAction::No];
        let mut layers: [&mut [KeyAction]; 1] = [&mut l0];
        let mut resolver = KeyResolver::new(KeyMap::new(&mut layers).unwrap(), 0).unwrap();
        let left = device_id("left").unwrap();
        let mut hid = Events::new();

        resolver.process(&left, 0, true, 0, &mut hid);
        resolver.process(&left, 7, true, 0, &mut hid);
        resolver.process(&left, 0, false, 1, &mut hid);
        resolver.process(&left, 7, false, 1, &mut hid);
        assert!(hid.is_empty());
        assert_eq!(resolver.pressed_count(), 0);
    }

    #[test]
    fn test_layer_key_does_not_interrupt_sticky() {
        let mut l0 = [
            KeyAction::Sticky(Sticky::new(Action::Key(KeyCode::LShift), false, true)),
            KeyAction::Single(Action::Layer(LayerAction::Momentary(1, ModifierCombination::NONE))),
            key(KeyCode::A),
        ];
        let mut l1 = [KeyAction::No, KeyAction::No, KeyAction::No];
        let mut layers: [&mut [KeyAction]; 2] = [&mut l0, &mut l1];
        let mut resolver = KeyResolver::new(KeyMap::new(&mut layers).unwrap(), 0).unwrap();
        let left = device_id("left").unwrap();
        let mut hid = Events::new();

        resolver.process(&left, 0, true, 0, &mut hid);
        resolver.process(&left, 1, true, 10, &mut hid);
        resolver.process(&left, 1, false, 20, &mut hid);
        resolver.process(&left, 0, false, 30, &mut hid);
        match resolver.keymap().get(KeyRef::new(0, 0)) {
            Some(KeyAction::Sticky(sticky)) => assert_eq!(sticky.state(), StickyState::Active),
            _ => panic!("expected a sticky key"),
        }
        assert_eq!(hid, [HidEvent::Press(HidCode::Key(KeyCode::LShift))]);

        resolver.process(&left, 2, true, 40, &mut hid);
        resolver.process(&left, 2, false, 50, &mut hid);
        assert_eq!(
            hid,
            [
                HidEvent::Press(HidCode::Key(KeyCode::LShift)),
                HidEvent::Press(HidCode::Key(KeyCode::A)),
                HidEvent::Release(HidCode::Key(KeyCode::A)),
                HidEvent::Release(HidCode::Key(KeyCode::LShift)),
            ]
        );
    }

    #[test]
    fn test_invalid_default_layer() {
        let mut l0 = [KeyAction::No];
        let mut layers: [&mut [KeyAction]; 1] = [&mut l0];
        assert_eq!(
            KeyResolver::new(KeyMap::new(&mut layers).unwrap(), 1).err(),
            Some(ConfigError::InvalidDefaultLayer)
        );
    }
}
