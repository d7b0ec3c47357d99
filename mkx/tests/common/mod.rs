pub mod test_macro;

use log::debug;
use mkx::action::KeyAction;
use mkx::central::Central;
use mkx::config::CentralConfig;
use mkx::hid::HidEvent;
use mkx::interface::Interface;
use mkx::keymap::KeyMap;
use mkx::split::codec::encode;
use mkx::split::message::{Message, device_id};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Frame duration used by the test rig, in ms
pub const FRAME_MS: u32 = 5;

pub type HidLog = heapless::Vec<HidEvent, 128>;

#[derive(Debug, Clone)]
pub struct TestKeyPress {
    pub device: &'static str,
    pub col: u8,
    pub row: u8,
    pub pressed: bool,
    /// Device timestamp of the event, in ms
    pub time: u32,
}

/// Leak a keymap built from owned layers, so that it lives as long as the test
pub fn leak_keymap(layers: Vec<Vec<KeyAction>>) -> KeyMap<'static> {
    let layers: Vec<&'static mut [KeyAction]> = layers.into_iter().map(|l| Vec::leak(l)).collect();
    KeyMap::new(Vec::leak(layers)).unwrap()
}

/// A central fed with encoded frames, with every device clock equal to host time
pub struct TestRig {
    pub central: Central<'static>,
    pub hid: HidLog,
    devices: Vec<&'static str>,
    now: u32,
}

impl TestRig {
    pub fn new(keymap: KeyMap<'static>, interfaces: Vec<Interface>) -> Self {
        let mut central = Central::new(keymap, 0, CentralConfig::default()).unwrap();
        let mut devices = Vec::new();
        for interface in interfaces {
            let name: &'static str = String::leak(interface.device_id().as_str().to_string());
            central.add_interface(interface).unwrap();
            devices.push(name);
        }
        Self {
            central,
            hid: HidLog::new(),
            devices,
            now: 0,
        }
    }

    pub fn now(&self) -> u32 {
        self.now
    }

    /// Encode an event and feed it to the link of its device
    pub fn send(&mut self, key: &TestKeyPress) {
        let message = Message::key(key.time, device_id(key.device).unwrap(), key.col, key.row, key.pressed);
        let frame = encode(&message).unwrap();
        let link = self.devices.iter().position(|d| *d == key.device).unwrap_or(usize::MAX);
        self.central.receive(link, &frame);
    }

    /// Run frames until `until`, delivering every event in the first frame at or after its time
    pub fn run(&mut self, sequence: &[TestKeyPress], until: u32) {
        let mut pending = sequence.iter().peekable();
        while self.now <= until {
            while let Some(key) = pending.next_if(|k| k.time <= self.now) {
                debug!("t={} {:?}", self.now, key);
                self.send(key);
            }
            self.central.tick(self.now, &mut self.hid).unwrap();
            self.now += FRAME_MS;
        }
    }
}
