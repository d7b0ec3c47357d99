pub mod common;

use mkx::action::KeyAction;
use mkx::interface::Interface;
use mkx::{a, k, mo};

use crate::common::{TestRig, leak_keymap};

// 4 x 2 keymap, "left" covers columns 0..=1 and "right" columns 2..=3
pub fn create_test_rig() -> TestRig {
    let layers: Vec<Vec<KeyAction>> = vec![
        mkx::layer!([[k!(A), k!(B), k!(C), k!(D)], [mo!(1), k!(E), a!(No), k!(F)]]).to_vec(),
        mkx::layer!([[k!(Kc1), a!(No), k!(Kc2), a!(No)], [a!(No), a!(No), a!(No), a!(No)]]).to_vec(),
    ];
    TestRig::new(
        leak_keymap(layers),
        vec![
            Interface::rect("left", 4, 0, 0, 1, 1).unwrap(),
            Interface::rect("right", 4, 2, 0, 3, 1).unwrap(),
        ],
    )
}

mod keyboard_test {
    use mkx::split::codec::encode;
    use mkx::split::message::{Message, device_id};

    use super::*;
    use crate::{key_sequence_test, press, release};

    #[test]
    fn test_tap_on_each_device() {
        key_sequence_test! {
            rig: create_test_rig(),
            sequence: [
                ["left", 0, 0, true, 0],
                ["left", 0, 0, false, 50],
                ["right", 1, 1, true, 100],
                ["right", 1, 1, false, 150],
            ],
            until: 200,
            expected: [press!(A), release!(A), press!(F), release!(F)]
        }
    }

    #[test]
    fn test_momentary_layer_across_devices() {
        key_sequence_test! {
            rig: create_test_rig(),
            sequence: [
                ["left", 0, 1, true, 0],   // mo!(1)
                ["right", 0, 0, true, 20], // Kc2 on layer 1
                ["right", 0, 0, false, 40],
                ["left", 0, 1, false, 60],
                ["right", 0, 0, true, 80], // C on layer 0
                ["right", 0, 0, false, 100],
            ],
            until: 150,
            expected: [press!(Kc2), release!(Kc2), press!(C), release!(C)]
        }
    }

    #[test]
    fn test_no_stuck_key_when_layer_released_first() {
        key_sequence_test! {
            rig: create_test_rig(),
            sequence: [
                ["left", 0, 1, true, 0],
                ["right", 0, 0, true, 20],
                ["left", 0, 1, false, 40], // Layer 1 is gone before the key is released
                ["right", 0, 0, false, 60],
            ],
            until: 100,
            expected: [press!(Kc2), release!(Kc2)]
        }
    }

    #[test]
    fn test_same_frame_events_are_ordered_by_time() {
        key_sequence_test! {
            rig: create_test_rig(),
            sequence: [
                ["left", 0, 0, true, 0],
                ["right", 0, 0, true, 0],
                ["left", 0, 0, false, 10],
                ["right", 0, 0, false, 10],
                // Arrive in the same frame, right first
                ["right", 1, 0, true, 98],
                ["left", 1, 0, true, 96],
                ["left", 1, 0, false, 150],
                ["right", 1, 0, false, 150],
            ],
            until: 200,
            expected: [
                press!(A),
                press!(C),
                release!(A),
                release!(C),
                press!(B),
                press!(D),
                release!(B),
                release!(D),
            ]
        }
    }

    #[test]
    fn test_bounce_is_filtered() {
        key_sequence_test! {
            rig: create_test_rig(),
            sequence: [
                ["left", 0, 0, true, 0],
                ["left", 0, 0, false, 2], // Bounce, within the 5ms window
                ["left", 0, 0, true, 4],
                ["left", 0, 0, false, 50],
            ],
            until: 100,
            expected: [press!(A), release!(A)]
        }
    }

    #[test]
    fn test_unknown_device_is_dropped() {
        let mut rig = create_test_rig();
        let ghost = device_id("ghost").unwrap();
        rig.central.receive(0, &encode(&Message::key(0, ghost.clone(), 0, 0, true)).unwrap());
        rig.central.receive(1, &encode(&Message::key(10, ghost, 0, 0, false)).unwrap());
        rig.run(&[], 50);
        assert!(rig.hid.is_empty());
        assert_eq!(rig.central.resolver().pressed_count(), 0);
    }

    #[test]
    fn test_unmapped_position_is_ignored() {
        key_sequence_test! {
            rig: create_test_rig(),
            sequence: [
                ["left", 2, 0, true, 0], // Outside the left half
                ["left", 2, 0, false, 20],
                ["left", 1, 1, true, 40],
                ["left", 1, 1, false, 60],
            ],
            until: 100,
            expected: [press!(E), release!(E)]
        }
    }
}
