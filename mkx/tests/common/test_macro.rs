extern crate mkx;

// Run a key sequence through a test rig and compare the HID event stream
#[macro_export]
macro_rules! key_sequence_test {
    (rig: $rig:expr, sequence: [$([$device:expr, $col:expr, $row:expr, $pressed:expr, $time:expr]),* $(,)?], until: $until:expr, expected: [$($event:expr),* $(,)?]) => {
        let mut rig = $rig;
        let sequence = $crate::key_sequence![$([$device, $col, $row, $pressed, $time]),*];
        rig.run(&sequence, $until);
        let expected: Vec<mkx::hid::HidEvent> = vec![$($event),*];
        assert_eq!(rig.hid.as_slice(), expected.as_slice());
    };
}

// a rust macro to create a key sequence to simulate key presses
#[macro_export]
macro_rules! key_sequence {
    ($([$device:expr, $col:expr, $row:expr, $pressed:expr, $time:expr]),* $(,)?) => {
        vec![
            $(
                $crate::common::TestKeyPress {
                    device: $device,
                    col: $col,
                    row: $row,
                    pressed: $pressed,
                    time: $time,
                },
            )*
        ]
    };
}

#[macro_export]
macro_rules! press {
    ($key: ident) => {
        mkx::hid::HidEvent::Press(mkx::hid::HidCode::Key(mkx::keycode::KeyCode::$key))
    };
}

#[macro_export]
macro_rules! release {
    ($key: ident) => {
        mkx::hid::HidEvent::Release(mkx::hid::HidCode::Key(mkx::keycode::KeyCode::$key))
    };
}
