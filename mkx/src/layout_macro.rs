/// Create a layer in keymap. Rows are flattened into logical indices, row by row.
#[macro_export]
macro_rules! layer {
    ([$([$($x: expr), +]), +]) => {
        [$($($x), +), +]
    };
}

/// Create a normal key. For example, `k!(A)` represents `KeyAction::Single(Action::Key(KeyCode::A))`
#[macro_export]
macro_rules! k {
    ($k: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Key($crate::keycode::KeyCode::$k))
    };
}

/// Create a normal action: `KeyAction`
#[macro_export]
macro_rules! a {
    ($a: ident) => {
        $crate::action::KeyAction::$a
    };
}

/// Create a key tapped with modifiers, e.g. `wm!(A, ModifierCombination::LCTRL)`
#[macro_export]
macro_rules! wm {
    ($x: ident, $m: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::Modified($m, $crate::keycode::KeyCode::$x))
    };
}

/// Create a shifted key
#[macro_export]
macro_rules! shifted {
    ($x: ident) => {
        $crate::wm!($x, $crate::modifier::ModifierCombination::LSHIFT)
    };
}

/// Create a media key, e.g. `media!(Mute)`
#[macro_export]
macro_rules! media {
    ($k: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Media($crate::keycode::ConsumerKey::$k))
    };
}

/// Create a mouse action.
///
/// `mouse!(LEFT)` holds a button, `mouse!(click LEFT)` clicks it, `mouse!(release LEFT)` releases it
/// and `mouse!(x: 10, y: 0, wheel: 0)` moves the pointer.
#[macro_export]
macro_rules! mouse {
    (click $b: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Mouse($crate::action::MouseAction::Click(
            $crate::mouse_button::MouseButtons::$b,
        )))
    };
    (release $b: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Mouse($crate::action::MouseAction::Release(
            $crate::mouse_button::MouseButtons::$b,
        )))
    };
    (x: $x: expr, y: $y: expr, wheel: $w: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::Mouse($crate::action::MouseAction::Move {
            x: $x,
            y: $y,
            wheel: $w,
        }))
    };
    ($b: ident) => {
        $crate::action::KeyAction::Single($crate::action::Action::Mouse($crate::action::MouseAction::Press(
            $crate::mouse_button::MouseButtons::$b,
        )))
    };
}

/// Create a layer activate action. For example, `mo!(1)` activates layer 1.
#[macro_export]
macro_rules! mo {
    ($x: literal) => {
        $crate::action::KeyAction::Single($crate::action::Action::Layer($crate::action::LayerAction::Momentary(
            $x,
            $crate::modifier::ModifierCombination::NONE,
        )))
    };
}

/// Create a layer activate with modifier action
#[macro_export]
macro_rules! lm {
    ($x: literal, $m: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::Layer($crate::action::LayerAction::Momentary(
            $x, $m,
        )))
    };
}

/// Create a layer toggle action
#[macro_export]
macro_rules! tg {
    ($x: literal) => {
        $crate::action::KeyAction::Single($crate::action::Action::Layer($crate::action::LayerAction::Toggle($x)))
    };
}

/// Create a layer toggle only action (activate layer `n` and deactivate all other layers), `n` is the layer number
#[macro_export]
macro_rules! to {
    ($x: literal) => {
        $crate::action::KeyAction::Single($crate::action::Action::Layer($crate::action::LayerAction::To($x)))
    };
}

/// Create a switch default layer action. `df!(n)` also jumps to `n`, making it the only active
/// layer. Use `df!(n, false)` to keep the active layers.
#[macro_export]
macro_rules! df {
    ($x: literal) => {
        $crate::df!($x, true)
    };
    ($x: literal, $jump: expr) => {
        $crate::action::KeyAction::Single($crate::action::Action::Layer(
            $crate::action::LayerAction::DefaultLayer { layer: $x, jump: $jump },
        ))
    };
}

/// Create a replace top layer action
#[macro_export]
macro_rules! rl {
    ($x: literal) => {
        $crate::action::KeyAction::Single($crate::action::Action::Layer($crate::action::LayerAction::Replace($x)))
    };
}

/// Create a tap-hold action, e.g. `ht!(Escape, LCtrl)` or `ht!(Escape, LCtrl, 150)`
#[macro_export]
macro_rules! ht {
    ($t: ident, $h: ident) => {
        $crate::ht!($t, $h, $crate::key::DEFAULT_TAPPING_TERM_MS)
    };
    ($t: ident, $h: ident, $ms: expr) => {
        $crate::action::KeyAction::HoldTap($crate::key::hold_tap::HoldTap::new(
            $crate::action::Action::Key($crate::keycode::KeyCode::$t),
            $crate::action::Action::Key($crate::keycode::KeyCode::$h),
            $crate::Duration::from_millis($ms),
        ))
    };
}

/// Create a layer activate action or tap key(tap/hold)
#[macro_export]
macro_rules! lt {
    ($x: literal, $k: ident) => {
        $crate::lt!($x, $k, $crate::key::DEFAULT_TAPPING_TERM_MS)
    };
    ($x: literal, $k: ident, $ms: expr) => {
        $crate::action::KeyAction::LayerTap($crate::key::hold_tap::LayerTap::new(
            $x,
            $crate::action::Action::Key($crate::keycode::KeyCode::$k),
            $crate::Duration::from_millis($ms),
        ))
    };
}

/// Create a layer activate or tap toggle action
#[macro_export]
macro_rules! tt {
    ($x: literal) => {
        $crate::tt!($x, $crate::key::DEFAULT_TAPPING_TERM_MS)
    };
    ($x: literal, $ms: expr) => {
        $crate::action::KeyAction::TapToggle($crate::key::tap_toggle::TapToggle::new(
            $x,
            $crate::Duration::from_millis($ms),
        ))
    };
}

/// Create a tap dance key, the nth action is tapped after n taps, e.g. `td!([A, B], 150)`
#[macro_export]
macro_rules! td {
    ([$($k: ident), +]) => {
        $crate::td!([$($k), +], $crate::key::DEFAULT_TAPPING_TERM_MS)
    };
    ([$($k: ident), +], $ms: expr) => {
        $crate::action::KeyAction::TapDance($crate::key::tap_dance::TapDance::new(
            $crate::action::action_list(&[$($crate::action::Action::Key($crate::keycode::KeyCode::$k)), +]),
            $crate::Duration::from_millis($ms),
        ))
    };
}

/// Create a sticky key, e.g. `sk!(LShift)` or `sk!(LShift, true, false)` for deferred release
/// without retap cancel
#[macro_export]
macro_rules! sk {
    ($k: ident) => {
        $crate::sk!($k, false, true)
    };
    ($k: ident, $defer: expr, $retap: expr) => {
        $crate::action::KeyAction::Sticky($crate::key::sticky::Sticky::new(
            $crate::action::Action::Key($crate::keycode::KeyCode::$k),
            $defer,
            $retap,
        ))
    };
}

/// Create a key which taps a sequence of keys, e.g. `seq!(H, I)`
#[macro_export]
macro_rules! seq {
    ($($k: ident), +) => {
        $crate::action::KeyAction::Sequence($crate::action::action_list(&[
            $($crate::action::Action::Key($crate::keycode::KeyCode::$k)), +
        ]))
    };
}
