//! Controller subsystem for gamepad input handling
//!
//! [`event_collector`] drains gilrs and the window input and turns both into
//! [`InputEvent`]s, the vocabulary understood by the mapping layer.
//!
//! ```text
//! gilrs ───────┐
//!              ├──► Collector ──► InputEvent ──► InputMapper
//! window keys ─┘
//! ```

pub mod event_collector;

use eframe::egui::Key;

/// Index of the only controller whose events are mapped.
pub const CONTROLLER_INDEX: usize = 0;

/// Analog channels of a standard gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    TriggerLeft,
    TriggerRight,
}

/// Digital buttons of a standard gamepad.
///
/// `Other` covers everything gilrs reports that has no standard name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadButton {
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Other,
}

/// One discrete input event, already tagged with the controller index it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Window close request
    Quit,
    KeyDown(Key),
    AxisMotion {
        which: usize,
        axis: PadAxis,
        value: i16,
    },
    ButtonDown {
        which: usize,
        button: PadButton,
    },
    ButtonUp {
        which: usize,
        button: PadButton,
    },
}
