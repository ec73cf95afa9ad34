//! Turns controller events into the displayed state.
//!
//! The [`InputMapper`] owns the current image selection and the last reading
//! of each directional axis. It reports what changed as a [`Reaction`] so the
//! UI layer can regenerate exactly the overlays that need it.

pub mod input_mapper;

pub use input_mapper::{validate_button_table, AxisReadings, InputMapper, Reaction};

/// The four directional axes that have an on-screen readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisSlot {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl AxisSlot {
    pub const ALL: [AxisSlot; 4] = [
        AxisSlot::LeftX,
        AxisSlot::LeftY,
        AxisSlot::RightX,
        AxisSlot::RightY,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Caption drawn above the axis value.
    pub fn label(self) -> &'static str {
        match self {
            AxisSlot::LeftX => "Left X",
            AxisSlot::LeftY => "Left Y",
            AxisSlot::RightX => "Right X",
            AxisSlot::RightY => "Right Y",
        }
    }
}
