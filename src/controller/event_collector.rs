use chrono::Local;
use eframe::egui;
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs, GilrsBuilder};
use statum::{machine, state};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::{InputEvent, PadAxis, PadButton};

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Unable to read controller mapping database {path}: {source}")]
    MappingDatabase {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to initialize gamepad context: {0}")]
    InitializationError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Controllers in the order they were first seen; the position is the controller index
    slots: Vec<GamepadId>,

    // Number of mappings found in the database
    mapping_count: usize,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn mapping_count(&self) -> usize {
        self.mapping_count
    }

    // Index of a controller, registering it if it has not been seen yet
    fn index_of(&mut self, id: GamepadId) -> usize {
        match self.slots.iter().position(|slot| *slot == id) {
            Some(index) => index,
            None => {
                self.slots.push(id);
                self.slots.len() - 1
            }
        }
    }
}

impl EventCollector<Initializing> {
    /// Builds the gilrs context with the mappings from `mapping_db`.
    pub fn create(mapping_db: &Path) -> Result<Self, CollectorError> {
        let mappings =
            fs::read_to_string(mapping_db).map_err(|source| CollectorError::MappingDatabase {
                path: mapping_db.to_path_buf(),
                source,
            })?;
        let mapping_count = count_mappings(&mappings);
        info!(
            "Read {} controller mappings from {}",
            mapping_count,
            mapping_db.display()
        );

        info!("Initializing gilrs controller interface");
        let gilrs = match GilrsBuilder::new().add_mappings(&mappings).build() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(gilrs::Error::NotImplemented(g)) => {
                warn!("Gamepad input is not supported on this platform, continuing without it");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, Vec::new(), mapping_count))
    }

    // Register connected controllers and transition to Collecting state
    pub fn initialize(mut self) -> EventCollector<Collecting> {
        let connected: Vec<(GamepadId, String, bool)> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, gamepad.name().to_string(), gamepad.is_ff_supported()))
            .collect();

        if connected.is_empty() {
            warn!("No controllers are connected, waiting for one to appear");
        } else {
            let haptic = connected.iter().filter(|(_, _, ff)| *ff).count();
            info!(
                "{} connected controllers, {} with force feedback",
                connected.len(),
                haptic
            );
            for (id, name, _) in &connected {
                let index = self.index_of(*id);
                info!("  [{}] ID: {}, Name: {}", index, id, name);
            }
        }

        self.transition()
    }
}

impl EventCollector<Collecting> {
    /// Drains every pending gilrs event.
    pub fn poll(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let which = self.index_of(id);
            if let Some(input) = self.convert_gilrs_event(which, event) {
                events.push(input);
            }
        }
        events
    }

    fn convert_gilrs_event(&self, which: usize, event: EventType) -> Option<InputEvent> {
        match event {
            EventType::AxisChanged(axis, value, _) => {
                let axis = map_axis(axis)?;
                let value = axis_value(axis, value);
                debug!("Controller {} axis {:?} = {}", which, axis, value);
                Some(InputEvent::AxisMotion { which, axis, value })
            }
            // Analog triggers arrive as button changes; treat them as the axes they are
            EventType::ButtonChanged(Button::LeftTrigger2, value, _) => {
                Some(InputEvent::AxisMotion {
                    which,
                    axis: PadAxis::TriggerLeft,
                    value: axis_value(PadAxis::TriggerLeft, value),
                })
            }
            EventType::ButtonChanged(Button::RightTrigger2, value, _) => {
                Some(InputEvent::AxisMotion {
                    which,
                    axis: PadAxis::TriggerRight,
                    value: axis_value(PadAxis::TriggerRight, value),
                })
            }
            EventType::ButtonPressed(button, _) => {
                let button = map_button(button)?;
                info!(
                    "Controller {} button pressed: {:?} at {}",
                    which,
                    button,
                    Local::now().format("%H:%M:%S.%3f")
                );
                Some(InputEvent::ButtonDown { which, button })
            }
            EventType::ButtonReleased(button, _) => {
                let button = map_button(button)?;
                info!(
                    "Controller {} button released: {:?} at {}",
                    which,
                    button,
                    Local::now().format("%H:%M:%S.%3f")
                );
                Some(InputEvent::ButtonUp { which, button })
            }
            EventType::Connected => {
                info!("Controller {} connected", which);
                None
            }
            EventType::Disconnected => {
                warn!("Controller {} disconnected", which);
                None
            }
            _ => {
                debug!("Unhandled event type: {:?}", event);
                None
            }
        }
    }
}

/// Quit and key events from the window, in arrival order.
pub fn window_events(ctx: &egui::Context) -> Vec<InputEvent> {
    ctx.input(|input| {
        let mut events = Vec::new();
        if input.viewport().close_requested() {
            events.push(InputEvent::Quit);
        }
        for event in &input.events {
            if let egui::Event::Key {
                key,
                pressed: true,
                repeat: false,
                ..
            } = event
            {
                events.push(InputEvent::KeyDown(*key));
            }
        }
        events
    })
}

// Lines of an SDL mapping database that carry a mapping
fn count_mappings(database: &str) -> usize {
    database
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count()
}

fn map_axis(axis: Axis) -> Option<PadAxis> {
    match axis {
        Axis::LeftStickX => Some(PadAxis::LeftX),
        Axis::LeftStickY => Some(PadAxis::LeftY),
        Axis::RightStickX => Some(PadAxis::RightX),
        Axis::RightStickY => Some(PadAxis::RightY),
        Axis::LeftZ => Some(PadAxis::TriggerLeft),
        Axis::RightZ => Some(PadAxis::TriggerRight),
        _ => None,
    }
}

// Digital trigger presses are dropped: triggers only report as axes
fn map_button(button: Button) -> Option<PadButton> {
    match button {
        Button::South => Some(PadButton::A),
        Button::East => Some(PadButton::B),
        Button::West => Some(PadButton::X),
        Button::North => Some(PadButton::Y),
        Button::Select => Some(PadButton::Back),
        Button::Mode => Some(PadButton::Guide),
        Button::Start => Some(PadButton::Start),
        Button::LeftThumb => Some(PadButton::LeftStick),
        Button::RightThumb => Some(PadButton::RightStick),
        Button::LeftTrigger => Some(PadButton::LeftShoulder),
        Button::RightTrigger => Some(PadButton::RightShoulder),
        Button::DPadUp => Some(PadButton::DPadUp),
        Button::DPadDown => Some(PadButton::DPadDown),
        Button::DPadLeft => Some(PadButton::DPadLeft),
        Button::DPadRight => Some(PadButton::DPadRight),
        Button::LeftTrigger2 | Button::RightTrigger2 => None,
        _ => Some(PadButton::Other),
    }
}

/// Scales a gilrs reading to the signed 16-bit range, down and right positive.
fn axis_value(axis: PadAxis, value: f32) -> i16 {
    let value = match axis {
        PadAxis::LeftY | PadAxis::RightY => -value,
        _ => value,
    };
    // float to int `as` saturates
    (value * i16::MAX as f32).round() as i16
}
