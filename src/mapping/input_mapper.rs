use eframe::egui::Key;
use tracing::{debug, info};

use super::AxisSlot;
use crate::controller::{InputEvent, PadAxis, PadButton, CONTROLLER_INDEX};
use crate::ui::media::{ButtonImage, MediaError};

/// Buttons with a dedicated image. Every other button shows [`ButtonImage::Idle`].
pub const BUTTON_IMAGES: [(PadButton, ButtonImage); 11] = [
    (PadButton::X, ButtonImage::X),
    (PadButton::A, ButtonImage::A),
    (PadButton::B, ButtonImage::B),
    (PadButton::Y, ButtonImage::Y),
    (PadButton::LeftShoulder, ButtonImage::LeftShoulder),
    (PadButton::RightShoulder, ButtonImage::RightShoulder),
    (PadButton::Back, ButtonImage::Back),
    (PadButton::Start, ButtonImage::Start),
    (PadButton::LeftStick, ButtonImage::LeftStick),
    (PadButton::RightStick, ButtonImage::RightStick),
    (PadButton::Guide, ButtonImage::Guide),
];

/// Checks that every image the mapper can select exists among `available` loaded images.
pub fn validate_button_table(available: usize) -> Result<(), MediaError> {
    let selectable = BUTTON_IMAGES
        .iter()
        .map(|(_, image)| *image)
        .chain([
            ButtonImage::Idle,
            ButtonImage::LeftTrigger,
            ButtonImage::RightTrigger,
        ]);
    for image in selectable {
        if image.index() >= available {
            return Err(MediaError::UnknownImage {
                index: image.index(),
                available,
            });
        }
    }
    Ok(())
}

fn image_for(button: PadButton) -> ButtonImage {
    BUTTON_IMAGES
        .iter()
        .find(|(mapped, _)| *mapped == button)
        .map(|(_, image)| *image)
        .unwrap_or(ButtonImage::Idle)
}

/// Last raw reading of each directional axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisReadings {
    pub left_x: i16,
    pub left_y: i16,
    pub right_x: i16,
    pub right_y: i16,
}

impl AxisReadings {
    pub fn get(&self, slot: AxisSlot) -> i16 {
        match slot {
            AxisSlot::LeftX => self.left_x,
            AxisSlot::LeftY => self.left_y,
            AxisSlot::RightX => self.right_x,
            AxisSlot::RightY => self.right_y,
        }
    }

    fn set(&mut self, slot: AxisSlot, value: i16) {
        match slot {
            AxisSlot::LeftX => self.left_x = value,
            AxisSlot::LeftY => self.left_y = value,
            AxisSlot::RightX => self.right_x = value,
            AxisSlot::RightY => self.right_y = value,
        }
    }
}

/// What a single event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Ignored,
    /// The current image is now this one.
    Selected(ButtonImage),
    /// A directional axis moved; its readout has to show `value`.
    AxisUpdated { slot: AxisSlot, value: i16 },
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    selection: ButtonImage,
    axes: AxisReadings,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> ButtonImage {
        self.selection
    }

    pub fn axes(&self) -> AxisReadings {
        self.axes
    }

    pub fn handle(&mut self, event: &InputEvent) -> Reaction {
        match *event {
            InputEvent::Quit => {
                info!("Quit requested");
                Reaction::Quit
            }
            InputEvent::KeyDown(Key::Escape) => {
                info!("Escape pressed, quitting");
                Reaction::Quit
            }
            InputEvent::KeyDown(_) => Reaction::Ignored,
            InputEvent::AxisMotion { which, axis, value } if which == CONTROLLER_INDEX => {
                self.axis_motion(axis, value)
            }
            InputEvent::ButtonDown { which, button } if which == CONTROLLER_INDEX => {
                self.select(image_for(button))
            }
            // Any release, from any controller, falls back to the idle image
            InputEvent::ButtonUp { .. } => self.select(ButtonImage::Idle),
            InputEvent::AxisMotion { which, .. } | InputEvent::ButtonDown { which, .. } => {
                debug!("Ignoring event from controller {}", which);
                Reaction::Ignored
            }
        }
    }

    fn axis_motion(&mut self, axis: PadAxis, value: i16) -> Reaction {
        let slot = match axis {
            PadAxis::LeftX => AxisSlot::LeftX,
            PadAxis::LeftY => AxisSlot::LeftY,
            PadAxis::RightX => AxisSlot::RightX,
            PadAxis::RightY => AxisSlot::RightY,
            // Triggers only select an image; they never report a release
            PadAxis::TriggerLeft => return self.select(ButtonImage::LeftTrigger),
            PadAxis::TriggerRight => return self.select(ButtonImage::RightTrigger),
        };
        self.axes.set(slot, value);
        Reaction::AxisUpdated { slot, value }
    }

    fn select(&mut self, image: ButtonImage) -> Reaction {
        if image != self.selection {
            debug!("Selection {:?} -> {:?}", self.selection, image);
        }
        self.selection = image;
        Reaction::Selected(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(button: PadButton) -> InputEvent {
        InputEvent::ButtonDown {
            which: CONTROLLER_INDEX,
            button,
        }
    }

    fn up(button: PadButton) -> InputEvent {
        InputEvent::ButtonUp {
            which: CONTROLLER_INDEX,
            button,
        }
    }

    fn axis(axis: PadAxis, value: i16) -> InputEvent {
        InputEvent::AxisMotion {
            which: CONTROLLER_INDEX,
            axis,
            value,
        }
    }

    #[test]
    fn starts_idle_and_centered() {
        let mapper = InputMapper::new();
        assert_eq!(mapper.selection(), ButtonImage::Idle);
        assert_eq!(mapper.axes(), AxisReadings::default());
    }

    #[test]
    fn every_mapped_button_selects_its_image() {
        let mut mapper = InputMapper::new();
        for (button, image) in BUTTON_IMAGES {
            assert_eq!(mapper.handle(&down(button)), Reaction::Selected(image));
            assert_eq!(mapper.selection(), image);
        }
    }

    #[test]
    fn unmapped_button_resets_to_idle() {
        let mut mapper = InputMapper::new();
        mapper.handle(&down(PadButton::A));
        assert_eq!(
            mapper.handle(&down(PadButton::DPadUp)),
            Reaction::Selected(ButtonImage::Idle)
        );
        mapper.handle(&down(PadButton::B));
        mapper.handle(&down(PadButton::Other));
        assert_eq!(mapper.selection(), ButtonImage::Idle);
    }

    #[test]
    fn release_always_resets_to_idle() {
        let mut mapper = InputMapper::new();
        mapper.handle(&down(PadButton::Start));
        // releasing a different button still resets
        mapper.handle(&up(PadButton::A));
        assert_eq!(mapper.selection(), ButtonImage::Idle);

        mapper.handle(&axis(PadAxis::TriggerRight, 20000));
        mapper.handle(&up(PadButton::DPadLeft));
        assert_eq!(mapper.selection(), ButtonImage::Idle);
    }

    #[test]
    fn press_then_release_ends_idle() {
        let mut mapper = InputMapper::new();
        mapper.handle(&down(PadButton::A));
        assert_eq!(mapper.selection(), ButtonImage::A);
        mapper.handle(&up(PadButton::A));
        assert_eq!(mapper.selection(), ButtonImage::Idle);
    }

    #[test]
    fn directional_axes_update_readings_only() {
        let mut mapper = InputMapper::new();
        mapper.handle(&down(PadButton::Y));

        assert_eq!(
            mapper.handle(&axis(PadAxis::LeftX, 12345)),
            Reaction::AxisUpdated {
                slot: AxisSlot::LeftX,
                value: 12345
            }
        );
        mapper.handle(&axis(PadAxis::LeftY, -32768));
        mapper.handle(&axis(PadAxis::RightX, 32767));
        mapper.handle(&axis(PadAxis::RightY, -1));

        assert_eq!(
            mapper.axes(),
            AxisReadings {
                left_x: 12345,
                left_y: -32768,
                right_x: 32767,
                right_y: -1,
            }
        );
        assert_eq!(mapper.selection(), ButtonImage::Y);
    }

    #[test]
    fn triggers_select_image_without_touching_readings() {
        let mut mapper = InputMapper::new();
        mapper.handle(&axis(PadAxis::LeftX, 500));

        assert_eq!(
            mapper.handle(&axis(PadAxis::TriggerLeft, 32767)),
            Reaction::Selected(ButtonImage::LeftTrigger)
        );
        assert_eq!(mapper.axes().left_x, 500);

        // a trigger returning to rest does not release it
        mapper.handle(&axis(PadAxis::TriggerLeft, 0));
        assert_eq!(mapper.selection(), ButtonImage::LeftTrigger);

        mapper.handle(&axis(PadAxis::TriggerRight, 1));
        assert_eq!(mapper.selection(), ButtonImage::RightTrigger);
        assert_eq!(
            mapper.axes(),
            AxisReadings {
                left_x: 500,
                ..Default::default()
            }
        );
    }

    #[test]
    fn other_controllers_are_ignored() {
        let mut mapper = InputMapper::new();
        mapper.handle(&down(PadButton::B));

        let foreign = [
            InputEvent::ButtonDown {
                which: 1,
                button: PadButton::X,
            },
            InputEvent::AxisMotion {
                which: 2,
                axis: PadAxis::LeftX,
                value: 99,
            },
            InputEvent::AxisMotion {
                which: 1,
                axis: PadAxis::TriggerLeft,
                value: 99,
            },
        ];
        for event in &foreign {
            assert_eq!(mapper.handle(event), Reaction::Ignored);
        }
        assert_eq!(mapper.selection(), ButtonImage::B);
        assert_eq!(mapper.axes(), AxisReadings::default());

        // releases are not filtered by controller
        let release = InputEvent::ButtonUp {
            which: 1,
            button: PadButton::B,
        };
        assert_eq!(
            mapper.handle(&release),
            Reaction::Selected(ButtonImage::Idle)
        );
    }

    #[test]
    fn release_on_second_controller_resets_first() {
        let mut mapper = InputMapper::new();
        mapper.handle(&down(PadButton::A));
        assert_eq!(mapper.selection(), ButtonImage::A);

        mapper.handle(&InputEvent::ButtonUp {
            which: 1,
            button: PadButton::B,
        });
        assert_eq!(mapper.selection(), ButtonImage::Idle);
    }

    #[test]
    fn quit_and_escape_end_the_loop() {
        let mut mapper = InputMapper::new();
        assert_eq!(mapper.handle(&InputEvent::Quit), Reaction::Quit);
        assert_eq!(
            mapper.handle(&InputEvent::KeyDown(Key::Escape)),
            Reaction::Quit
        );
        assert_eq!(
            mapper.handle(&InputEvent::KeyDown(Key::Space)),
            Reaction::Ignored
        );
    }

    #[test]
    fn button_table_fits_the_image_set() {
        assert!(validate_button_table(ButtonImage::COUNT).is_ok());
        assert!(matches!(
            validate_button_table(12),
            Err(MediaError::UnknownImage { index: 12, .. })
        ));
    }
}
