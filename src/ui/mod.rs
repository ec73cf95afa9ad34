//! # Controller test window
//!
//! One eframe application drives the whole program. Every frame it
//!
//! 1. drains window input and gamepad events into [`InputEvent`]s,
//! 2. feeds them to the [`InputMapper`], regenerating the readout of every axis
//!    that moved,
//! 3. paints the selected button image and the readouts through the
//!    [`Presenter`].
//!
//! All state the loop touches lives in [`ControllerTestUI`]; dropping it at the
//! end of `run_native` releases the textures and the gamepad context.

pub mod media;
pub mod overlay;
pub mod presenter;

use eframe::egui::{self, Color32, TextureHandle};
use std::time::Duration;
use tracing::{error, info};

use crate::controller::event_collector::{self, Collecting, EventCollector};
use crate::controller::InputEvent;
use crate::mapping::{InputMapper, Reaction};

use self::media::MediaSet;
use self::overlay::OverlayFont;
use self::presenter::{AxisReadouts, Presenter};

/// Everything the frame loop needs, created once before the window opens.
pub struct ControllerTestUI {
    collector: EventCollector<Collecting>,
    mapper: InputMapper,
    media: MediaSet<TextureHandle>,
    font: OverlayFont,
    text_color: Color32,
    readouts: AxisReadouts<TextureHandle>,
    presenter: Presenter,
    repaint_interval: Duration,
}

impl ControllerTestUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        collector: EventCollector<Collecting>,
        media: MediaSet<egui::ColorImage>,
        font: OverlayFont,
        text_color: Color32,
        presenter: Presenter,
        repaint_interval: Duration,
    ) -> Self {
        let ctx = &cc.egui_ctx;
        let media = media.upload(ctx);

        let mut readouts = AxisReadouts::new();
        readouts.render_labels(text_color, &font, ctx);
        info!("Window ready, {} button textures uploaded", media.len());

        Self {
            collector,
            mapper: InputMapper::new(),
            media,
            font,
            text_color,
            readouts,
            presenter,
            repaint_interval,
        }
    }

    /// Applies one event; returns `false` once the loop should end.
    fn apply(&mut self, ctx: &egui::Context, event: &InputEvent) -> bool {
        match self.mapper.handle(event) {
            Reaction::Quit => return false,
            Reaction::AxisUpdated { slot, value } => {
                if let Err(e) =
                    self.readouts
                        .show_value(slot, value, self.text_color, &self.font, ctx)
                {
                    error!("Could not render {} value {}: {}", slot.label(), value, e);
                }
            }
            Reaction::Selected(_) | Reaction::Ignored => {}
        }
        true
    }
}

impl eframe::App for ControllerTestUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut events = event_collector::window_events(ctx);
        events.extend(self.collector.poll());

        for event in &events {
            if !self.apply(ctx, event) {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                break;
            }
        }

        let current = self.media.get(self.mapper.selection());
        presenter::show(ctx, &self.presenter, current, &self.readouts);

        // gilrs does not wake the window, so keep polling
        ctx.request_repaint_after(self.repaint_interval);
    }
}
