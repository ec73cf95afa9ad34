//! Per-frame drawing: background image first, then the axis readouts on top.

use eframe::egui::{self, Color32, Painter, Pos2, Rect, TextureHandle, Vec2};
use tracing::warn;

use super::overlay::{OverlayError, RenderOptions, TextOverlay, TextRasterizer, TextureSink};
use crate::config::LayoutConfig;
use crate::mapping::AxisSlot;

/// A label overlay and the value overlay drawn below it, one pair per axis.
#[derive(Debug)]
pub struct AxisReadouts<H = TextureHandle> {
    labels: [TextOverlay<H>; 4],
    values: [TextOverlay<H>; 4],
}

impl<H> Default for AxisReadouts<H> {
    fn default() -> Self {
        Self {
            labels: std::array::from_fn(|_| TextOverlay::new()),
            values: std::array::from_fn(|_| TextOverlay::new()),
        }
    }
}

impl<H> AxisReadouts<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders the four fixed captions. A caption that fails stays empty.
    pub fn render_labels<R, S>(&mut self, color: Color32, font: &R, textures: &S)
    where
        R: TextRasterizer + ?Sized,
        S: TextureSink<Handle = H> + ?Sized,
    {
        for slot in AxisSlot::ALL {
            if let Err(e) =
                self.labels[slot.index()].render_text(slot.label(), color, font, textures)
            {
                warn!("Could not render label '{}': {}", slot.label(), e);
            }
        }
    }

    /// Shows `value` as decimal text below the slot's label.
    pub fn show_value<R, S>(
        &mut self,
        slot: AxisSlot,
        value: i16,
        color: Color32,
        font: &R,
        textures: &S,
    ) -> Result<(), OverlayError>
    where
        R: TextRasterizer + ?Sized,
        S: TextureSink<Handle = H> + ?Sized,
    {
        self.values[slot.index()].render_text(&value.to_string(), color, font, textures)
    }

    pub fn label(&self, slot: AxisSlot) -> &TextOverlay<H> {
        &self.labels[slot.index()]
    }

    pub fn value(&self, slot: AxisSlot) -> &TextOverlay<H> {
        &self.values[slot.index()]
    }
}

/// Screen positions of one label/value pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub label: Pos2,
    pub value: Pos2,
}

#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    layout: LayoutConfig,
    background: Color32,
}

impl Presenter {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            background: Color32::WHITE,
        }
    }

    /// Left readouts hug the left edge; right readouts are right-aligned by
    /// their label's width. Values sit one margin below their label.
    pub fn place(&self, screen_width: f32, slot: AxisSlot, label_size: Vec2) -> Placement {
        let x = match slot {
            AxisSlot::LeftX | AxisSlot::LeftY => self.layout.inset,
            AxisSlot::RightX | AxisSlot::RightY => {
                screen_width - (label_size.x + self.layout.inset)
            }
        };
        let y = match slot {
            AxisSlot::LeftX | AxisSlot::RightX => self.layout.top_row,
            AxisSlot::LeftY | AxisSlot::RightY => self.layout.bottom_row,
        };
        Placement {
            label: Pos2::new(x, y),
            value: Pos2::new(x, y + label_size.y + self.layout.margin),
        }
    }

    pub fn paint(
        &self,
        painter: &Painter,
        screen: Rect,
        current: &TextureHandle,
        readouts: &AxisReadouts<TextureHandle>,
    ) {
        painter.rect_filled(screen, 0.0, self.background);
        painter.image(
            current.id(),
            screen,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        let options = RenderOptions::default();
        for slot in AxisSlot::ALL {
            let label = readouts.label(slot);
            let placement = self.place(screen.width(), slot, label.size());
            label.render(painter, screen.min + placement.label.to_vec2(), &options);
            readouts
                .value(slot)
                .render(painter, screen.min + placement.value.to_vec2(), &options);
        }
    }
}

/// Draws the whole frame in the central area of `ctx`.
pub fn show(
    ctx: &egui::Context,
    presenter: &Presenter,
    current: &TextureHandle,
    readouts: &AxisReadouts<TextureHandle>,
) {
    egui::CentralPanel::default()
        .frame(egui::Frame::new())
        .show(ctx, |ui| {
            let screen = ui.max_rect();
            presenter.paint(ui.painter(), screen, current, readouts);
        });
}
