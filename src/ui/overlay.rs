//! Text overlays: images generated at runtime from a string.
//!
//! Text is rasterized on the CPU into a [`ColorImage`] by a [`TextRasterizer`]
//! and handed to a [`TextureSink`], which turns it into whatever handle the
//! renderer keeps alive. Dropping the handle releases the texture, so an
//! overlay never holds more than one.

use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use eframe::egui::{self, Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions, Vec2};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Unable to open font {path}: {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("Text '{0}' has zero width")]
    ZeroWidth(String),

    #[error("Texture of {width}x{height} exceeds the maximum side of {max}")]
    TextureTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },
}

/// Renders a line of text into an image.
pub trait TextRasterizer {
    fn rasterize(&self, text: &str, color: Color32) -> Result<ColorImage, OverlayError>;
}

/// Turns a rasterized image into a live texture handle.
pub trait TextureSink {
    type Handle;

    fn upload(&self, name: &str, image: ColorImage) -> Result<Self::Handle, OverlayError>;
}

impl TextureSink for egui::Context {
    type Handle = TextureHandle;

    fn upload(&self, name: &str, image: ColorImage) -> Result<TextureHandle, OverlayError> {
        let max = self.input(|i| i.max_texture_side);
        let [width, height] = image.size;
        if width > max || height > max {
            return Err(OverlayError::TextureTooLarge { width, height, max });
        }
        // Text is unfiltered so the solid glyph edges stay sharp
        Ok(self.load_texture(name, image, TextureOptions::NEAREST))
    }
}

/// A TrueType font at a fixed pixel size.
#[derive(Clone, Debug)]
pub struct OverlayFont {
    font: FontArc,
    scale: PxScale,
}

impl OverlayFont {
    pub fn open(path: &Path, size: f32) -> Result<Self, OverlayError> {
        let data = fs::read(path).map_err(|e| OverlayError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = Self::from_bytes(data, size).map_err(|e| match e {
            OverlayError::Font { reason, .. } => OverlayError::Font {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        info!("Opened font {} at size {}", path.display(), size);
        Ok(font)
    }

    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self, OverlayError> {
        let font = FontArc::try_from_vec(data).map_err(|e| OverlayError::Font {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            font,
            scale: PxScale::from(size),
        })
    }

    fn layout(&self, text: &str) -> (Vec<Glyph>, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }
            glyphs.push(id.with_scale_and_position(self.scale, point(caret, scaled.ascent())));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        (glyphs, caret)
    }
}

impl TextRasterizer for OverlayFont {
    /// Solid rendering: a pixel is either the text color or transparent.
    fn rasterize(&self, text: &str, color: Color32) -> Result<ColorImage, OverlayError> {
        let (glyphs, advance) = self.layout(text);
        let width = advance.ceil() as usize;
        let height = self.font.as_scaled(self.scale).height().ceil() as usize;
        if width == 0 || height == 0 {
            return Err(OverlayError::ZeroWidth(text.to_string()));
        }

        let mut image = ColorImage::new([width, height], Color32::TRANSPARENT);
        for glyph in glyphs {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, coverage| {
                if coverage < 0.5 {
                    return;
                }
                let px = bounds.min.x as i64 + x as i64;
                let py = bounds.min.y as i64 + y as i64;
                if px >= 0 && py >= 0 && (px as usize) < width && (py as usize) < height {
                    image.pixels[py as usize * width + px as usize] = color;
                }
            });
        }
        Ok(image)
    }
}

/// Mirroring applied when an overlay is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

/// How an overlay is placed on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderOptions {
    /// Part of the overlay to draw, in overlay pixels. The drawn quad takes the clip's size.
    pub clip: Option<Rect>,
    /// Clockwise rotation in degrees.
    pub angle: f32,
    /// Rotation center relative to the quad's top-left corner; the quad center when unset.
    pub center: Option<Vec2>,
    pub flip: Flip,
}

/// Screen corners and matching texture coordinates of a drawn overlay,
/// clockwise from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayQuad {
    pub corners: [Pos2; 4],
    pub uvs: [Pos2; 4],
}

/// A renderable image generated from text.
///
/// `H` is the texture handle type; the overlay owns at most one.
#[derive(Debug)]
pub struct TextOverlay<H = TextureHandle> {
    image: Option<H>,
    text: String,
    width: usize,
    height: usize,
    tint: Color32,
}

impl<H> Default for TextOverlay<H> {
    fn default() -> Self {
        Self {
            image: None,
            text: String::new(),
            width: 0,
            height: 0,
            tint: Color32::WHITE,
        }
    }
}

impl<H> TextOverlay<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the overlay's image with `text` rendered in `color`.
    ///
    /// The previous image is released first; on error the overlay stays empty.
    pub fn render_text<R, S>(
        &mut self,
        text: &str,
        color: Color32,
        font: &R,
        textures: &S,
    ) -> Result<(), OverlayError>
    where
        R: TextRasterizer + ?Sized,
        S: TextureSink<Handle = H> + ?Sized,
    {
        self.free();

        let image = font.rasterize(text, color)?;
        let [width, height] = image.size;
        let handle = textures.upload(&format!("overlay:{text}"), image)?;

        self.image = Some(handle);
        self.text = text.to_string();
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Releases the image, leaving the overlay empty.
    pub fn free(&mut self) {
        self.image = None;
        self.text.clear();
        self.width = 0;
        self.height = 0;
    }

    pub fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.tint = Color32::from_rgba_unmultiplied(r, g, b, self.tint.a());
    }

    pub fn set_alpha(&mut self, a: u8) {
        let [r, g, b, _] = self.tint.to_srgba_unmultiplied();
        self.tint = Color32::from_rgba_unmultiplied(r, g, b, a);
    }

    pub fn tint(&self) -> Color32 {
        self.tint
    }

    pub fn image(&self) -> Option<&H> {
        self.image.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Geometry for drawing at `pos`, or `None` while the overlay is empty.
    pub fn quad(&self, pos: Pos2, options: &RenderOptions) -> Option<OverlayQuad> {
        if self.is_empty() {
            return None;
        }
        let full = Rect::from_min_size(Pos2::ZERO, self.size());
        let source = options.clip.unwrap_or(full);
        Some(overlay_quad(pos, source, self.size(), options))
    }
}

impl TextOverlay<TextureHandle> {
    pub fn render(&self, painter: &egui::Painter, pos: Pos2, options: &RenderOptions) {
        let (Some(texture), Some(quad)) = (self.image.as_ref(), self.quad(pos, options)) else {
            return;
        };
        let mut mesh = egui::epaint::Mesh::with_texture(texture.id());
        for (pos, uv) in quad.corners.into_iter().zip(quad.uvs) {
            mesh.vertices.push(egui::epaint::Vertex {
                pos,
                uv,
                color: self.tint,
            });
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        painter.add(egui::Shape::mesh(mesh));
    }
}

fn overlay_quad(pos: Pos2, source: Rect, texture_size: Vec2, options: &RenderOptions) -> OverlayQuad {
    let size = source.size();
    let center = options.center.unwrap_or(size * 0.5);
    let (sin, cos) = options.angle.to_radians().sin_cos();
    let rotate = |v: Vec2| Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos);

    let local = [
        Vec2::ZERO,
        Vec2::new(size.x, 0.0),
        size,
        Vec2::new(0.0, size.y),
    ];
    let corners = local.map(|corner| pos + center + rotate(corner - center));

    let mut u = [source.min.x / texture_size.x, source.max.x / texture_size.x];
    let mut v = [source.min.y / texture_size.y, source.max.y / texture_size.y];
    if matches!(options.flip, Flip::Horizontal | Flip::Both) {
        u.swap(0, 1);
    }
    if matches!(options.flip, Flip::Vertical | Flip::Both) {
        v.swap(0, 1);
    }
    let uvs = [
        Pos2::new(u[0], v[0]),
        Pos2::new(u[1], v[0]),
        Pos2::new(u[1], v[1]),
        Pos2::new(u[0], v[1]),
    ];

    OverlayQuad { corners, uvs }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Eight pixels per character, sixteen high.
    pub(crate) struct BlockFont;

    impl TextRasterizer for BlockFont {
        fn rasterize(&self, text: &str, color: Color32) -> Result<ColorImage, OverlayError> {
            if text.is_empty() {
                return Err(OverlayError::ZeroWidth(String::new()));
            }
            Ok(ColorImage::new([text.chars().count() * 8, 16], color))
        }
    }

    /// Counts handles that have been handed out and not yet dropped.
    #[derive(Default)]
    pub(crate) struct CountingSink {
        pub(crate) live: Rc<Cell<usize>>,
        pub(crate) max_side: Option<usize>,
    }

    #[derive(Debug)]
    pub(crate) struct TrackedHandle {
        live: Rc<Cell<usize>>,
    }

    impl Drop for TrackedHandle {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    impl TextureSink for CountingSink {
        type Handle = TrackedHandle;

        fn upload(&self, _name: &str, image: ColorImage) -> Result<TrackedHandle, OverlayError> {
            if let Some(max) = self.max_side {
                let [width, height] = image.size;
                if width > max || height > max {
                    return Err(OverlayError::TextureTooLarge { width, height, max });
                }
            }
            self.live.set(self.live.get() + 1);
            Ok(TrackedHandle {
                live: self.live.clone(),
            })
        }
    }

    fn bundled_font() -> OverlayFont {
        let definitions = egui::FontDefinitions::default();
        let data = definitions
            .font_data
            .get("Ubuntu-Light")
            .expect("egui ships Ubuntu-Light");
        OverlayFont::from_bytes(data.font.to_vec(), 28.0).unwrap()
    }

    #[test]
    fn new_overlay_is_empty() {
        let overlay: TextOverlay<TrackedHandle> = TextOverlay::new();
        assert!(overlay.is_empty());
        assert_eq!(overlay.width(), 0);
        assert_eq!(overlay.height(), 0);
        assert_eq!(overlay.text(), "");
    }

    #[test]
    fn repeated_renders_keep_one_live_handle() {
        let sink = CountingSink::default();
        let mut overlay = TextOverlay::new();
        for value in [-32768i32, -1, 0, 1, 12345, 32767] {
            overlay
                .render_text(&value.to_string(), Color32::BLACK, &BlockFont, &sink)
                .unwrap();
            assert_eq!(sink.live.get(), 1);
        }
        assert_eq!(overlay.text(), "32767");
        assert_eq!(overlay.width(), 5 * 8);
        assert_eq!(overlay.height(), 16);
    }

    #[test]
    fn failed_render_leaves_overlay_empty() {
        let sink = CountingSink::default();
        let mut overlay = TextOverlay::new();
        overlay.render_text("Left X", Color32::BLACK, &BlockFont, &sink).unwrap();
        assert_eq!(sink.live.get(), 1);

        let err = overlay.render_text("", Color32::BLACK, &BlockFont, &sink);
        assert!(matches!(err, Err(OverlayError::ZeroWidth(_))));
        assert!(overlay.is_empty());
        assert_eq!(overlay.width(), 0);
        assert_eq!(overlay.height(), 0);
        assert_eq!(sink.live.get(), 0);
    }

    #[test]
    fn failed_upload_leaves_overlay_empty() {
        let sink = CountingSink {
            max_side: Some(20),
            ..Default::default()
        };
        let mut overlay = TextOverlay::new();
        overlay.render_text("ok", Color32::BLACK, &BlockFont, &sink).unwrap();

        let err = overlay.render_text("far too long", Color32::BLACK, &BlockFont, &sink);
        assert!(matches!(err, Err(OverlayError::TextureTooLarge { .. })));
        assert!(overlay.is_empty());
        assert_eq!(sink.live.get(), 0);
    }

    #[test]
    fn dropping_overlay_releases_handle() {
        let sink = CountingSink::default();
        {
            let mut overlay = TextOverlay::new();
            overlay.render_text("Right Y", Color32::BLACK, &BlockFont, &sink).unwrap();
            assert_eq!(sink.live.get(), 1);
        }
        assert_eq!(sink.live.get(), 0);
    }

    #[test]
    fn tint_combines_color_and_alpha() {
        let mut overlay: TextOverlay<TrackedHandle> = TextOverlay::new();
        overlay.set_color(255, 0, 0);
        assert_eq!(overlay.tint(), Color32::from_rgb(255, 0, 0));
        overlay.set_alpha(128);
        assert_eq!(overlay.tint().a(), 128);
    }

    #[test]
    fn solid_rasterization_uses_only_text_color() {
        let font = bundled_font();
        let color = Color32::from_rgb(10, 20, 30);
        let image = font.rasterize("12345", color).unwrap();
        let [width, height] = image.size;
        assert!(width > 0 && height > 0);
        assert!(image.pixels.iter().any(|p| *p == color));
        assert!(image
            .pixels
            .iter()
            .all(|p| *p == color || *p == Color32::TRANSPARENT));
    }

    #[test]
    fn wider_text_gives_wider_image() {
        let font = bundled_font();
        let short = font.rasterize("1", Color32::BLACK).unwrap();
        let long = font.rasterize("-32768", Color32::BLACK).unwrap();
        assert!(long.size[0] > short.size[0]);
        assert_eq!(long.size[1], short.size[1]);
    }

    #[test]
    fn empty_text_cannot_be_rasterized() {
        let font = bundled_font();
        assert!(matches!(
            font.rasterize("", Color32::BLACK),
            Err(OverlayError::ZeroWidth(_))
        ));
    }

    #[test]
    fn invalid_font_data_is_rejected() {
        assert!(matches!(
            OverlayFont::from_bytes(vec![0, 1, 2, 3], 28.0),
            Err(OverlayError::Font { .. })
        ));
    }

    #[test]
    fn empty_overlay_has_no_quad() {
        let overlay: TextOverlay<TrackedHandle> = TextOverlay::new();
        assert!(overlay.quad(Pos2::ZERO, &RenderOptions::default()).is_none());
    }

    #[test]
    fn plain_quad_covers_whole_texture() {
        let sink = CountingSink::default();
        let mut overlay = TextOverlay::new();
        overlay.render_text("abcd", Color32::BLACK, &BlockFont, &sink).unwrap();

        let quad = overlay
            .quad(Pos2::new(50.0, 100.0), &RenderOptions::default())
            .unwrap();
        assert_eq!(quad.corners[0], Pos2::new(50.0, 100.0));
        assert_eq!(quad.corners[2], Pos2::new(82.0, 116.0));
        assert_eq!(quad.uvs[0], Pos2::new(0.0, 0.0));
        assert_eq!(quad.uvs[2], Pos2::new(1.0, 1.0));
    }

    #[test]
    fn clip_sets_quad_size_and_uvs() {
        let sink = CountingSink::default();
        let mut overlay = TextOverlay::new();
        overlay.render_text("abcd", Color32::BLACK, &BlockFont, &sink).unwrap();

        let options = RenderOptions {
            clip: Some(Rect::from_min_size(Pos2::new(8.0, 0.0), Vec2::new(16.0, 8.0))),
            ..Default::default()
        };
        let quad = overlay.quad(Pos2::ZERO, &options).unwrap();
        assert_eq!(quad.corners[2], Pos2::new(16.0, 8.0));
        assert_eq!(quad.uvs[0], Pos2::new(0.25, 0.0));
        assert_eq!(quad.uvs[2], Pos2::new(0.75, 0.5));
    }

    #[test]
    fn horizontal_flip_swaps_u() {
        let sink = CountingSink::default();
        let mut overlay = TextOverlay::new();
        overlay.render_text("ab", Color32::BLACK, &BlockFont, &sink).unwrap();

        let options = RenderOptions {
            flip: Flip::Horizontal,
            ..Default::default()
        };
        let quad = overlay.quad(Pos2::ZERO, &options).unwrap();
        assert_eq!(quad.uvs[0], Pos2::new(1.0, 0.0));
        assert_eq!(quad.uvs[1], Pos2::new(0.0, 0.0));
    }

    #[test]
    fn half_turn_rotates_around_center() {
        let sink = CountingSink::default();
        let mut overlay = TextOverlay::new();
        overlay.render_text("ab", Color32::BLACK, &BlockFont, &sink).unwrap();

        let options = RenderOptions {
            angle: 180.0,
            ..Default::default()
        };
        let quad = overlay.quad(Pos2::ZERO, &options).unwrap();
        // the top-left corner lands where the bottom-right was
        assert!((quad.corners[0].x - 16.0).abs() < 1e-4);
        assert!((quad.corners[0].y - 16.0).abs() < 1e-4);
    }
}
