//! The fixed set of full-screen button-state images.

use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identifies one of the pre-loaded images. The discriminant is the image index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ButtonImage {
    /// No input
    #[default]
    Idle = 0,
    X = 1,
    A = 2,
    B = 3,
    Y = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftTrigger = 7,
    RightTrigger = 8,
    Back = 9,
    Start = 10,
    LeftStick = 11,
    RightStick = 12,
    Guide = 13,
}

impl ButtonImage {
    pub const COUNT: usize = 14;

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Expected {expected} button images, got {found}")]
    ImageCount { expected: usize, found: usize },

    #[error("Could not load image from file {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Button table refers to image {index} but only {available} are loaded")]
    UnknownImage { index: usize, available: usize },
}

/// One image per [`ButtonImage`], immutable after construction.
#[derive(Debug)]
pub struct MediaSet<T> {
    images: Vec<T>,
}

impl<T> MediaSet<T> {
    pub fn from_images(images: Vec<T>) -> Result<Self, MediaError> {
        if images.len() != ButtonImage::COUNT {
            return Err(MediaError::ImageCount {
                expected: ButtonImage::COUNT,
                found: images.len(),
            });
        }
        Ok(Self { images })
    }

    pub fn get(&self, image: ButtonImage) -> &T {
        &self.images[image.index()]
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl MediaSet<ColorImage> {
    /// Decodes every image file, failing on the first one that cannot be read.
    pub fn decode(paths: &[PathBuf]) -> Result<Self, MediaError> {
        if paths.len() != ButtonImage::COUNT {
            return Err(MediaError::ImageCount {
                expected: ButtonImage::COUNT,
                found: paths.len(),
            });
        }
        let images = paths
            .iter()
            .map(|path| load_color_image(path))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Loaded {} button images", images.len());
        Self::from_images(images)
    }

    /// Moves the decoded images to the GPU.
    pub fn upload(self, ctx: &egui::Context) -> MediaSet<TextureHandle> {
        let images = self
            .images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                ctx.load_texture(format!("button-{index}"), image, TextureOptions::LINEAR)
            })
            .collect();
        MediaSet { images }
    }
}

fn load_color_image(path: &Path) -> Result<ColorImage, MediaError> {
    let img = image::open(path)
        .map_err(|source| MediaError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    debug!(
        "Decoded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    let size = [img.width() as usize, img.height() as usize];
    let pixels = img.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}
