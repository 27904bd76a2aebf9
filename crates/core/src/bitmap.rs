//! Rasterizer output consumed as a texture.

use crate::PixelSize;
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// RGBA image produced by a rasterizer for one render job.
///
/// Pixels are shared, so handing the same bitmap to the scene graph and
/// keeping it as the panel's current frame does not copy.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: Arc<RgbaImage>,
}

impl Bitmap {
    /// Wrap an already-decoded RGBA image.
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// A bitmap of `size` filled with one color.
    pub fn solid(size: PixelSize, rgba: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(size.width, size.height, Rgba(rgba)))
    }

    /// Bitmap dimensions.
    pub fn size(&self) -> PixelSize {
        let (width, height) = self.image.dimensions();
        PixelSize::new(width, height)
    }

    /// Borrow the underlying image.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes (width × height × 4).
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// True when both bitmaps share the same pixel storage.
    pub fn ptr_eq(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}
