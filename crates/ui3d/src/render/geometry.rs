use glam::{Vec2, Vec3};
use webplane_core::{PixelSize, WORLD_UNITS_PER_PIXEL};
use webplane_scene::{NodeId, TextureId};

/// World-space size of a panel plane derived from its content pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    pub pixels: PixelSize,
    pub width: f32,
    pub height: f32,
}

impl PanelGeometry {
    pub fn from_pixels(pixels: PixelSize) -> Self {
        Self {
            pixels,
            width: pixels.width as f32 * WORLD_UNITS_PER_PIXEL,
            height: pixels.height as f32 * WORLD_UNITS_PER_PIXEL,
        }
    }

    /// Plane-local point to content pixels (origin top-left, y down).
    pub fn local_to_pixel(&self, local: Vec3) -> Vec2 {
        Vec2::new(
            (local.x + self.width * 0.5) / WORLD_UNITS_PER_PIXEL,
            -(local.y - self.height * 0.5) / WORLD_UNITS_PER_PIXEL,
        )
    }

    /// Content pixels to a plane-local point on the z = 0 plane.
    pub fn pixel_to_local(&self, pixel: Vec2) -> Vec3 {
        Vec3::new(
            pixel.x * WORLD_UNITS_PER_PIXEL - self.width * 0.5,
            self.height * 0.5 - pixel.y * WORLD_UNITS_PER_PIXEL,
            0.0,
        )
    }
}

/// Scene resources backing a rendered panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelMesh {
    pub node: NodeId,
    pub texture: TextureId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_scales_with_pixels() {
        let geometry = PanelGeometry::from_pixels(PixelSize::new(400, 200));
        assert!((geometry.width - 1.0).abs() < 1e-6);
        assert!((geometry.height - 0.5).abs() < 1e-6);
    }

    #[test]
    fn corners_map_to_pixel_extremes() {
        let geometry = PanelGeometry::from_pixels(PixelSize::new(400, 200));
        let top_left = geometry.local_to_pixel(Vec3::new(-0.5, 0.25, 0.0));
        assert!(top_left.length() < 1e-3);
        let bottom_right = geometry.local_to_pixel(Vec3::new(0.5, -0.25, 0.0));
        assert!((bottom_right - Vec2::new(400.0, 200.0)).length() < 1e-3);
        let center = geometry.local_to_pixel(Vec3::ZERO);
        assert!((center - Vec2::new(200.0, 100.0)).length() < 1e-3);
    }
}
