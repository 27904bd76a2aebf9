//! Geometry and material descriptions for scene meshes.

use crate::TextureId;
use bytemuck::{Pod, Zeroable};

/// Flat rectangle in the local XY plane, centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    /// Generate vertices for the quad, ready for GPU upload.
    /// Format: [bottom-left, bottom-right, top-right, top-left]
    ///
    /// UV `v` runs top to bottom so row 0 of a bitmap lands on the top edge.
    pub fn vertices(&self) -> [PlaneVertex; 4] {
        let hw = self.half_width();
        let hh = self.half_height();
        [
            PlaneVertex {
                position: [-hw, -hh, 0.0],
                uv: [0.0, 1.0],
            },
            PlaneVertex {
                position: [hw, -hh, 0.0],
                uv: [1.0, 1.0],
            },
            PlaneVertex {
                position: [hw, hh, 0.0],
                uv: [1.0, 0.0],
            },
            PlaneVertex {
                position: [-hw, hh, 0.0],
                uv: [0.0, 0.0],
            },
        ]
    }

    /// Two counter-clockwise triangles over [`PlaneGeometry::vertices`].
    pub const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
}

/// Vertex data for plane rendering
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    /// Vertex position in local space
    pub position: [f32; 3],
    /// UV coordinates (0-1)
    pub uv: [f32; 2],
}

/// Surface material of a plane or sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDesc {
    /// Texture sampled by the material.
    pub texture: Option<TextureId>,
    /// Base color multiplied with the texture.
    pub color: [f32; 4],
    /// Honor texture alpha (CSS opacity, rgba backgrounds).
    pub transparent: bool,
    /// Participate in depth testing; off keeps the mesh on top.
    pub depth_test: bool,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            texture: None,
            color: [1.0, 1.0, 1.0, 1.0],
            transparent: false,
            depth_test: true,
        }
    }
}

/// Textured plane mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneDesc {
    pub geometry: PlaneGeometry,
    pub material: MaterialDesc,
}

/// Camera-facing quad; its world size is its node scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDesc {
    pub material: MaterialDesc,
    /// Local position relative to the parent.
    pub position: glam::Vec3,
    /// Width/height in world units.
    pub scale: (f32, f32),
}

/// Small sphere used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerDesc {
    pub radius: f32,
    pub color: [f32; 4],
    /// Local position relative to the parent.
    pub position: glam::Vec3,
}
