//! Scene-graph surface used by webplane panels.
//!
//! Panels never own a renderer. They talk to whatever scene graph the host
//! runs through [`SceneGraph`]: parent/child attachment, world-to-local
//! transforms, mesh and texture lifetimes, and camera raycasts. [`Scene`] is
//! an arena implementation that tracks GPU-style resource counts so resource
//! hygiene can be asserted in tests.

pub mod camera;
pub mod geometry;
mod memory;
pub mod raycast;
pub mod transform;

use glam::Vec3;
use webplane_core::Bitmap;

pub use camera::Camera;
pub use geometry::{MarkerDesc, MaterialDesc, PlaneDesc, PlaneGeometry, PlaneVertex, SpriteDesc};
pub use memory::{ResourceStats, Scene};
pub use raycast::{raycast_billboard_quad, raycast_plane_quad, Ray, RayHit};
pub use transform::Transform3D;

/// Handle to a node in a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Handle to a texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// One ray/object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Object that was hit.
    pub object: NodeId,
    /// Hit point in world space.
    pub point: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Operations a panel and the pointer dispatcher need from a scene graph.
pub trait SceneGraph {
    /// Root node; everything raycastable hangs below it.
    fn root(&self) -> NodeId;

    /// Create an empty transform node.
    fn create_group(&mut self) -> NodeId;

    /// Create a plane mesh (geometry + material).
    fn create_plane(&mut self, desc: PlaneDesc) -> NodeId;

    /// Create a camera-facing sprite.
    fn create_sprite(&mut self, desc: SpriteDesc) -> NodeId;

    /// Create a marker sphere. Markers are visual only and not pickable.
    fn create_marker(&mut self, desc: MarkerDesc) -> NodeId;

    /// Attach `child` below `parent`, detaching it from any previous parent.
    fn add_child(&mut self, parent: NodeId, child: NodeId);

    /// Detach `child` from `parent`; a no-op if it is not a child.
    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    /// Parent of `node`, if attached.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Set a node's local position.
    fn set_position(&mut self, node: NodeId, position: Vec3);

    /// Convert a world-space point into `node`'s local frame.
    fn world_to_local(&self, node: NodeId, point: Vec3) -> Vec3;

    /// Allocate an empty texture.
    fn create_texture(&mut self) -> TextureId;

    /// Replace a texture's image and flag it for upload; `None` blanks it.
    fn upload_texture(&mut self, texture: TextureId, bitmap: Option<&Bitmap>);

    /// Release a texture.
    fn dispose_texture(&mut self, texture: TextureId);

    /// Release a mesh's geometry and material and drop the node with its
    /// subtree. The node should already be detached from its parent.
    fn dispose_mesh(&mut self, mesh: NodeId);

    /// The active camera node.
    fn camera(&self) -> NodeId;

    /// Camera position in world space.
    fn camera_world_position(&self) -> Vec3;

    /// Unit view direction of the camera in world space.
    fn camera_world_direction(&self) -> Vec3;

    /// Intersect `ray` with every plane and sprite below the root,
    /// recursively, sorted nearest first. Markers are never hit.
    fn intersect_objects(&self, ray: &Ray) -> Vec<Intersection>;
}
