use super::JobId;
use crate::error::RasterizeError;
use webplane_core::PixelSize;
use webplane_dom::NodeRef;
use webplane_scene::NodeId;

/// Work handed to a rasterizer: paint `node` (attached offscreen) at `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterRequest {
    /// Panel that owns the job; completions are routed back through it.
    pub panel: NodeId,
    pub job: JobId,
    /// Snapshot clone to paint.
    pub node: NodeRef,
    /// Measured content size.
    pub size: PixelSize,
}

/// Offscreen HTML-to-bitmap renderer.
///
/// `rasterize` only starts the work. The bitmap comes back later through
/// `SurfacePanel::on_bitmap_ready`; an `Err` here means the job never
/// started and takes the same failure path.
pub trait Rasterizer {
    fn rasterize(&mut self, request: RasterRequest) -> Result<(), RasterizeError>;
}
