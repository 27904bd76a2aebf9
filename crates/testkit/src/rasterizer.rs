//! Rasterizers whose completions are driven by the caller.

use std::collections::VecDeque;
use tracing::trace;
use webplane_core::Bitmap;
use webplane_ui3d::{RasterRequest, RasterizeError, Rasterizer};

/// Queues requests so a test decides when, and how, each job completes.
#[derive(Debug, Default)]
pub struct ScriptedRasterizer {
    requests: VecDeque<RasterRequest>,
    rejections: VecDeque<RasterizeError>,
    history: Vec<RasterRequest>,
}

impl ScriptedRasterizer {
    /// Create an empty rasterizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next request synchronously with `reason`.
    pub fn reject_next(&mut self, reason: impl Into<String>) {
        self.rejections
            .push_back(RasterizeError::Rejected(reason.into()));
    }

    /// Oldest request still waiting for a completion.
    pub fn take_next(&mut self) -> Option<RasterRequest> {
        self.requests.pop_front()
    }

    /// Requests waiting for a completion.
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    /// Every request ever accepted, in order.
    pub fn history(&self) -> &[RasterRequest] {
        &self.history
    }
}

impl Rasterizer for ScriptedRasterizer {
    fn rasterize(&mut self, request: RasterRequest) -> Result<(), RasterizeError> {
        if let Some(rejection) = self.rejections.pop_front() {
            trace!(job = %request.job, "scripted rejection");
            return Err(rejection);
        }
        self.requests.push_back(request);
        self.history.push(request);
        Ok(())
    }
}

/// Paints every request as a solid color. Results are collected with
/// [`SolidRasterizer::take_ready`] and fed back by the host loop.
#[derive(Debug)]
pub struct SolidRasterizer {
    color: [u8; 4],
    ready: Vec<(RasterRequest, Bitmap)>,
}

impl SolidRasterizer {
    /// Rasterizer painting `color` (RGBA).
    pub fn new(color: [u8; 4]) -> Self {
        Self {
            color,
            ready: Vec::new(),
        }
    }

    /// Drain finished bitmaps.
    pub fn take_ready(&mut self) -> Vec<(RasterRequest, Bitmap)> {
        std::mem::take(&mut self.ready)
    }
}

impl Rasterizer for SolidRasterizer {
    fn rasterize(&mut self, request: RasterRequest) -> Result<(), RasterizeError> {
        if request.size.is_empty() {
            return Err(RasterizeError::Failed(format!(
                "nothing to paint at {}x{}",
                request.size.width, request.size.height
            )));
        }
        self.ready
            .push((request, Bitmap::solid(request.size, self.color)));
        Ok(())
    }
}
