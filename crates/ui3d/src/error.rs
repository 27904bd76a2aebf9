//! Errors surfaced by panels.

use crate::render::JobId;
use thiserror::Error;
use webplane_dom::DomError;

/// Failure reported by a [`Rasterizer`](crate::render::Rasterizer).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RasterizeError {
    /// The rasterizer refused to start the job.
    #[error("rasterizer rejected the request: {0}")]
    Rejected(String),
    /// The job started but produced no bitmap.
    #[error("rasterization failed: {0}")]
    Failed(String),
}

/// Errors a panel reports to its host.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Content was neither markup, a sequence of markup strings, nor an element.
    #[error("content must be a markup string, a sequence of markup strings or an element node, got {found}")]
    InvalidContentKind {
        /// Description of what was supplied.
        found: String,
    },
    /// Content was of a valid kind but had nothing in it.
    #[error("content is empty")]
    EmptyContent,
    /// The document refused an operation.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The rasterizer failed a job; the previous bitmap stays on screen.
    #[error("render job {job} failed: {source}")]
    Rasterize {
        /// Job that failed.
        job: JobId,
        /// Rasterizer error.
        #[source]
        source: RasterizeError,
    },
}
