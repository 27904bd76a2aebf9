//! Per-panel job queue and the state of the one job in flight.

use super::AssetBarrier;
use crate::components::ButtonBound;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;
use webplane_core::{Millis, PixelSize};
use webplane_dom::NodeRef;

/// Monotonic render job identifier, unique per panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a content tree waiting to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub id: JobId,
    /// Live tree the snapshot was taken from.
    pub tree: NodeRef,
    /// Detached deep clone that gets attached, measured and painted.
    pub snapshot: NodeRef,
    /// Live interactive elements of `tree`, in document order.
    pub sources: Vec<NodeRef>,
}

/// Where the live job is.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStage {
    /// Attached offscreen, waiting for images.
    AwaitingAssets { barrier: AssetBarrier, since: Millis },
    /// Measured and handed to the rasterizer.
    Rasterizing {
        size: PixelSize,
        bounds: Vec<ButtonBound>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveJob {
    pub job: RenderJob,
    pub stage: JobStage,
}

impl LiveJob {
    /// True once the asset barrier has released and measuring can start.
    pub fn assets_settled(&self) -> bool {
        matches!(&self.stage, JobStage::AwaitingAssets { barrier, .. } if barrier.is_settled())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Busy,
}

/// Snapshot of a pipeline for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStatus {
    pub state: PipelineState,
    pub live_job: Option<JobId>,
    pub queued: usize,
    /// Images the live job is still waiting for.
    pub pending_assets: usize,
}

/// FIFO of render jobs with at most one in flight.
#[derive(Debug, Default)]
pub struct RenderPipeline {
    queue: VecDeque<RenderJob>,
    live: Option<LiveJob>,
    next_id: u64,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot, assigning it the next job id.
    pub fn enqueue(&mut self, tree: NodeRef, snapshot: NodeRef, sources: Vec<NodeRef>) -> JobId {
        self.next_id += 1;
        let id = JobId(self.next_id);
        debug!(job = %id, queued = self.queue.len() + 1, "render job enqueued");
        self.queue.push_back(RenderJob {
            id,
            tree,
            snapshot,
            sources,
        });
        id
    }

    /// Next job to start, only while idle.
    pub fn pop_next(&mut self) -> Option<RenderJob> {
        if self.live.is_some() {
            return None;
        }
        self.queue.pop_front()
    }

    /// Make `job` the live job.
    pub fn begin(&mut self, job: RenderJob, stage: JobStage) {
        debug_assert!(self.live.is_none(), "a render job is already live");
        debug!(job = %job.id, "render job started");
        self.live = Some(LiveJob { job, stage });
    }

    pub fn live(&self) -> Option<&LiveJob> {
        self.live.as_ref()
    }

    pub fn live_mut(&mut self) -> Option<&mut LiveJob> {
        self.live.as_mut()
    }

    /// Finish the live job if its id is `id`.
    pub fn take_live(&mut self, id: JobId) -> Option<LiveJob> {
        match &self.live {
            Some(live) if live.job.id == id => self.live.take(),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.live.is_none()
    }

    pub fn queued(&self) -> impl Iterator<Item = &RenderJob> {
        self.queue.iter()
    }

    /// True if any queued or live job was taken from `tree`.
    pub fn references_tree(&self, tree: NodeRef) -> bool {
        self.live.iter().any(|l| l.job.tree == tree) || self.queue.iter().any(|j| j.tree == tree)
    }

    /// Remove every job, live one included.
    pub fn drain(&mut self) -> Vec<RenderJob> {
        let mut jobs: Vec<RenderJob> = self.live.take().map(|l| l.job).into_iter().collect();
        jobs.extend(self.queue.drain(..));
        jobs
    }

    pub fn status(&self) -> PipelineStatus {
        let pending_assets = match self.live.as_ref().map(|l| &l.stage) {
            Some(JobStage::AwaitingAssets { barrier, .. }) => barrier.pending_count(),
            _ => 0,
        };
        PipelineStatus {
            state: if self.live.is_some() {
                PipelineState::Busy
            } else {
                PipelineState::Idle
            },
            live_job: self.live.as_ref().map(|l| l.job.id),
            queued: self.queue.len(),
            pending_assets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaiting() -> JobStage {
        JobStage::AwaitingAssets {
            barrier: AssetBarrier::default(),
            since: Millis::ZERO,
        }
    }

    #[test]
    fn jobs_run_one_at_a_time_in_order() {
        let mut pipeline = RenderPipeline::new();
        let a = pipeline.enqueue(NodeRef(1), NodeRef(10), vec![]);
        let b = pipeline.enqueue(NodeRef(1), NodeRef(11), vec![]);
        assert!(a < b);

        let first = pipeline.pop_next().unwrap();
        assert_eq!(first.id, a);
        pipeline.begin(first, awaiting());
        assert!(pipeline.pop_next().is_none());
        assert_eq!(pipeline.status().state, PipelineState::Busy);
        assert_eq!(pipeline.status().queued, 1);

        assert!(pipeline.take_live(b).is_none());
        assert!(pipeline.take_live(a).is_some());
        assert_eq!(pipeline.pop_next().unwrap().id, b);
        assert_eq!(pipeline.status().state, PipelineState::Idle);
    }

    #[test]
    fn drain_returns_live_and_queued() {
        let mut pipeline = RenderPipeline::new();
        pipeline.enqueue(NodeRef(1), NodeRef(10), vec![]);
        pipeline.enqueue(NodeRef(2), NodeRef(11), vec![]);
        let first = pipeline.pop_next().unwrap();
        pipeline.begin(first, awaiting());
        assert!(pipeline.references_tree(NodeRef(2)));

        let drained = pipeline.drain();
        assert_eq!(drained.len(), 2);
        assert!(pipeline.is_idle());
        assert!(!pipeline.references_tree(NodeRef(1)));
    }
}
