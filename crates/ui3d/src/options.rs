//! Per-panel options.

use serde::{Deserialize, Serialize};

/// Default throttle window for content submissions.
pub const DEFAULT_THROTTLE_MS: u64 = 250;

/// Throttle configuration: an interval in milliseconds, or a boolean switch
/// (`false` disables throttling, `true` uses [`DEFAULT_THROTTLE_MS`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThrottleSetting {
    /// Explicit interval.
    Interval(u64),
    /// On/off switch.
    Enabled(bool),
}

impl Default for ThrottleSetting {
    fn default() -> Self {
        ThrottleSetting::Interval(DEFAULT_THROTTLE_MS)
    }
}

impl ThrottleSetting {
    /// Effective interval, `None` when disabled.
    pub fn interval_ms(self) -> Option<u64> {
        match self {
            ThrottleSetting::Interval(ms) => Some(ms),
            ThrottleSetting::Enabled(true) => Some(DEFAULT_THROTTLE_MS),
            ThrottleSetting::Enabled(false) => None,
        }
    }
}

/// Options a panel is constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelOptions {
    /// Leading+trailing throttle for `submit_content` and mutation re-renders.
    pub throttle_interval_ms: ThrottleSetting,
    /// Blank the displayed texture while a job renders.
    pub clear_texture_on_render: bool,
    /// Disable depth testing so the panel draws over the scene.
    pub always_on_top: bool,
    /// Drop a marker at every click point.
    pub debug: bool,
    /// Re-render automatically when the content tree changes.
    pub observe_mutations: bool,
    /// Give up waiting for images after this long. `None` waits forever.
    pub asset_timeout_ms: Option<u64>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            throttle_interval_ms: ThrottleSetting::default(),
            clear_texture_on_render: true,
            always_on_top: false,
            debug: false,
            observe_mutations: false,
            asset_timeout_ms: None,
        }
    }
}

impl PanelOptions {
    /// Builder: set the throttle interval, `None` to disable.
    pub fn with_throttle(mut self, interval_ms: Option<u64>) -> Self {
        self.throttle_interval_ms = match interval_ms {
            Some(ms) => ThrottleSetting::Interval(ms),
            None => ThrottleSetting::Enabled(false),
        };
        self
    }

    /// Builder: set texture clearing while rendering.
    pub fn with_clear_texture_on_render(mut self, clear: bool) -> Self {
        self.clear_texture_on_render = clear;
        self
    }

    /// Builder: set always-on-top.
    pub fn with_always_on_top(mut self, on_top: bool) -> Self {
        self.always_on_top = on_top;
        self
    }

    /// Builder: set debug markers.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Builder: set mutation observation.
    pub fn with_observe_mutations(mut self, observe: bool) -> Self {
        self.observe_mutations = observe;
        self
    }

    /// Builder: set the asset timeout.
    pub fn with_asset_timeout(mut self, timeout_ms: Option<u64>) -> Self {
        self.asset_timeout_ms = timeout_ms;
        self
    }
}
