use serde::Serialize;

use crate::frame::Frame;
use crate::render_loop::FrameOutcome;

/// Running min/max/sum over recorded samples.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Histogram {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Histogram {
    pub fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Frame counters for the render loop.
///
/// Only touched from the frame callback and resize handler, so plain fields
/// suffice. Serialized as-is for the debug readout.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FrameStats {
    pub rendered: u64,
    pub skipped: u64,
    pub rebuilds: u64,
    /// Interval between consecutive frames, in milliseconds.
    pub frame_interval_ms: Histogram,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame: Frame, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Rendered => self.rendered += 1,
            FrameOutcome::Skipped => self.skipped += 1,
        }
        if !frame.is_first() {
            self.frame_interval_ms.record(frame.dt_ms);
        }
    }

    pub fn record_rebuild(&mut self) {
        self.rebuilds += 1;
    }

    pub fn total_frames(&self) -> u64 {
        self.rendered + self.skipped
    }
}
