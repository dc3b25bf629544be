//! Explicit render loop.
//!
//! The browser drives the loop with `requestAnimationFrame`; this type owns
//! the start/stop state and turns raw callback timestamps into [`Frame`]s.
//! The driver asks [`RenderLoop::is_running`] before rescheduling, so a
//! stopped loop ends after the callback that observed the stop.

use crate::frame::Frame;
use crate::stats::FrameStats;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Nothing changed enough to redraw.
    Skipped,
}

/// Work executed once per frame.
pub trait FrameHandler {
    fn on_frame(&mut self, frame: Frame) -> FrameOutcome;
}

impl<F> FrameHandler for F
where
    F: FnMut(Frame) -> FrameOutcome,
{
    fn on_frame(&mut self, frame: Frame) -> FrameOutcome {
        self(frame)
    }
}

#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    last: Option<Frame>,
    stats: FrameStats,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            last: None,
            stats: FrameStats::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Returns `true` if the loop was not already running.
    ///
    /// A restarted loop begins a fresh frame sequence so the first interval
    /// does not span the paused period.
    pub fn start(&mut self) -> bool {
        if self.state == LoopState::Running {
            return false;
        }
        self.state = LoopState::Running;
        self.last = None;
        true
    }

    /// Returns `true` if the loop was running.
    pub fn stop(&mut self) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        self.state = LoopState::Stopped;
        true
    }

    /// Runs one frame. Returns `None` (and does nothing) unless running.
    pub fn step<H>(&mut self, timestamp_ms: f64, handler: &mut H) -> Option<FrameOutcome>
    where
        H: FrameHandler + ?Sized,
    {
        if !self.is_running() {
            return None;
        }

        let frame = match self.last {
            Some(prev) => prev.next(timestamp_ms),
            None => Frame::first(timestamp_ms),
        };
        let outcome = handler.on_frame(frame);
        self.last = Some(frame);
        self.stats.record(frame, outcome);
        Some(outcome)
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.last
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut FrameStats {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameOutcome, LoopState, RenderLoop};
    use crate::frame::Frame;

    #[test]
    fn idle_loop_does_not_step() {
        let mut lp = RenderLoop::new();
        let mut calls = 0;
        let out = lp.step(0.0, &mut |_f: Frame| {
            calls += 1;
            FrameOutcome::Rendered
        });
        assert_eq!(out, None);
        assert_eq!(calls, 0);
        assert_eq!(lp.state(), LoopState::Idle);
    }

    #[test]
    fn steps_produce_sequential_frames() {
        let mut lp = RenderLoop::new();
        assert!(lp.start());
        assert!(!lp.start());

        let mut seen = Vec::new();
        for ts in [10.0, 26.0, 42.0] {
            lp.step(ts, &mut |f: Frame| {
                seen.push((f.index, f.dt_ms));
                FrameOutcome::Rendered
            });
        }
        assert_eq!(seen, vec![(0, 0.0), (1, 16.0), (2, 16.0)]);
        assert_eq!(lp.stats().rendered, 3);
    }

    #[test]
    fn stop_prevents_further_frames() {
        let mut lp = RenderLoop::new();
        lp.start();
        lp.step(0.0, &mut |_f: Frame| FrameOutcome::Rendered);
        assert!(lp.stop());
        assert!(!lp.stop());
        assert!(!lp.is_running());
        let out = lp.step(16.0, &mut |_f: Frame| FrameOutcome::Rendered);
        assert_eq!(out, None);
        assert_eq!(lp.stats().total_frames(), 1);
    }

    #[test]
    fn restart_begins_a_fresh_sequence() {
        let mut lp = RenderLoop::new();
        lp.start();
        lp.step(0.0, &mut |_f: Frame| FrameOutcome::Rendered);
        lp.step(16.0, &mut |_f: Frame| FrameOutcome::Rendered);
        lp.stop();
        lp.start();
        lp.step(5000.0, &mut |_f: Frame| FrameOutcome::Skipped);

        let last = lp.last_frame().unwrap();
        assert_eq!(last.index, 0);
        assert_eq!(last.dt_ms, 0.0);
        assert_eq!(lp.stats().skipped, 1);
        assert_eq!(lp.stats().frame_interval_ms.count, 1);
    }
}
