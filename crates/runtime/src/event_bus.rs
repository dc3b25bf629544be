use std::collections::VecDeque;

/// Lifecycle event categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    LoopStarted,
    LoopStopped,
    Rebuild,
    ColorTarget,
    AssetReady,
    AssetFailed,
    PassDisabled,
    GpuUnavailable,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::LoopStarted => "loop-started",
            EventKind::LoopStopped => "loop-stopped",
            EventKind::Rebuild => "rebuild",
            EventKind::ColorTarget => "color-target",
            EventKind::AssetReady => "asset-ready",
            EventKind::AssetFailed => "asset-failed",
            EventKind::PassDisabled => "pass-disabled",
            EventKind::GpuUnavailable => "gpu-unavailable",
        }
    }
}

/// Event tagged with the index of the frame it happened in (or before).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: EventKind,
    pub message: String,
}

/// Bounded event log. When full, the oldest event is dropped.
#[derive(Debug)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn emit(&mut self, frame_index: u64, kind: EventKind, message: impl Into<String>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(Event {
            frame_index,
            kind,
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}
