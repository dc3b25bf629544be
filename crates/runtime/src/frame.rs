use foundation::time::Time;

/// Per-tick frame metadata.
///
/// Timestamps come from the browser's animation-frame callback
/// (milliseconds since page load), so frames carry the measured interval
/// rather than a fixed step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index since the loop was (re)started.
    pub index: u64,
    pub timestamp_ms: f64,
    /// Interval since the previous frame; 0 for the first frame.
    pub dt_ms: f64,
    pub time: Time,
}

impl Frame {
    pub fn first(timestamp_ms: f64) -> Self {
        Self {
            index: 0,
            timestamp_ms,
            dt_ms: 0.0,
            time: Time::from_millis(timestamp_ms),
        }
    }

    pub fn next(self, timestamp_ms: f64) -> Self {
        Self {
            index: self.index + 1,
            timestamp_ms,
            dt_ms: (timestamp_ms - self.timestamp_ms).max(0.0),
            time: Time::from_millis(timestamp_ms),
        }
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn first_frame_has_no_interval() {
        let f = Frame::first(16.0);
        assert!(f.is_first());
        assert_eq!(f.dt_ms, 0.0);
        assert_eq!(f.time, Time(0.016));
    }

    #[test]
    fn next_advances_index_and_measures_interval() {
        let f1 = Frame::first(1000.0).next(1016.5);
        assert_eq!(f1.index, 1);
        assert_eq!(f1.dt_ms, 16.5);
        assert!((f1.time.seconds() - 1.0165).abs() < 1e-12);
    }

    #[test]
    fn clock_going_backwards_clamps_interval() {
        let f = Frame::first(50.0).next(40.0);
        assert_eq!(f.dt_ms, 0.0);
    }
}
