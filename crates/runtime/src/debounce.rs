/// Timer-based coalescing of bursty events.
///
/// The caller schedules a timer for `delay_ms` on every [`Debouncer::trigger`];
/// when a timer fires it asks [`Debouncer::fire_due`]. Only the timer that
/// belongs to the most recent trigger reports `true`, so a drag-resize
/// produces a single rebuild after the user lets go.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Debouncer {
    delay_ms: f64,
    last_trigger_ms: Option<f64>,
}

/// Browser timers may fire marginally before the nominal deadline when
/// measured against `performance.now()`.
const TIMER_SLACK_MS: f64 = 1.0;

impl Debouncer {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            last_trigger_ms: None,
        }
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Records an event and returns the deadline it pushes the fire time to.
    pub fn trigger(&mut self, now_ms: f64) -> f64 {
        self.last_trigger_ms = Some(now_ms);
        now_ms + self.delay_ms
    }

    pub fn is_pending(&self) -> bool {
        self.last_trigger_ms.is_some()
    }

    /// Returns `true` once per burst, when the quiet period has elapsed.
    pub fn fire_due(&mut self, now_ms: f64) -> bool {
        match self.last_trigger_ms {
            Some(last) if now_ms - last + TIMER_SLACK_MS >= self.delay_ms => {
                self.last_trigger_ms = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.last_trigger_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;

    #[test]
    fn burst_fires_once_after_quiet_period() {
        let mut d = Debouncer::new(150.0);
        d.trigger(0.0);
        d.trigger(40.0);
        d.trigger(90.0);

        // Timers for the first two triggers find the burst still active.
        assert!(!d.fire_due(150.0));
        assert!(!d.fire_due(190.0));
        assert!(d.fire_due(240.0));
        assert!(!d.is_pending());
        assert!(!d.fire_due(300.0));
    }

    #[test]
    fn tolerates_early_timer() {
        let mut d = Debouncer::new(150.0);
        assert_eq!(d.trigger(1000.0), 1150.0);
        assert!(d.fire_due(1149.5));
    }

    #[test]
    fn cancel_drops_pending_burst() {
        let mut d = Debouncer::new(150.0);
        d.trigger(0.0);
        d.cancel();
        assert!(!d.fire_due(1000.0));
    }
}
