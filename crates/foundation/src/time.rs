/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    /// From a `DOMHighResTimeStamp` (milliseconds since page load).
    pub fn from_millis(ms: f64) -> Self {
        Self(ms * 0.001)
    }

    pub fn as_millis(self) -> f64 {
        self.0 * 1000.0
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}
