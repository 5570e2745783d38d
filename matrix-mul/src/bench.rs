//! Scoped wall-clock timer.

use std::time::Instant;

use tracing::info;

/// Logs how long it lived when dropped, in microseconds.
///
/// ```
/// use matrix_mul::Stopwatch;
///
/// let _timer = Stopwatch::start("distributed");
/// // timed section
/// ```
pub struct Stopwatch {
    label: String,
    start: Instant,
}

impl Stopwatch {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        info!(
            "{}: {} microsecs",
            self.label,
            self.start.elapsed().as_micros()
        );
    }
}
