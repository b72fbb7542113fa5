//! Timer utilities
//!
//! Measures how long units and suite runs take.

use std::time::{Duration, Instant};

/// Wall-clock timer for one unit or suite run
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Start timing `label`
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    /// Milliseconds since `start`, saturating
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Stop the timer and log how long `label` ran
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        tracing::debug!("'{}' finished in {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timer() {
        let timer = Timer::start("unit");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        assert!(timer.finish() >= Duration::from_millis(10));
    }
}
