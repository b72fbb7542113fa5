//! Generated sample suite
//!
//! Synthetic tests with randomised latency, used by the CLI to exercise the
//! schedulers without a real system under test.

use anyhow::bail;
use rand::Rng;
use std::time::Duration;

use super::suite::TestSuite;

/// Builder for a synthetic suite
#[derive(Clone, Debug)]
pub struct SampleSuite {
    tests: usize,
    fail_every: Option<usize>,
    max_delay_ms: u64,
}

impl SampleSuite {
    pub fn new(tests: usize) -> Self {
        Self {
            tests,
            fail_every: None,
            max_delay_ms: 100,
        }
    }

    /// Make every n-th test fail; 0 disables failures
    pub fn fail_every(mut self, n: usize) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Whether test number `i` (1-based) is generated to fail
    pub fn fails(&self, i: usize) -> bool {
        self.fail_every.is_some_and(|n| i % n == 0)
    }

    pub fn build(&self, name: impl Into<String>) -> TestSuite {
        let mut suite = TestSuite::new(name);

        for i in 1..=self.tests {
            let fails = self.fails(i);
            let max_delay_ms = self.max_delay_ms;

            suite = suite.test(format!("sample_{i:03}"), move || async move {
                let delay = if max_delay_ms == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=max_delay_ms)
                };
                tokio::time::sleep(Duration::from_millis(delay)).await;

                if fails {
                    bail!("sample_{i:03}: generated failure after {delay}ms");
                }
                Ok(())
            });
        }

        suite
    }
}

impl Default for SampleSuite {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SuiteRunner;
    use crate::models::SchedulerConfig;

    #[test]
    fn test_failure_pattern() {
        let sample = SampleSuite::new(6).fail_every(3);
        assert!(!sample.fails(1));
        assert!(sample.fails(3));
        assert!(sample.fails(6));
        assert!(!SampleSuite::new(6).fail_every(0).fails(3));
    }

    #[tokio::test]
    async fn test_sample_suite_runs() {
        let suite = SampleSuite::new(6)
            .fail_every(2)
            .max_delay_ms(5)
            .build("sample")
            .with_config(SchedulerConfig::parallel().with_workers(3));
        assert_eq!(suite.len(), 6);
        assert_eq!(suite.methods()[0].name(), "sample_001");

        let summary = SuiteRunner::new(suite).run().await.unwrap();
        assert_eq!(summary.passed, 3);
        assert_eq!(summary.failed, 3);
    }
}
