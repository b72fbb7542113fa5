//! Suite driver
//!
//! Discovers the tests of a suite, wraps each one (fixtures included) in a
//! work unit, and records the outcome of every unit after the scheduler
//! drains.

mod runner;
mod sample;
mod suite;

pub use runner::SuiteRunner;
pub use sample::SampleSuite;
pub use suite::{Fixtures, TestFn, TestMethod, TestSuite};
