//! Test suite definitions
//!
//! A suite is an ordered list of test methods plus optional per-test
//! fixtures. Methods are discovered in insertion order.

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::models::{SchedulerConfig, TestStatus};

/// Shareable async test body or fixture
pub type TestFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

fn boxed<F, Fut>(f: F) -> TestFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// A single discovered test
#[derive(Clone)]
pub struct TestMethod {
    name: String,
    body: TestFn,
}

impl TestMethod {
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: boxed(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethod").field("name", &self.name).finish()
    }
}

/// Setup and teardown run around every test
#[derive(Clone, Default)]
pub struct Fixtures {
    before_each: Option<TestFn>,
    after_each: Option<TestFn>,
}

impl Fixtures {
    /// Run one test with its fixtures folded in.
    ///
    /// A failing setup skips the body and reports an error. Teardown always
    /// runs once setup has started; a failing teardown turns a pass into an
    /// error but never hides a body failure.
    pub async fn invoke(&self, method: &TestMethod) -> (TestStatus, Option<String>) {
        if let Some(setup) = &self.before_each {
            if let Err(e) = setup().await {
                self.teardown().await;
                return (TestStatus::Error, Some(format!("setup failed: {e:#}")));
            }
        }

        let outcome = match (method.body)().await {
            Ok(()) => (TestStatus::Pass, None),
            Err(e) => (TestStatus::Fail, Some(format!("{e:#}"))),
        };

        match self.teardown().await {
            Some(e) if outcome.0 == TestStatus::Pass => {
                (TestStatus::Error, Some(format!("teardown failed: {e}")))
            }
            _ => outcome,
        }
    }

    async fn teardown(&self) -> Option<String> {
        let teardown = self.after_each.as_ref()?;
        teardown().await.err().map(|e| format!("{e:#}"))
    }
}

/// An ordered set of tests with an optional scheduling preference
#[derive(Clone)]
pub struct TestSuite {
    name: String,
    config: Option<SchedulerConfig>,
    fixtures: Fixtures,
    methods: Vec<TestMethod>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: None,
            fixtures: Fixtures::default(),
            methods: Vec::new(),
        }
    }

    /// Declare how this suite wants to be scheduled
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn before_each<F, Fut>(mut self, setup: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.fixtures.before_each = Some(boxed(setup));
        self
    }

    pub fn after_each<F, Fut>(mut self, teardown: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.fixtures.after_each = Some(boxed(teardown));
        self
    }

    /// Add a test method
    pub fn test<F, Fut>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.methods.push(TestMethod::new(name, body));
        self
    }

    pub fn add_method(mut self, method: TestMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> Option<&SchedulerConfig> {
        self.config.as_ref()
    }

    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    /// Tests in discovery order
    pub fn methods(&self) -> &[TestMethod] {
        &self.methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("methods", &self.methods)
            .finish()
    }
}
