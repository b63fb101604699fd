use crate::core::MetricSource;
use crate::source::SourceError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A scripted metric source for tests.
///
/// Queued results are returned first, in order. Once the queue is empty every
/// call returns the default result.
pub struct FakeSource {
    queued: Mutex<VecDeque<Result<f64, String>>>,
    default: Result<f64, String>,
    calls: AtomicUsize,
}

impl FakeSource {
    /// A source that succeeds with `value` unless told otherwise.
    pub fn new(value: f64) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default: Ok(value),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source that always fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful sample.
    pub fn push_value(&self, value: f64) {
        self.queued.lock().unwrap().push_back(Ok(value));
    }

    /// Queue a failure.
    pub fn fail_next(&self, message: &str) {
        self.queued
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Number of times `sample` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricSource for FakeSource {
    async fn sample(&self) -> Result<f64, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        next.map_err(SourceError::Unavailable)
    }
}
