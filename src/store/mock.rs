//! In-memory store for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::store::{Point, RawResult, SeriesStore, StoreError, StoreResult};

/// Canned responses matched by statement substring
#[derive(Default)]
pub(crate) struct MockStore {
    responses: Vec<(String, Result<RawResult, String>)>,
    delays: Vec<(String, Duration)>,
    statements: Mutex<Vec<String>>,
    writes: Mutex<Vec<Point>>,
    completed: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `pattern` with `result`
    pub fn respond(mut self, pattern: &str, result: RawResult) -> Self {
        self.responses.push((pattern.to_string(), Ok(result)));
        self
    }

    /// Fail statements containing `pattern`
    pub fn fail(mut self, pattern: &str, message: &str) -> Self {
        self.responses
            .push((pattern.to_string(), Err(message.to_string())));
        self
    }

    /// Delay statements containing `pattern`
    pub fn delay(mut self, pattern: &str, delay: Duration) -> Self {
        self.delays.push((pattern.to_string(), delay));
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn written(&self) -> Vec<Point> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of statements that ran to completion
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeriesStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn database(&self) -> &str {
        "test"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn query(&self, statement: &str) -> StoreResult<RawResult> {
        self.statements.lock().unwrap().push(statement.to_string());

        let delay = self
            .delays
            .iter()
            .find(|(pattern, _)| statement.contains(pattern.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .responses
            .iter()
            .find(|(pattern, _)| statement.contains(pattern.as_str()))
            .map(|(_, response)| response.clone());
        self.completed.fetch_add(1, Ordering::SeqCst);

        match response {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(StoreError::Statement(message)),
            None => Ok(RawResult::default()),
        }
    }

    async fn write_points(&self, points: &[Point]) -> StoreResult<()> {
        self.writes.lock().unwrap().extend_from_slice(points);
        Ok(())
    }
}
