//! In-memory provider for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{MarketDataProvider, ProviderError};
use crate::core::pipeline::Payload;

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fetch {
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

/// Replays queued results and records every call.
///
/// Once the queue is drained, every call returns the fallback value.
pub(crate) struct MockProvider {
    queued: Mutex<VecDeque<Result<Payload, ProviderError>>>,
    fallback: Value,
    calls: Mutex<Vec<Fetch>>,
}

impl MockProvider {
    pub fn returning(fallback: Value) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, result: Result<Payload, ProviderError>) -> Self {
        self.queued.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Fetch> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<Fetch> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch(&self, path: &str, query: &[(&'static str, String)]) -> Result<Payload, ProviderError> {
        self.calls.lock().unwrap().push(Fetch {
            path: path.to_string(),
            query: query.to_vec(),
        });
        match self.queued.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(Payload::from_json(self.fallback.clone())),
        }
    }
}
