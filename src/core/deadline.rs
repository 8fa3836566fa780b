use std::future::Future;
use std::time::Duration;

use crate::core::error::{Result, StorageError};

/// Per-operation deadline for work that blocks on the store.
///
/// When the deadline expires the wrapped future is dropped, which cancels any
/// in-flight query, and the caller gets [`StorageError::Timeout`].
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Operation '{}' exceeded deadline of {:?}",
                    operation,
                    self.limit
                );
                Err(StorageError::Timeout(self.limit).into())
            }
        }
    }
}
