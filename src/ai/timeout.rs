//! Timeout helpers
//!
//! Wraps futures so an overrun surfaces as `DocError::Timeout` naming the
//! operation, instead of a bare `Elapsed`.

use std::future::Future;
use std::time::Duration;

use crate::types::{DocError, Result};

/// Run a fallible future, failing with `DocError::Timeout` after `timeout`
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(DocError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, DocError>(42) },
            "git clone",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, DocError>(42)
            },
            "git clone",
        )
        .await;
        match result {
            Err(DocError::Timeout { operation, .. }) => assert_eq!(operation, "git clone"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
