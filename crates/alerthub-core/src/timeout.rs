//! Time-bounded boundary calls.
//!
//! Store and transport calls are the only suspension points in the
//! delivery path; each one goes through [`bounded`] so a stalled backend
//! surfaces as an error instead of hanging a sweep.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::error::AppResult;

/// Run `fut`, failing with `ServiceUnavailable` if it exceeds `limit`.
pub async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                limit_ms = limit.as_millis() as u64,
                "Boundary call timed out"
            );
            Err(AppError::service_unavailable(format!(
                "{operation} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_passes_through_result() {
        let value = bounded("noop", Duration::from_millis(50), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let result: AppResult<()> = bounded("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
        assert!(err.message.contains("slow"));
    }
}
