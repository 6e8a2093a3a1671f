use std::future::Future;

use anyhow::Result;
use tracing::warn;

pub mod event_repository;
pub mod order_repository;
pub mod user_repository;

pub use event_repository::EventRepository;
pub use order_repository::{OrderPlacement, OrderRepository};
pub use user_repository::UserRepository;

/// Connection-level failures that a fresh attempt can recover from, as
/// opposed to errors the query itself earned.
pub(crate) fn is_transient(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(
            sqlx::Error::Io(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        )
    )
}

pub(crate) fn is_unique_violation(err: &anyhow::Error, constraint: &str) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// Runs a read query, retrying a single time when the first attempt dies on
/// a transient connection error. Writes are never routed through here since
/// the first attempt may have committed.
pub(crate) async fn retry_once<F, Fut, T>(operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match operation().await {
        Ok(value) => Ok(value),
        Err(err) if is_transient(&err) => {
            warn!("Transient storage error, retrying once: {}", err);
            operation().await
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_once_recovers_from_transient_error() {
        let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));

        let counter_clone = counter.clone();
        let result = retry_once(|| {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                if count < 2 {
                    Err(anyhow::Error::from(sqlx::Error::PoolTimedOut))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_once_passes_through_query_errors() {
        let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));

        let counter_clone = counter.clone();
        let result: Result<()> = retry_once(|| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Err(anyhow::anyhow!("column does not exist"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&anyhow::Error::from(sqlx::Error::PoolClosed)));
        assert!(!is_transient(&anyhow::anyhow!("syntax error")));
        assert!(!is_transient(&anyhow::Error::from(sqlx::Error::RowNotFound)));
    }
}
