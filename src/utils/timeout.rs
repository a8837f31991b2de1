//! Deadline guard for a single catalog call.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::catalogs::CatalogError;

/// Run `call` under a deadline, racing it against an optional cancellation token.
///
/// Whichever of the deadline or the token fires first wins; the call future is
/// dropped at that point, which aborts the in-flight request. The timer and the
/// token listener live inside this future and are released on every exit path.
/// A token that is already cancelled returns `Cancelled` without polling `call`.
pub async fn with_timeout<T, Fut>(
    call: Fut,
    duration: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<T, CatalogError>
where
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let cancelled = async {
        match cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancelled => Err(CatalogError::Cancelled),
        outcome = tokio::time::timeout(duration, call) => match outcome {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout(duration)),
        },
    }
}
