//! Deadline for one logical command.

use std::{future::Future, time::Duration};

use crate::error::{Error, Result};

pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Race `work` against `deadline`. On expiry the work future is dropped,
/// which aborts its in-flight request; the remote command keeps running.
pub async fn with_deadline<T, F>(script: &str, deadline: Duration, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?deadline, "deadline exceeded, abandoning command");
            Err(Error::Timeout { script: script.to_string() })
        }
    }
}
