//! Waiting for asynchronous extractions.
//!
//! The vendor answers a submission with either `200` and the payload, or
//! `202` and a monitor URL in `Location`. The monitor URL is polled at a fixed
//! interval until it answers `200`. There is no backoff and no jitter; the
//! only ceilings are the optional attempt count and deadline in
//! [`PollConfig`].

use serde_json::Value;
use tokio::time::Instant;

use crate::connector::{AuthToken, ExtractionProvider, ExtractionStatus};
use crate::{DssError, PollConfig};

/// Drive an extraction from its submission status to its payload.
///
/// A `Completed` first status returns immediately. Otherwise the loop sleeps
/// `config.interval`, polls the monitor URL, and repeats. A later `202`
/// without a `Location` keeps the previous URL. Errors from the provider end
/// the loop unchanged.
///
/// # Errors
/// - `DssError::Data` when the first `202` carries no monitor URL.
/// - `DssError::PollExhausted` after `config.max_attempts` polls.
/// - `DssError::PollTimeout` when the next poll would fall past
///   `config.timeout`.
/// - Any error returned by [`ExtractionProvider::poll`].
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "datascope_core::poll::await_completion",
        skip(provider, token, first, config),
        fields(
            interval_ms = u64::try_from(config.interval.as_millis()).unwrap_or(u64::MAX),
            max_attempts = ?config.max_attempts,
        ),
    )
)]
pub async fn await_completion(
    provider: &dyn ExtractionProvider,
    token: &AuthToken,
    first: ExtractionStatus,
    config: &PollConfig,
) -> Result<Value, DssError> {
    let mut location = match first {
        ExtractionStatus::Completed(body) => return Ok(body),
        ExtractionStatus::InProgress {
            location: Some(loc),
            ..
        } => loc,
        ExtractionStatus::InProgress { location: None, .. } => {
            return Err(DssError::Data(
                "extraction accepted without a Location header".into(),
            ));
        }
    };

    let deadline = config.timeout.map(|t| Instant::now() + t);
    let mut attempts: u32 = 0;

    loop {
        if config.max_attempts.is_some_and(|max| attempts >= max) {
            #[cfg(feature = "tracing")]
            tracing::warn!(%location, attempts, "extraction poll attempts exhausted");
            return Err(DssError::PollExhausted { location, attempts });
        }
        if deadline.is_some_and(|d| Instant::now() + config.interval > d) {
            #[cfg(feature = "tracing")]
            tracing::warn!(%location, attempts, "extraction poll deadline reached");
            return Err(DssError::PollTimeout { location });
        }

        tokio::time::sleep(config.interval).await;
        attempts += 1;

        let status = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, provider.poll(token, &location))
                .await
                .map_err(|_| DssError::PollTimeout {
                    location: location.clone(),
                })??,
            None => provider.poll(token, &location).await?,
        };

        match status {
            ExtractionStatus::Completed(body) => {
                #[cfg(feature = "tracing")]
                tracing::info!(attempts, "extraction completed");
                return Ok(body);
            }
            ExtractionStatus::InProgress {
                location: next,
                progress,
            } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    attempts,
                    progress = progress.as_deref().unwrap_or(""),
                    "extraction in progress"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = progress;
                if let Some(next) = next {
                    location = next;
                }
            }
        }
    }
}
