//! Shared plumbing for the outbound HTTP clients (Google Sheets, Gemini).
//!
//! - `RemoteError`: status-to-error mapping with truncated bodies
//! - `send_json`: send a request, retrying 429s with exponential backoff

pub mod error;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

pub use error::RemoteError;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Success passes through, a 429 yields `None` so the caller retries, and any
/// other status becomes a `RemoteError` carrying the (truncated) body.
async fn check_response_for_retry(
    response: reqwest::Response,
) -> Result<Option<reqwest::Response>, RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(Some(response))
    } else if status.as_u16() == 429 {
        Ok(None)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status, &body))
    }
}

/// Send the request built by `build` and decode its JSON body.
///
/// `build` is called once per attempt since a sent request cannot be reused.
pub async fn send_json<T, F>(service: &str, build: F) -> Result<T, RemoteError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut retries = 0;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        let response = build().send().await?;

        match check_response_for_retry(response).await? {
            Some(response) => {
                return response
                    .json()
                    .await
                    .map_err(|e| RemoteError::InvalidResponse(format!("{}: {}", service, e)));
            }
            None => {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(RemoteError::RateLimited);
                }
                warn!(service, retry = retries, backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
            }
        }
    }
}
