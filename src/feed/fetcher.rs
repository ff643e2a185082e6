use futures::StreamExt;
use std::time::Duration;

use super::types::FeedError;

/// Deadline for sending the request and reading the whole body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Downloads the feed at `url` and returns its body as text.
///
/// Makes exactly one attempt. Only `200 OK` is accepted; the body is read as
/// a stream and decoded as UTF-8 (invalid sequences are replaced).
///
/// # Errors
///
/// - [`FeedError::FetchStatus`] - any status other than 200
/// - [`FeedError::Timeout`] - the request did not complete within [`FETCH_TIMEOUT`]
/// - [`FeedError::Network`] - DNS, connection, TLS or mid-body transport failure
/// - [`FeedError::ResponseTooLarge`] - body larger than 10MB
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, FeedError> {
    fetch_with_timeout(client, url, FETCH_TIMEOUT).await
}

pub(crate) async fn fetch_with_timeout(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, FeedError> {
    // Dropping the inner future on expiry aborts the in-flight connection
    let bytes = tokio::time::timeout(timeout, fetch_bytes(client, url))
        .await
        .map_err(|_| {
            tracing::warn!(url = %url, timeout_secs = timeout.as_secs(), "Feed request timed out");
            FeedError::Timeout
        })??;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FeedError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::debug!(url = %url, status = %status, "Feed request rejected");
        return Err(FeedError::FetchStatus(status.as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    tracing::debug!(url = %url, bytes = bytes.len(), "Fetched feed");
    Ok(bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FeedError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FeedError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
