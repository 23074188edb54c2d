//! HTTP probe implementation.

use super::ProbeError;
use std::time::Duration;

/// Build the shared HTTP client. The timeout bounds the whole request, body included.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ProbeError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProbeError::Network(e.to_string()))
}

/// Run an HTTP probe against the given address.
///
/// Succeeds only when the response status is exactly 200.
pub async fn run_http_probe(client: &reqwest::Client, address: &str) -> Result<(), ProbeError> {
    let url = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| ProbeError::Network(e.to_string()))?;

    let status = response.status();

    // Read the full body to measure complete transfer time
    let _body = response
        .bytes()
        .await
        .map_err(|e| ProbeError::Network(e.to_string()))?;

    if status != reqwest::StatusCode::OK {
        return Err(ProbeError::Status(status.as_u16()));
    }

    Ok(())
}
