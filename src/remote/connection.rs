use reqwest::Client;
use std::time::Duration;

use super::error::RemoteError;

/// Build the HTTP client used for every call to the jobs service
///
/// # Parameters
/// - `request_timeout`: upper bound for a single request, connect included
pub fn build_client(request_timeout: Duration) -> Result<Client, RemoteError> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(request_timeout)
        .build()
        .map_err(|e| RemoteError::Network(format!("failed to build HTTP client: {}", e)))
}
