//! Shared JSON-over-HTTP plumbing for the backend adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::CommitError;
use crate::llm::provider::{AuthScheme, ProviderDescriptor};

/// Request timeout for hosted APIs.
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(60);

/// Generation timeout for local inference servers.
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the local-server readiness probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest upstream body echoed back in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Timeout appropriate for the descriptor's backend.
pub fn request_timeout(descriptor: &ProviderDescriptor) -> Duration {
    if descriptor.kind.is_local() {
        LOCAL_TIMEOUT
    } else {
        REMOTE_TIMEOUT
    }
}

fn apply_auth(
    request: RequestBuilder,
    auth: AuthScheme,
    credential: Option<&str>,
) -> RequestBuilder {
    match (auth, credential) {
        (AuthScheme::Bearer, Some(key)) => request.bearer_auth(key),
        (AuthScheme::HeaderApiKey(header), Some(key)) => request.header(header, key),
        _ => request,
    }
}

/// POST `body` as JSON and decode a JSON response.
///
/// Transport failures, non-2xx statuses, and undecodable bodies all become
/// `CommitError::Provider`; refused connections to local servers become
/// `CommitError::LocalServerUnreachable`.
pub async fn post_json<B, R>(
    client: &Client,
    descriptor: &ProviderDescriptor,
    url: &str,
    body: &B,
    credential: Option<&str>,
    extra_headers: &[(&'static str, &'static str)],
) -> Result<R, CommitError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    debug!("POST {} ({} model {})", url, descriptor.kind, descriptor.model);

    let mut request = client
        .post(url)
        .timeout(request_timeout(descriptor))
        .json(body);
    for (name, value) in extra_headers {
        request = request.header(*name, *value);
    }
    let request = apply_auth(request, descriptor.auth, credential);

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(descriptor, e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(descriptor, e))?;

    if !status.is_success() {
        return Err(CommitError::Provider {
            backend: descriptor.kind,
            status: Some(status.as_u16()),
            message: extract_error_message(&text, status),
        });
    }

    serde_json::from_str(&text).map_err(|e| CommitError::Provider {
        backend: descriptor.kind,
        status: Some(status.as_u16()),
        message: format!("invalid response body: {e}"),
    })
}

/// GET `url` with a short timeout and report whether it answered 2xx.
pub async fn probe(client: &Client, url: &str) -> bool {
    match client.get(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => {
            let ok = response.status().is_success();
            debug!("Probe {} answered {}", url, response.status());
            ok
        }
        Err(e) => {
            debug!("Probe {} failed: {}", url, e);
            false
        }
    }
}

fn transport_error(descriptor: &ProviderDescriptor, err: reqwest::Error) -> CommitError {
    if descriptor.kind.is_local() && err.is_connect() {
        return CommitError::LocalServerUnreachable {
            backend: descriptor.kind,
            url: descriptor.base_url.clone(),
        };
    }

    let message = if err.is_timeout() {
        format!(
            "request timed out after {}s",
            request_timeout(descriptor).as_secs()
        )
    } else {
        err.to_string()
    };

    CommitError::Provider {
        backend: descriptor.kind,
        status: err.status().map(|s| s.as_u16()),
        message,
    }
}

/// Pull the most useful message out of an upstream error body.
///
/// Tries `error.message`, then `error` as a string, then `message`, then the
/// raw body (shortened), then the status reason.
pub fn extract_error_message(body: &str, status: StatusCode) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let candidates = [
            json.pointer("/error/message"),
            json.get("error").filter(|v| v.is_string()),
            json.get("message"),
        ];
        if let Some(message) = candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str())
            .filter(|m| !m.trim().is_empty())
        {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }

    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
