//! Shared HTTP plumbing for the remote adapters.

use crate::StorageResult;
use medialib_error::{StorageError, StorageErrorKind};
use reqwest::{Response, Url};

/// Join `segments` onto `base`, percent-encoding each one. Segments containing
/// `/` are split so nested storage paths keep their structure.
pub(crate) fn endpoint_url(base: &str, segments: &[&str]) -> StorageResult<Url> {
    let mut url = Url::parse(base).map_err(|e| {
        StorageError::new(StorageErrorKind::Configuration(format!(
            "invalid base URL {}: {}",
            base, e
        )))
    })?;
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            StorageError::new(StorageErrorKind::Configuration(format!(
                "base URL {} cannot carry a path",
                base
            )))
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.extend(segment.split('/').filter(|s| !s.is_empty()));
        }
    }
    Ok(url)
}

/// Map a transport failure to a transfer error.
#[track_caller]
pub(crate) fn transfer_error(provider: &str, e: reqwest::Error) -> StorageError {
    StorageError::new(StorageErrorKind::transfer(provider, e.to_string()))
}

/// Turn non-success responses into errors, reading the body for context.
/// 404 becomes `NotFound` so deletes can be idempotent.
pub(crate) async fn check_status(provider: &str, response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(provider, status = %status, url = %url, body = %body, "Remote storage returned error");
    let kind = if status == reqwest::StatusCode::NOT_FOUND {
        StorageErrorKind::NotFound(url)
    } else {
        StorageErrorKind::transfer(provider, format!("{}: {}", status, body))
    };
    Err(StorageError::new(kind))
}
