use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Shared result type for calls to the record store and the webhook.
pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Error, Clone)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response payload: {0}")]
    Decode(String),
    #[error("insert returned no rows")]
    EmptyInsert,
    #[error("internal error")]
    Internal(Arc<anyhow::Error>),
}

impl RemoteError {
    pub fn code(&self) -> &'static str {
        match self {
            RemoteError::Transport(_) => "TRANSPORT",
            RemoteError::Status { .. } => "STATUS",
            RemoteError::Decode(_) => "DECODE",
            RemoteError::EmptyInsert => "EMPTY_INSERT",
            RemoteError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }

    /// Builds a `Status` error from a non-2xx response.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        Self::Status {
            status: status.as_u16(),
            body: body_preview(body),
        }
    }

    /// The remote answered, but not with a 2xx.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RemoteError::Status { .. })
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<anyhow::Error> for RemoteError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

/// Sends a prepared request and turns any non-2xx answer into a `Status`
/// error. Returns the response body on success.
pub async fn send_checked(request: reqwest::RequestBuilder) -> RemoteResult<Vec<u8>> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        let err = RemoteError::from_status(status, body.as_ref());
        tracing::debug!(code = err.code(), %status, "remote rejected request");
        return Err(err);
    }
    Ok(body.to_vec())
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("`{url}` is not a valid url: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("`{0}` is not an http(s) url with a host")]
    Unsupported(String),
}

/// Parses a configured endpoint. Only absolute http(s) urls with a host are
/// accepted.
pub fn parse_endpoint(raw: &str) -> Result<Url, EndpointError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|source| EndpointError::Parse {
        url: trimmed.to_string(),
        source,
    })?;
    let http = matches!(url.scheme(), "http" | "https");
    if !http || url.host_str().is_none_or(str::is_empty) {
        return Err(EndpointError::Unsupported(trimmed.to_string()));
    }
    Ok(url)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
