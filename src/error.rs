/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum PdfServiceError {
    /// An attempt did not complete before its deadline and was cancelled.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    /// Network or request execution error from `reqwest`.
    #[error("network failure: {0}")]
    Network(reqwest::Error),
    /// 5xx status that was still failing on the last attempt.
    #[error("server error {status}: {message}")]
    ServerError { status: u16, message: String },
    /// Non-success, non-5xx status. Never retried.
    #[error("client error {status}: {message}")]
    ClientError { status: u16, message: String },
    /// Every attempt failed; `last` is the error of the final attempt.
    #[error("request failed after {attempts} attempt(s): {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: Box<PdfServiceError>,
    },
    /// Rejected retry configuration or a request that cannot be replayed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Filesystem error while saving a generated document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfServiceError {
    /// Returns `true` for the kinds that trigger another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Network(_) | Self::ServerError { .. }
        )
    }

    /// Returns `true` if this error, or the last attempt behind it, timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::ExhaustedRetries { last, .. } => last.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } | Self::ClientError { status, .. } => Some(*status),
            Self::ExhaustedRetries { last, .. } => last.status(),
            _ => None,
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else {
            Self::Network(err)
        }
    }
}
