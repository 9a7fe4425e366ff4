use std::time::Duration;

use thiserror::Error;

/// Reasons a single informers request can be abandoned.
///
/// None of these reach the entity: the view logs them and keeps serving the
/// last good snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Provider { status: String, message: String },

    #[error("could not decode response (HTTP {http_status}): {source}")]
    Decode {
        http_status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Stable label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Transport(_) => "transport",
            FetchError::Provider { .. } => "provider",
            FetchError::Decode { .. } => "decode",
        }
    }
}
