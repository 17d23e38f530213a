//! Error types for backend requests

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response was not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("response is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("response field has an unexpected shape: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// Interaction message shown when a keyword search fails
    #[must_use]
    pub fn search_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Io { .. } => {
                "Search failed: could not reach the search server.".to_string()
            }
            Self::Status { status, .. } => {
                format!("Search failed: server responded with status {status}.")
            }
            Self::InvalidJson(_) => {
                "Search failed: the server response was not valid JSON.".to_string()
            }
            Self::MissingField(_) => "Search failed: the server response had no results.".to_string(),
            Self::Malformed(_) => "Search failed: the server returned malformed results.".to_string(),
        }
    }

    /// Alert text shown when an upload fails
    #[must_use]
    pub fn upload_message(&self) -> &'static str {
        match self {
            Self::Status { .. } => "Failed to upload the file. Please try again.",
            _ => "Error uploading the file. Please try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_mention_the_code() {
        let err = BackendError::Status {
            status: 503,
            message: String::new(),
        };
        assert_eq!(
            err.search_message(),
            "Search failed: server responded with status 503."
        );
        assert_eq!(
            err.upload_message(),
            "Failed to upload the file. Please try again."
        );
    }

    #[test]
    fn missing_results_field_has_its_own_message() {
        let err = BackendError::MissingField("results");
        assert_eq!(
            err.search_message(),
            "Search failed: the server response had no results."
        );
        assert_eq!(
            err.upload_message(),
            "Error uploading the file. Please try again."
        );
    }
}
