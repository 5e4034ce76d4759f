use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("Failed to decode {endpoint} response: {reason}")]
    Decode {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Upload of {file} failed: {reason}")]
    UploadFailed { file: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GalleryError {
    /// Whether this failure came from the network path (the service was
    /// unreachable, timed out, or answered with an error status).
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Status { .. } | Self::Decode { .. } => true,
            #[cfg(feature = "network")]
            Self::Http(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(GalleryError::Transport("refused".into()).is_transport());
        assert!(GalleryError::Status {
            endpoint: "list",
            status: 503
        }
        .is_transport());
        assert!(!GalleryError::EmptyQuery.is_transport());
        assert!(!GalleryError::Config("bad url".into()).is_transport());
    }

    #[test]
    fn test_upload_failure_names_file() {
        let err = GalleryError::UploadFailed {
            file: "cat.jpg".into(),
            reason: "status 500".into(),
        };
        assert_eq!(err.to_string(), "Upload of cat.jpg failed: status 500");
    }
}
