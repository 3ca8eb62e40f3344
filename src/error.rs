use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to install log subscriber: {0}")]
    Logging(String),

    #[error("gui error: {0}")]
    Gui(String),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to load image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Detection(#[from] DetectionError),
}

impl From<eframe::Error> for Error {
    fn from(value: eframe::Error) -> Self {
        // eframe::Error is not Send + Sync on every backend
        Self::Gui(value.to_string())
    }
}

/// Why a detection cycle produced no result.
///
/// "Zero faces" is a successful detection and is never reported through this type.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to face service failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("face service error: {0}")]
    Service(ServiceError),
}

/// Error reported by the remote service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// HTTP status of the response.
    pub status: u16,
    /// Vendor error code, e.g. `Unspecified`, `InvalidImage`, `401`.
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.status, self.code, self.message)
    }
}

impl DetectionError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service(ServiceError {
            status,
            code: code.into(),
            message: message.into(),
        })
    }

    /// Short label used in the window title and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectionError::Io { .. } => "io",
            DetectionError::Transport(_) => "transport",
            DetectionError::Service(_) => "service",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display_carries_code_and_message() {
        let err = DetectionError::service(401, "401", "Access denied due to invalid subscription key.");
        assert_eq!(err.kind(), "service");
        assert_eq!(
            err.to_string(),
            "face service error: 401 401 (Access denied due to invalid subscription key.)"
        );
    }

    #[test]
    fn io_error_names_the_path() {
        let err = DetectionError::io(
            "/tmp/missing.jpg",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("/tmp/missing.jpg"));
    }
}
