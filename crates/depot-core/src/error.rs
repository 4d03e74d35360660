use thiserror::Error;

/// Core error types for depot.
///
/// Shared by the store, the HTTP cache, and the ecosystem crates built on
/// top of them. Upstream failures keep their source error attached so the
/// caller can distinguish a network outage from a malformed payload.
#[derive(Error, Debug)]
pub enum DepotError {
    #[error("upstream request failed for {url}: {source}")]
    Upstream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("malformed upstream payload for {context}: {source}")]
    Payload {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no cached record for {name} {version}")]
    RecordNotFound { name: String, version: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DepotError {
    /// Helper for wrapping a failed upstream request.
    pub fn upstream(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Upstream {
            url: url.into(),
            source,
        }
    }

    /// Helper for wrapping a malformed upstream payload.
    pub fn payload(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Payload {
            context: context.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DepotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_display() {
        let err = DepotError::UpstreamStatus {
            url: "https://pypi.org/pypi/flask/json".into(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "upstream returned HTTP 503 for https://pypi.org/pypi/flask/json"
        );
    }

    #[test]
    fn test_record_not_found_display() {
        let err = DepotError::RecordNotFound {
            name: "requests".into(),
            version: "2.28.2".into(),
        };
        assert_eq!(err.to_string(), "no cached record for requests 2.28.2");
    }

    #[test]
    fn test_payload_helper() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DepotError::payload("flask 3.0.0", json_err);
        assert!(err.to_string().contains("malformed upstream payload"));
        assert!(err.to_string().contains("flask 3.0.0"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DepotError = io_err.into();
        assert!(matches!(err, DepotError::Io(_)));
    }
}
