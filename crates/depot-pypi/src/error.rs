//! Errors specific to the PyPI resolution pipeline.

use depot_core::DepotError;
use thiserror::Error;

/// Errors that can occur while resolving PyPI dependency metadata.
#[derive(Error, Debug)]
pub enum PypiError {
    /// Package does not exist on the index
    #[error("package '{package}' not found on the index")]
    PackageNotFound { package: String },

    /// Index has no data for this specific release
    #[error("release '{package}=={version}' not found on the index")]
    ReleaseNotFound { package: String, version: String },

    /// Package installer failed or timed out
    #[error("install failed for '{package}=={version}': {reason}")]
    Install {
        package: String,
        version: String,
        reason: String,
    },

    /// Wheel archive could not be unpacked
    #[error("failed to unpack '{filename}': {source}")]
    Unpack {
        filename: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Artifact download failed
    #[error("failed to download '{url}': {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Error from the shared cache/store layer
    #[error(transparent)]
    Core(#[from] DepotError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PyPI operations.
pub type Result<T> = std::result::Result<T, PypiError>;

impl PypiError {
    /// Helper for install failures.
    pub fn install(
        package: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Install {
            package: package.into(),
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Maps an upstream 404 for a package lookup to [`PypiError::PackageNotFound`],
    /// passing other core errors through.
    pub(crate) fn from_package_lookup(package: &str, err: DepotError) -> Self {
        match err {
            DepotError::UpstreamStatus { status: 404, .. } => Self::PackageNotFound {
                package: package.to_string(),
            },
            other => Self::Core(other),
        }
    }

    /// Maps an upstream 404 for a release lookup to [`PypiError::ReleaseNotFound`].
    pub(crate) fn from_release_lookup(package: &str, version: &str, err: DepotError) -> Self {
        match err {
            DepotError::UpstreamStatus { status: 404, .. } => Self::ReleaseNotFound {
                package: package.to_string(),
                version: version.to_string(),
            },
            other => Self::Core(other),
        }
    }
}
