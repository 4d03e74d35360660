//! PyPI index client.
//!
//! Talks to the PyPI JSON API:
//! - `{base}/{package}/json` for the full version listing
//! - `{base}/{package}/{version}/json` for per-release metadata
//!
//! Responses flow through the shared [`HttpCache`], so unchanged payloads
//! cost a conditional GET at most.

use crate::error::{PypiError, Result};
use depot_core::HttpCache;
use serde::Deserialize;
use std::sync::Arc;

/// Default base URL for the PyPI JSON API.
pub const PYPI_BASE: &str = "https://pypi.org/pypi";

/// Normalizes a package name: underscores become hyphens, then lowercase.
///
/// The ecosystem has no single canonical spelling, so this is applied before
/// every store read or write and before any index URL is built, keeping name
/// variants converging on one cached row. Installed artifacts on disk may
/// still carry the original casing; the metadata extractor handles that
/// separately.
///
/// # Examples
///
/// ```
/// # use depot_pypi::registry::normalize_name;
/// assert_eq!(normalize_name("Foo_Bar"), "foo-bar");
/// assert_eq!(normalize_name("requests"), "requests");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.replace('_', "-").to_lowercase()
}

/// Declared requirements of one release, as the index reports them.
///
/// The JSON API's `requires_dist` is nullable, and null does NOT mean "no
/// requirements" — it means the index has no structured data for this
/// release and the answer must be derived by materializing the package
/// locally. Keeping the two cases as distinct variants forces every caller
/// to handle the fallback explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseRequirements {
    /// The index lists the requirement strings; an empty list is a confirmed
    /// zero-requirement release.
    Declared(Vec<String>),
    /// The index has no structured data; introspect the installed package.
    NeedsIntrospection,
}

/// One downloadable artifact of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseFile {
    pub filename: String,
    pub url: String,
    #[serde(rename = "packagetype")]
    pub package_type: String,
}

/// Per-release metadata returned by [`PyPiIndex::release_info`].
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    pub requires_python: Option<String>,
    pub requirements: ReleaseRequirements,
    /// Artifact listing, used by the materializer to prefer a prebuilt wheel.
    pub files: Vec<ReleaseFile>,
}

/// Client for the PyPI JSON API.
///
/// # Examples
///
/// ```no_run
/// # use depot_pypi::PyPiIndex;
/// # use depot_core::HttpCache;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() {
/// let index = PyPiIndex::new(Arc::new(HttpCache::new()));
/// let versions = index.list_versions("requests").await.unwrap();
/// assert!(!versions.is_empty());
/// # }
/// ```
#[derive(Clone)]
pub struct PyPiIndex {
    cache: Arc<HttpCache>,
    base_url: String,
}

impl PyPiIndex {
    /// Creates a client against the public PyPI API.
    pub fn new(cache: Arc<HttpCache>) -> Self {
        Self::with_base_url(cache, PYPI_BASE)
    }

    /// Creates a client against a custom base URL (test servers, mirrors).
    pub fn with_base_url(cache: Arc<HttpCache>, base_url: impl Into<String>) -> Self {
        Self {
            cache,
            base_url: base_url.into(),
        }
    }

    /// Fetches every version string the index lists for a package.
    ///
    /// The strings are returned raw; callers filter them through
    /// [`depot_core::Version::parse`], which silently drops malformed
    /// entries. Any network failure, non-2xx status, or malformed payload is
    /// a hard error.
    pub async fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let normalized = normalize_name(name);
        let url = format!("{}/{}/json", self.base_url, urlencoding::encode(&normalized));
        let data = self
            .cache
            .get(&url)
            .await
            .map_err(|e| PypiError::from_package_lookup(name, e))?;

        parse_version_listing(&normalized, &data)
    }

    /// Fetches structured metadata for one exact release.
    pub async fn release_info(&self, name: &str, version: &str) -> Result<ReleaseInfo> {
        let normalized = normalize_name(name);
        let url = format!(
            "{}/{}/{}/json",
            self.base_url,
            urlencoding::encode(&normalized),
            urlencoding::encode(version)
        );
        let data = self
            .cache
            .get(&url)
            .await
            .map_err(|e| PypiError::from_release_lookup(name, version, e))?;

        parse_release_info(&normalized, version, &data)
    }
}

// Wire types, private to this module.

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    releases: std::collections::HashMap<String, serde::de::IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    info: ReleaseInfoWire,
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Deserialize)]
struct ReleaseInfoWire {
    requires_python: Option<String>,
    requires_dist: Option<Vec<String>>,
}

fn parse_version_listing(package: &str, data: &[u8]) -> Result<Vec<String>> {
    let response: ProjectResponse = serde_json::from_slice(data).map_err(|e| {
        PypiError::Core(depot_core::DepotError::payload(package.to_string(), e))
    })?;

    Ok(response.releases.into_keys().collect())
}

fn parse_release_info(package: &str, version: &str, data: &[u8]) -> Result<ReleaseInfo> {
    let response: ReleaseResponse = serde_json::from_slice(data).map_err(|e| {
        PypiError::Core(depot_core::DepotError::payload(
            format!("{package} {version}"),
            e,
        ))
    })?;

    let requirements = match response.info.requires_dist {
        Some(reqs) => ReleaseRequirements::Declared(reqs),
        None => ReleaseRequirements::NeedsIntrospection,
    };

    Ok(ReleaseInfo {
        requires_python: response.info.requires_python,
        requirements,
        files: response.urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Foo_Bar"), "foo-bar");
        assert_eq!(normalize_name("Django"), "django");
        assert_eq!(normalize_name("typing_extensions"), "typing-extensions");
        assert_eq!(normalize_name("already-normal"), "already-normal");
    }

    #[test]
    fn test_parse_version_listing() {
        let json = r#"{
            "info": {"name": "requests"},
            "releases": {
                "2.28.0": [{"filename": "a"}],
                "2.28.1": [],
                "2.28.2": [{"filename": "b"}]
            }
        }"#;

        let mut versions = parse_version_listing("requests", json.as_bytes()).unwrap();
        versions.sort();
        assert_eq!(versions, vec!["2.28.0", "2.28.1", "2.28.2"]);
    }

    #[test]
    fn test_parse_version_listing_malformed() {
        let err = parse_version_listing("requests", b"{not json").unwrap_err();
        assert!(matches!(err, PypiError::Core(_)));
    }

    #[test]
    fn test_parse_release_info_declared() {
        let json = r#"{
            "info": {
                "requires_python": ">=3.8",
                "requires_dist": ["werkzeug>=3.0", "jinja2>=3.1.2"]
            },
            "urls": [
                {"filename": "flask-3.0.0-py3-none-any.whl",
                 "url": "https://files.example/flask-3.0.0-py3-none-any.whl",
                 "packagetype": "bdist_wheel"}
            ]
        }"#;

        let info = parse_release_info("flask", "3.0.0", json.as_bytes()).unwrap();
        assert_eq!(info.requires_python, Some(">=3.8".into()));
        assert_eq!(
            info.requirements,
            ReleaseRequirements::Declared(vec!["werkzeug>=3.0".into(), "jinja2>=3.1.2".into()])
        );
        assert_eq!(info.files.len(), 1);
        assert_eq!(info.files[0].package_type, "bdist_wheel");
    }

    #[test]
    fn test_parse_release_info_empty_is_confirmed_zero() {
        let json = r#"{"info": {"requires_python": null, "requires_dist": []}, "urls": []}"#;
        let info = parse_release_info("six", "1.16.0", json.as_bytes()).unwrap();
        assert_eq!(info.requirements, ReleaseRequirements::Declared(vec![]));
    }

    #[test]
    fn test_parse_release_info_null_needs_introspection() {
        let json = r#"{"info": {"requires_python": null, "requires_dist": null}, "urls": []}"#;
        let info = parse_release_info("oldpkg", "0.1", json.as_bytes()).unwrap();
        assert_eq!(info.requirements, ReleaseRequirements::NeedsIntrospection);
    }

    #[tokio::test]
    async fn test_list_versions_over_http() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/pypi/flask/json")
            .with_status(200)
            .with_body(r#"{"releases": {"2.3.0": [], "3.0.0": []}}"#)
            .create_async()
            .await;

        let index = PyPiIndex::with_base_url(
            Arc::new(HttpCache::new()),
            format!("{}/pypi", server.url()),
        );
        let mut versions = index.list_versions("Flask").await.unwrap();
        versions.sort();
        assert_eq!(versions, vec!["2.3.0", "3.0.0"]);
    }

    #[tokio::test]
    async fn test_list_versions_404_is_package_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/pypi/no-such-pkg/json")
            .with_status(404)
            .create_async()
            .await;

        let index = PyPiIndex::with_base_url(
            Arc::new(HttpCache::new()),
            format!("{}/pypi", server.url()),
        );
        let err = index.list_versions("no_such_pkg").await.unwrap_err();
        assert!(matches!(err, PypiError::PackageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_release_info_404_is_release_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/pypi/flask/9.9.9/json")
            .with_status(404)
            .create_async()
            .await;

        let index = PyPiIndex::with_base_url(
            Arc::new(HttpCache::new()),
            format!("{}/pypi", server.url()),
        );
        let err = index.release_info("flask", "9.9.9").await.unwrap_err();
        assert!(matches!(err, PypiError::ReleaseNotFound { .. }));
    }
}
