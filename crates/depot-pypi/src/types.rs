use depot_core::DependencyRecord;
use serde::Serialize;

/// A fully resolved package version: the cached record together with its
/// requirement rows, in insertion order.
///
/// This is the value handed to the outward HTTP/serialization layer, which
/// lives outside this workspace; it serializes with serde so that layer only
/// needs to pick a format.
///
/// # Examples
///
/// ```
/// use depot_pypi::ResolvedDependency;
///
/// let dep = ResolvedDependency {
///     name: "flask".into(),
///     version: "3.0.0".into(),
///     requires_python: Some(">=3.8".into()),
///     requirements: vec!["werkzeug>=3.0".into(), "jinja2>=3.1.2".into()],
/// };
///
/// let json = serde_json::to_value(&dep).unwrap();
/// assert_eq!(json["version"], "3.0.0");
/// assert_eq!(json["requirements"].as_array().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub name: String,
    /// Exact version string as the index lists it, modifiers preserved.
    pub version: String,
    pub requires_python: Option<String>,
    /// Raw declared requirement specifiers, stored and returned verbatim;
    /// parsing constraint syntax is the consumer's concern.
    pub requirements: Vec<String>,
}

impl ResolvedDependency {
    /// Assembles the outward value from a completed record and its rows.
    pub fn from_record(record: DependencyRecord, requirements: Vec<String>) -> Self {
        Self {
            name: record.name,
            version: record.version,
            requires_python: record.requires_python,
            requirements,
        }
    }
}
