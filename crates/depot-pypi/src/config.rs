use crate::registry::PYPI_BASE;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the [`crate::Resolver`].
///
/// All fields default to values suitable for the public index, so an empty
/// JSON object (or [`ResolverConfig::default`]) yields a working setup.
///
/// # Examples
///
/// ```
/// use depot_pypi::ResolverConfig;
///
/// let json = r#"{"install_timeout_secs": 300}"#;
/// let config: ResolverConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.install_timeout_secs, 300);
/// assert_eq!(config.index_url, "https://pypi.org/pypi");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the index JSON API.
    #[serde(default = "default_index_url")]
    pub index_url: String,
    /// Timeout for artifact downloads, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for the fallback installer subprocess, in seconds. Installs
    /// can build from source, so this is deliberately generous.
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,
    /// Interpreter used to run `-m pip` for the fallback install.
    #[serde(default = "default_python_program")]
    pub python_program: String,
}

impl ResolverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            request_timeout_secs: default_request_timeout(),
            install_timeout_secs: default_install_timeout(),
            python_program: default_python_program(),
        }
    }
}

fn default_index_url() -> String {
    PYPI_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_install_timeout() -> u64 {
    120
}

fn default_python_program() -> String {
    "python3".to_string()
}
