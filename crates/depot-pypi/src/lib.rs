//! PyPI dependency-metadata resolution and caching for depot.
//!
//! Given a package name and a version (or version range), this crate returns
//! the release's declared requirement strings, persisting results through a
//! [`depot_core::Store`] so repeated lookups cost nothing upstream. It backs
//! a package-manager client that needs declared-dependency data for many
//! (name, version) pairs; actual constraint solving stays with that client.
//!
//! # Architecture
//!
//! - **Registry** ([`PyPiIndex`]): PyPI JSON API client behind the shared
//!   conditional-GET HTTP cache; version listings and per-release metadata.
//! - **Materializer** ([`materialize::Materializer`]): brings one release's
//!   files into a per-request scratch directory, preferring a prebuilt wheel
//!   and falling back to the general installer.
//! - **Metadata extractor** ([`metadata::extract`]): reads `Requires-Dist`
//!   lines out of the installed dist-info, probing name-spelling variants.
//! - **Resolver** ([`Resolver`]): the orchestrator; per-version it trusts a
//!   complete cached record, repairs an interrupted one, or populates a new
//!   one via index data or local introspection, marking it complete only
//!   once every requirement row is written.
//!
//! # Examples
//!
//! ```no_run
//! use depot_core::MemoryStore;
//! use depot_pypi::{Resolver, ResolverConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> depot_pypi::Result<()> {
//! let resolver = Resolver::new(Arc::new(MemoryStore::new()), ResolverConfig::default());
//!
//! // First call populates the cache; the second is a pure cache hit.
//! let deps = resolver.get_one("requests", "2.28.2").await?;
//! let again = resolver.get_one("requests", "2.28.2").await?;
//! assert_eq!(deps, again);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod materialize;
pub mod metadata;
pub mod registry;
pub mod resolver;
pub mod types;

pub use config::ResolverConfig;
pub use error::{PypiError, Result};
pub use metadata::ExtractOutcome;
pub use registry::{PyPiIndex, ReleaseFile, ReleaseInfo, ReleaseRequirements, normalize_name};
pub use resolver::Resolver;
pub use types::ResolvedDependency;
