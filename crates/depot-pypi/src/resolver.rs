//! The resolution and caching pipeline.
//!
//! [`Resolver`] decides, per requested (name, version), whether the cached
//! record is trustworthy, and if not reconstructs it through the fallback
//! chain: structured index data first, local introspection of the
//! materialized package second. Writes are idempotent (duplicate rows are
//! skipped) and a record only becomes trusted once its completeness flag is
//! set, so a crash mid-populate leaves a pending record that the next lookup
//! detects and repairs.

use crate::config::ResolverConfig;
use crate::error::{PypiError, Result};
use crate::materialize::Materializer;
use crate::metadata::{self, ExtractOutcome};
use crate::registry::{PyPiIndex, ReleaseRequirements, normalize_name};
use crate::types::ResolvedDependency;
use depot_core::{DepotError, HttpCache, Store, Version};
use std::collections::HashMap;
use std::sync::Arc;

/// Cache orchestrator over a [`Store`], the index client, and the
/// materializer.
///
/// # Examples
///
/// ```no_run
/// # use depot_pypi::{Resolver, ResolverConfig};
/// # use depot_core::MemoryStore;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> depot_pypi::Result<()> {
/// let resolver = Resolver::new(Arc::new(MemoryStore::new()), ResolverConfig::default());
///
/// // All cached versions of flask within a range, resolving misses on the fly.
/// let deps = resolver.get_range("flask", "2.0.0", "2.9.9").await?;
/// for dep in deps {
///     println!("{} {}: {} requirements", dep.name, dep.version, dep.requirements.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Resolver<S: Store> {
    store: Arc<S>,
    index: PyPiIndex,
    materializer: Materializer,
}

impl<S: Store> Resolver<S> {
    pub fn new(store: Arc<S>, config: ResolverConfig) -> Self {
        let cache = Arc::new(HttpCache::new());
        let index = PyPiIndex::with_base_url(cache, config.index_url.clone());
        let materializer = Materializer::new(&config);

        Self {
            store,
            index,
            materializer,
        }
    }

    /// Resolves an explicit list of versions for one package.
    ///
    /// Results keep the requested order. A version whose population fails is
    /// skipped with a diagnostic rather than aborting the batch, so partial
    /// results are returned.
    pub async fn resolve(&self, name: &str, versions: &[String]) -> Result<Vec<ResolvedDependency>> {
        let name = normalize_name(name);
        self.resolve_batch(&name, versions, false).await
    }

    /// Resolves every version the index lists for a package.
    ///
    /// One call collects and caches requirement data the index would
    /// otherwise need one request per version for; the first call on a
    /// package with many uncached versions can take a while.
    pub async fn get_all(&self, name: &str) -> Result<Vec<ResolvedDependency>> {
        self.get_filtered(name, None, None, false).await
    }

    /// Resolves the versions matching one exact point on the version line.
    ///
    /// Because comparison ignores modifiers, `1.2.3` also matches `1.2.3a1`.
    /// Unlike the batch endpoints, a population failure here surfaces
    /// directly.
    pub async fn get_one(&self, name: &str, version: &str) -> Result<Vec<ResolvedDependency>> {
        let point = Version::parse(version);
        self.get_filtered(name, point.clone(), point, true).await
    }

    /// Resolves all versions at or above `version`.
    pub async fn get_gte(&self, name: &str, version: &str) -> Result<Vec<ResolvedDependency>> {
        self.get_filtered(name, Version::parse(version), None, false).await
    }

    /// Resolves all versions at or below `version`.
    pub async fn get_lte(&self, name: &str, version: &str) -> Result<Vec<ResolvedDependency>> {
        self.get_filtered(name, None, Version::parse(version), false).await
    }

    /// Resolves all versions within `[min, max]`, bounds inclusive.
    pub async fn get_range(
        &self,
        name: &str,
        min: &str,
        max: &str,
    ) -> Result<Vec<ResolvedDependency>> {
        self.get_filtered(name, Version::parse(min), Version::parse(max), false)
            .await
    }

    /// Bulk resolution: caller supplies exact versions per package, so no
    /// index listing is consulted. Failures for one package's versions do
    /// not affect the others.
    pub async fn multiple(
        &self,
        packages: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<ResolvedDependency>> {
        let mut results = Vec::new();
        for (name, versions) in packages {
            let name = normalize_name(name);
            results.extend(self.resolve_batch(&name, versions, false).await?);
        }
        Ok(results)
    }

    /// Lists the package's versions from the index and resolves those within
    /// the bounds. An unparseable bound behaves as unbounded, matching the
    /// listing filter itself, where malformed entries are silently dropped.
    async fn get_filtered(
        &self,
        name: &str,
        min: Option<Version>,
        max: Option<Version>,
        strict: bool,
    ) -> Result<Vec<ResolvedDependency>> {
        let name = normalize_name(name);
        // list_versions failure is fatal for the whole call; without the
        // listing there is no meaningful partial answer.
        let listed = self.index.list_versions(&name).await?;
        let selected = filter_versions(listed, min.as_ref(), max.as_ref());
        self.resolve_batch(&name, &selected, strict).await
    }

    async fn resolve_batch(
        &self,
        name: &str,
        versions: &[String],
        strict: bool,
    ) -> Result<Vec<ResolvedDependency>> {
        let mut results = Vec::with_capacity(versions.len());
        for version in versions {
            match self.resolve_one(name, version).await {
                Ok(dep) => results.push(dep),
                Err(e) if strict => return Err(e),
                Err(e) => {
                    tracing::warn!("skipping {name} {version}: {e}");
                }
            }
        }
        Ok(results)
    }

    /// The per-version state machine.
    async fn resolve_one(&self, name: &str, version: &str) -> Result<ResolvedDependency> {
        let (record, created) = self.store.get_or_create(name, version).await?;

        if record.reqs_complete {
            tracing::debug!("cache hit for {name} {version}");
            return self.assemble(name, version).await;
        }

        if !created {
            // A pending row from another writer or an interrupted prior
            // attempt; re-derive rather than trust it.
            tracing::debug!("repairing incomplete record for {name} {version}");
        }

        self.populate(name, version).await?;
        tracing::info!("cached {name} {version}");
        self.assemble(name, version).await
    }

    /// Collects the requirement set via the fallback chain and completes the
    /// record.
    async fn populate(&self, name: &str, version: &str) -> Result<()> {
        let info = self.index.release_info(name, version).await?;

        let requirements = match info.requirements {
            ReleaseRequirements::Declared(reqs) => reqs,
            ReleaseRequirements::NeedsIntrospection => {
                tracing::warn!(
                    "index has no structured requirements for {name} {version}, introspecting locally"
                );
                let scratch = self.materializer.materialize(name, version, &info.files).await?;
                let outcome = metadata::extract(name, version, scratch.path())?;
                // Scratch dropped below: cleanup happens whether or not
                // extraction found anything.
                match outcome {
                    ExtractOutcome::Found(reqs) => reqs,
                    ExtractOutcome::NoMetadata => {
                        // Policy decision: record as a confirmed-empty set so
                        // the lookup does not re-install on every access.
                        tracing::warn!(
                            "no metadata found for {name} {version}, recording empty requirement set"
                        );
                        Vec::new()
                    }
                }
            }
        };

        for data in &requirements {
            // Duplicates are expected under concurrent or retried writes.
            self.store.add_requirement(name, version, data).await?;
        }
        self.store
            .set_complete(name, version, info.requires_python)
            .await?;

        Ok(())
    }

    async fn assemble(&self, name: &str, version: &str) -> Result<ResolvedDependency> {
        let record = self
            .store
            .get(name, version)
            .await?
            .ok_or_else(|| DepotError::RecordNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
            .map_err(PypiError::Core)?;
        let requirements = self.store.list_requirements(name, version).await?;
        Ok(ResolvedDependency::from_record(record, requirements))
    }
}

/// Parses the listed version strings, drops malformed entries, keeps those
/// within the inclusive bounds, and orders the survivors ascending.
fn filter_versions(listed: Vec<String>, min: Option<&Version>, max: Option<&Version>) -> Vec<String> {
    let mut selected: Vec<(Version, String)> = listed
        .into_iter()
        .filter_map(|raw| Version::parse(&raw).map(|parsed| (parsed, raw)))
        .filter(|(parsed, _)| {
            min.is_none_or(|min| parsed >= min) && max.is_none_or(|max| parsed <= max)
        })
        .collect();

    selected.sort_by(|a, b| a.0.cmp(&b.0));
    selected.into_iter().map(|(_, raw)| raw).collect()
}
