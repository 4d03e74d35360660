//! Persistent-store abstraction for cached dependency metadata.
//!
//! The real deployment backs this with a relational table keyed by
//! (name, version) plus a child table of requirement rows; that concern is
//! external to this workspace, so only the interface is fixed here. The
//! (name, version) uniqueness constraint is the sole concurrency-control
//! primitive: concurrent writers go through [`Store::get_or_create`], which
//! must be atomic, instead of a create-catch-conflict-refetch dance.
//!
//! [`MemoryStore`] is the in-process reference implementation used for
//! embedding and throughout the test suite.

use crate::error::{DepotError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;

/// A cached package version record.
///
/// `version` is stored exactly as the index listed it (pre-release suffixes
/// preserved); `name` is stored normalized, which callers must apply before
/// every read or write so spellings of one package converge on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version: String,
    /// Optional Python-version constraint declared by the release.
    pub requires_python: Option<String>,
    /// True only once the full requirement set has been durably written.
    /// A false value marks an interrupted prior attempt and means "treat as
    /// cache miss and re-derive".
    pub reqs_complete: bool,
}

/// Result of inserting a requirement row.
///
/// Duplicates are expected under concurrent or retried writes and are a
/// signal, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Duplicate,
}

/// Storage interface for dependency records and their requirement rows.
///
/// Implementations must uphold (name, version) uniqueness and
/// (record, data) uniqueness for requirement rows. All methods take the
/// already-normalized package name.
#[async_trait]
pub trait Store: Send + Sync {
    /// Looks up a record, returning `None` on a miss.
    async fn get(&self, name: &str, version: &str) -> Result<Option<DependencyRecord>>;

    /// Fetches the record, creating it in the pending state if absent.
    ///
    /// Atomic under the uniqueness constraint: two concurrent callers for
    /// the same new pair observe one row, with exactly one of them seeing
    /// `true` for the was-created flag.
    async fn get_or_create(&self, name: &str, version: &str) -> Result<(DependencyRecord, bool)>;

    /// Appends one requirement row, skipping silently when the (record,
    /// data) pair already exists.
    ///
    /// # Errors
    ///
    /// Returns [`DepotError::RecordNotFound`] when the owning record does
    /// not exist.
    async fn add_requirement(&self, name: &str, version: &str, data: &str) -> Result<AddOutcome>;

    /// Marks the record complete and stores its Python constraint, which is
    /// only known once the release payload has been read.
    async fn set_complete(
        &self,
        name: &str,
        version: &str,
        requires_python: Option<String>,
    ) -> Result<()>;

    /// Lists the record's requirement rows in insertion order.
    async fn list_requirements(&self, name: &str, version: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
struct StoredRecord {
    requires_python: Option<String>,
    reqs_complete: bool,
    requirements: Vec<String>,
}

/// DashMap-backed [`Store`] for embedding and tests.
///
/// # Examples
///
/// ```
/// # use depot_core::store::{MemoryStore, Store};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> depot_core::Result<()> {
/// let store = MemoryStore::new();
/// let (record, created) = store.get_or_create("flask", "3.0.0").await?;
/// assert!(created);
/// assert!(!record.reqs_complete);
///
/// let (_, created) = store.get_or_create("flask", "3.0.0").await?;
/// assert!(!created);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<(String, String), StoredRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn key(name: &str, version: &str) -> (String, String) {
        (name.to_string(), version.to_string())
    }

    fn to_record(name: &str, version: &str, stored: &StoredRecord) -> DependencyRecord {
        DependencyRecord {
            name: name.to_string(),
            version: version.to_string(),
            requires_python: stored.requires_python.clone(),
            reqs_complete: stored.reqs_complete,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, name: &str, version: &str) -> Result<Option<DependencyRecord>> {
        Ok(self
            .records
            .get(&Self::key(name, version))
            .map(|stored| Self::to_record(name, version, &stored)))
    }

    async fn get_or_create(&self, name: &str, version: &str) -> Result<(DependencyRecord, bool)> {
        // The entry API holds the shard lock across the check-then-insert,
        // which is what makes this atomic.
        match self.records.entry(Self::key(name, version)) {
            Entry::Occupied(occupied) => {
                Ok((Self::to_record(name, version, occupied.get()), false))
            }
            Entry::Vacant(vacant) => {
                let stored = vacant.insert(StoredRecord::default());
                Ok((Self::to_record(name, version, &stored), true))
            }
        }
    }

    async fn add_requirement(&self, name: &str, version: &str, data: &str) -> Result<AddOutcome> {
        let mut stored = self.records.get_mut(&Self::key(name, version)).ok_or_else(|| {
            DepotError::RecordNotFound {
                name: name.to_string(),
                version: version.to_string(),
            }
        })?;

        if stored.requirements.iter().any(|existing| existing == data) {
            return Ok(AddOutcome::Duplicate);
        }
        stored.requirements.push(data.to_string());
        Ok(AddOutcome::Inserted)
    }

    async fn set_complete(
        &self,
        name: &str,
        version: &str,
        requires_python: Option<String>,
    ) -> Result<()> {
        let mut stored = self.records.get_mut(&Self::key(name, version)).ok_or_else(|| {
            DepotError::RecordNotFound {
                name: name.to_string(),
                version: version.to_string(),
            }
        })?;

        stored.requires_python = requires_python;
        stored.reqs_complete = true;
        Ok(())
    }

    async fn list_requirements(&self, name: &str, version: &str) -> Result<Vec<String>> {
        let stored = self.records.get(&Self::key(name, version)).ok_or_else(|| {
            DepotError::RecordNotFound {
                name: name.to_string(),
                version: version.to_string(),
            }
        })?;

        Ok(stored.requirements.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_miss() {
        let store = MemoryStore::new();
        assert_eq!(store.get("flask", "3.0.0").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_or_create_pending() {
        let store = MemoryStore::new();
        let (record, created) = store.get_or_create("flask", "3.0.0").await.unwrap();

        assert!(created);
        assert_eq!(record.name, "flask");
        assert_eq!(record.version, "3.0.0");
        assert!(!record.reqs_complete);
        assert_eq!(record.requires_python, None);
    }

    #[tokio::test]
    async fn test_get_or_create_existing() {
        let store = MemoryStore::new();
        store.get_or_create("flask", "3.0.0").await.unwrap();
        let (_, created) = store.get_or_create("flask", "3.0.0").await.unwrap();
        assert!(!created);
    }

    #[tokio::test]
    async fn test_add_requirement_and_duplicate_skip() {
        let store = MemoryStore::new();
        store.get_or_create("flask", "3.0.0").await.unwrap();

        let outcome = store
            .add_requirement("flask", "3.0.0", "werkzeug>=3.0")
            .await
            .unwrap();
        assert_eq!(outcome, AddOutcome::Inserted);

        let outcome = store
            .add_requirement("flask", "3.0.0", "werkzeug>=3.0")
            .await
            .unwrap();
        assert_eq!(outcome, AddOutcome::Duplicate);

        let reqs = store.list_requirements("flask", "3.0.0").await.unwrap();
        assert_eq!(reqs, vec!["werkzeug>=3.0"]);
    }

    #[tokio::test]
    async fn test_add_requirement_without_record() {
        let store = MemoryStore::new();
        let err = store
            .add_requirement("flask", "3.0.0", "werkzeug>=3.0")
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_complete_records_constraint() {
        let store = MemoryStore::new();
        store.get_or_create("flask", "3.0.0").await.unwrap();
        store
            .set_complete("flask", "3.0.0", Some(">=3.8".into()))
            .await
            .unwrap();

        let record = store.get("flask", "3.0.0").await.unwrap().unwrap();
        assert!(record.reqs_complete);
        assert_eq!(record.requires_python, Some(">=3.8".into()));
    }

    #[tokio::test]
    async fn test_requirements_keep_insertion_order() {
        let store = MemoryStore::new();
        store.get_or_create("django", "4.2.0").await.unwrap();
        for data in ["asgiref>=3.6", "sqlparse>=0.3.1", "tzdata; sys_platform == 'win32'"] {
            store.add_requirement("django", "4.2.0", data).await.unwrap();
        }

        let reqs = store.list_requirements("django", "4.2.0").await.unwrap();
        assert_eq!(
            reqs,
            vec![
                "asgiref>=3.6",
                "sqlparse>=0.3.1",
                "tzdata; sys_platform == 'win32'"
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_single_row() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.get_or_create("numpy", "1.26.0").await.unwrap().1
            }));
        }

        let mut created_count = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created_count += 1;
            }
        }

        assert_eq!(created_count, 1);
        assert_eq!(store.records.len(), 1);
    }
}
