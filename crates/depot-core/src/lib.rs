//! Core abstractions for depot, a caching dependency-metadata proxy.
//!
//! This crate holds the pieces shared by every ecosystem implementation:
//!
//! - **Errors**: [`DepotError`] and the workspace-wide [`Result`] alias
//! - **HTTP cache**: [`HttpCache`], conditional-GET revalidation for index
//!   traffic
//! - **Store**: the [`store::Store`] trait over the persistent cache of
//!   dependency records, plus the in-memory [`store::MemoryStore`]
//! - **Versions**: the simplified [`Version`] value used for range filtering
//!
//! The store is deliberately an interface: production deployments back it
//! with a relational database, which lives outside this workspace. Everything
//! in depot-core is transport-agnostic; the HTTP/JSON surface consuming it is
//! equally external.
//!
//! # Examples
//!
//! Filtering index versions with the simplified order:
//!
//! ```
//! use depot_core::Version;
//!
//! let listed = ["1.0.0", "1.5.0", "2.0.0", "broken"];
//! let min = Version::parse("1.0.0").unwrap();
//! let max = Version::parse("1.9.9").unwrap();
//!
//! let in_range: Vec<&str> = listed
//!     .iter()
//!     .filter(|s| {
//!         Version::parse(s).is_some_and(|v| v >= min && v <= max)
//!     })
//!     .copied()
//!     .collect();
//!
//! assert_eq!(in_range, vec!["1.0.0", "1.5.0"]);
//! ```

pub mod cache;
pub mod error;
pub mod store;
pub mod version;

pub use cache::HttpCache;
pub use error::{DepotError, Result};
pub use store::{AddOutcome, DependencyRecord, MemoryStore, Store};
pub use version::Version;
