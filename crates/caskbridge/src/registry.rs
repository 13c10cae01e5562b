//! # Repository Registry
//!
//! Owns the mapping from small integer handles to open repository instances.
//! The host cannot hold a native reference to backend state, so every opened
//! repository is parked here and addressed by a [`RepoId`] that crosses the
//! boundary as a plain number.
//!
//! Uses DashMap for concurrent access without global locking; id allocation
//! is a single atomic increment, so overlapping opens always receive
//! distinct, monotonically increasing handles. There is no removal: handles
//! live for the process lifetime.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;

use caskrepo::repo::Repository;

/// Opaque handle to an open repository.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct RepoId(pub u64);

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum Error {
    UnknownHandle(RepoId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandle(id) => write!(f, "invalid repository handle: {}", id),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// The handle table. Insert-only; reads and inserts may interleave freely.
pub struct Registry {
    repos: DashMap<RepoId, Arc<dyn Repository>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            repos: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Parks a repository and returns its freshly allocated handle.
    pub fn insert(&self, repo: Arc<dyn Repository>) -> RepoId {
        let id = RepoId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.repos.insert(id, repo);
        id
    }

    /// Dereferences a handle. Unknown handles are a reported error, never a
    /// panic.
    pub fn get(&self, id: RepoId) -> Result<Arc<dyn Repository>> {
        self.repos
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::UnknownHandle(id))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
