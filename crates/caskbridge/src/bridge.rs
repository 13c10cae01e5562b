//! # Bridge Facade
//!
//! The four host-callable operations. Each returns a [`Deferred`]
//! immediately and runs its work on a spawned backend task, so the host's
//! single thread only ever suspends at the deferred boundary.
//!
//! Operations on different handles overlap freely. Operations on the same
//! handle are not serialized here; if the repository engine needs
//! exclusivity somewhere, that is its own contract.

use std::sync::Arc;

use tracing::debug;

use caskrepo::repo::RepositoryOpener;
use caskrepo::transport::Transport;

use crate::defer::Deferred;
use crate::defer::spawn_bridged;
use crate::download;
use crate::download::Download;
use crate::listing;
use crate::registry::Registry;
use crate::registry::RepoId;

pub struct Bridge {
    registry: Arc<Registry>,
    opener: Arc<dyn RepositoryOpener>,
    transport: Arc<dyn Transport>,
}

impl Bridge {
    /// Assembles a bridge from the engine's opener and a transport for it to
    /// reach the storage server through.
    pub fn new(opener: Arc<dyn RepositoryOpener>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            opener,
            transport,
        }
    }

    /// Opens and authenticates a repository; resolves to its handle.
    pub fn open(&self, uri: String, passphrase: String) -> Deferred<RepoId> {
        let opener = Arc::clone(&self.opener);
        let transport = Arc::clone(&self.transport);
        let registry = Arc::clone(&self.registry);
        spawn_bridged(async move {
            debug!(%uri, "opening repository");
            let repo = opener.open(transport, &uri, &passphrase).await?;
            Ok(registry.insert(repo))
        })
    }

    /// Resolves to the head revision's identifier.
    pub fn head(&self, handle: RepoId) -> Deferred<String> {
        let registry = Arc::clone(&self.registry);
        spawn_bridged(async move {
            let repo = registry.get(handle)?;
            let head = repo.head().await?;
            Ok(head.0)
        })
    }

    /// Resolves to a markup table-row fragment listing the head revision,
    /// minus entries matched by the comma-separated exclusion list.
    pub fn list(&self, handle: RepoId, excludes: String) -> Deferred<String> {
        let registry = Arc::clone(&self.registry);
        spawn_bridged(async move {
            debug!(%handle, %excludes, "listing repository");
            let repo = registry.get(handle)?;
            let rows = listing::render_listing(repo.as_ref(), &excludes).await?;
            Ok(rows)
        })
    }

    /// Resolves to one reconstructed file (content plus base name).
    /// `revision` is taken verbatim; empty means head.
    pub fn read_file(
        &self,
        handle: RepoId,
        path_token: String,
        revision: String,
    ) -> Deferred<Download> {
        let registry = Arc::clone(&self.registry);
        spawn_bridged(async move {
            let repo = registry.get(handle)?;
            let file = download::fetch_file(repo.as_ref(), &path_token, &revision).await?;
            Ok(file)
        })
    }
}
