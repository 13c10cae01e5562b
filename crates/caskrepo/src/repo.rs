//! # Repository Contract
//!
//! The interface the bridge consumes from the repository/storage engine.
//! The engine itself (encryption, revision graph, block format, the wire
//! protocol it speaks over its transport) is a collaborator; the bridge only
//! depends on the operations defined here.

use std::fmt;
use std::sync::Arc;

use crate::entry::FileEntry;
use crate::filter::PathFilter;
use crate::marker::MaybeSend;
use crate::marker::MaybeSync;
use crate::transport;
use crate::transport::Transport;

/// Identifier of an immutable revision of the file tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RevisionId(pub String);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one content block. A file's data is the ordered
/// concatenation of its blocks.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub String);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum Error {
    /// Wrong passphrase or access denied by the storage server.
    Auth(String),
    /// A revision, block, or other repository object does not exist.
    NotFound(String),
    /// The underlying transport failed.
    Transport(transport::Error),
    /// Any other engine-side failure, surfaced with its original message.
    Storage(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(msg) => write!(f, "authentication failed: {}", msg),
            Self::NotFound(what) => write!(f, "not found: {}", what),
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<transport::Error> for Error {
    fn from(e: transport::Error) -> Self {
        Self::Transport(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An open repository instance.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait Repository: fmt::Debug + MaybeSend + MaybeSync + 'static {
    /// Resolves the most recent revision.
    async fn head(&self) -> Result<RevisionId>;

    /// Reads one content block's bytes.
    async fn read_block(&self, id: &BlockId) -> Result<Vec<u8>>;

    /// Lists the entries of a revision that pass the filter.
    async fn list(&self, revision: &RevisionId, filter: &PathFilter) -> Result<Vec<FileEntry>>;

    /// Opens a snapshot reader scoped to the given revision and filter.
    async fn open_reader(
        &self,
        revision: &RevisionId,
        filter: PathFilter,
    ) -> Result<Box<dyn EntryReader>>;
}

/// Streams the entries of a snapshot that match a filter.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait EntryReader: MaybeSend {
    /// The next matching entry, or `None` once the snapshot is exhausted.
    ///
    /// # invariants
    /// - Exhaustion is signaled by `Ok(None)`, never by an error.
    /// - `Err` means the read itself failed and the reader is unusable.
    async fn next_entry(&mut self) -> Result<Option<FileEntry>>;
}

/// Opens and authenticates a repository over a transport.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait RepositoryOpener: MaybeSend + MaybeSync + 'static {
    async fn open(
        &self,
        transport: Arc<dyn Transport>,
        uri: &str,
        passphrase: &str,
    ) -> Result<Arc<dyn Repository>>;
}
