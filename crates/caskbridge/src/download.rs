//! # Download Reconstructor
//!
//! Materializes one file's full content as a contiguous buffer for the host
//! to save. The whole file lives in memory while the host consumes it, so
//! entries above [`MAX_FILE_BYTES`] are refused up front, before a single
//! block is fetched.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use caskrepo::filter::PathFilter;
use caskrepo::repo;
use caskrepo::repo::Repository;
use caskrepo::repo::RevisionId;

/// Largest file the reconstructor will materialize.
pub const MAX_FILE_BYTES: u64 = 64 << 20;

#[derive(Debug)]
pub enum Error {
    /// The path token was not valid base64 (or not valid UTF-8 once
    /// decoded). A caller error, distinct from not-found.
    BadPathToken(String),
    /// The filtered snapshot contained no entry for the path.
    NotFound(String),
    /// The entry's declared size exceeds [`MAX_FILE_BYTES`].
    TooLarge { path: String, size: u64 },
    /// Directories and symlinks are not downloadable.
    NotAFile(String),
    /// The repository collaborator failed.
    Repo(repo::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPathToken(msg) => write!(f, "invalid path token: {}", msg),
            Self::NotFound(path) => write!(f, "file not found: {}", path),
            Self::TooLarge { path, size } => write!(
                f,
                "file too large: {} is {} bytes (limit {})",
                path, size, MAX_FILE_BYTES
            ),
            Self::NotAFile(path) => write!(f, "not a regular file: {}", path),
            Self::Repo(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<repo::Error> for Error {
    fn from(e: repo::Error) -> Self {
        Self::Repo(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A reconstructed file: its full content plus the name to save it under.
#[derive(Clone, Debug)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub name: String,
}

/// Resolves `path_token` (base64) in `revision` (empty means head) and
/// concatenates the entry's blocks into one buffer.
pub async fn fetch_file(
    repo: &dyn Repository,
    path_token: &str,
    revision: &str,
) -> Result<Download> {
    let raw = STANDARD
        .decode(path_token)
        .map_err(|e| Error::BadPathToken(e.to_string()))?;
    let path = String::from_utf8(raw).map_err(|e| Error::BadPathToken(e.to_string()))?;

    let revision = if revision.is_empty() {
        repo.head().await?
    } else {
        RevisionId(revision.to_string())
    };

    debug!(%path, %revision, "reconstructing file");

    let mut reader = repo
        .open_reader(&revision, PathFilter::single(path.clone()))
        .await?;
    let entry = match reader.next_entry().await? {
        Some(entry) => entry,
        None => return Err(Error::NotFound(path)),
    };

    if entry.size > MAX_FILE_BYTES {
        return Err(Error::TooLarge {
            path,
            size: entry.size,
        });
    }
    if !entry.mode.is_file() {
        return Err(Error::NotAFile(path));
    }

    // Sized from the declared total as an allocation hint; actual length is
    // whatever the blocks yield. Mismatches are the collaborator's
    // integrity domain.
    let mut bytes = Vec::with_capacity(entry.size as usize);
    for block in &entry.blocks {
        let chunk = repo.read_block(block).await?;
        bytes.extend_from_slice(&chunk);
    }

    let name = entry.base_name().to_string();
    Ok(Download { bytes, name })
}
