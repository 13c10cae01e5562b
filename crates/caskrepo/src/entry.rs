//! File entries as produced by the listing and snapshot collaborators.
//!
//! An entry describes one node of a revision's file tree: its path, Unix mode
//! bits, declared size, modification time, and the ordered content blocks its
//! data is split across. Entries are read-only from the bridge's perspective.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::repo::BlockId;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

/// What kind of tree node an entry is, derived from its mode bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// Unix mode/permission bits.
///
/// `Display` renders the conventional ten-column short form
/// (`-rw-r--r--`, `drwxr-xr-x`, ...).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FileMode(pub u32);

impl FileMode {
    /// Mode for a regular file with the given permission bits.
    pub fn regular(perm: u32) -> Self {
        Self(S_IFREG | (perm & 0o777))
    }

    /// Mode for a directory with the given permission bits.
    pub fn directory(perm: u32) -> Self {
        Self(S_IFDIR | (perm & 0o777))
    }

    /// Mode for a symbolic link with the given permission bits.
    pub fn symlink(perm: u32) -> Self {
        Self(S_IFLNK | (perm & 0o777))
    }

    pub fn kind(&self) -> EntryKind {
        match self.0 & S_IFMT {
            S_IFREG => EntryKind::File,
            S_IFDIR => EntryKind::Dir,
            S_IFLNK => EntryKind::Symlink,
            _ => EntryKind::Other,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind() == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == EntryKind::Dir
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind() {
            EntryKind::File => '-',
            EntryKind::Dir => 'd',
            EntryKind::Symlink => 'l',
            EntryKind::Other => '?',
        };
        write!(f, "{}", kind)?;
        for shift in [6, 3, 0] {
            let bits = (self.0 >> shift) & 0o7;
            write!(f, "{}", if bits & 0o4 != 0 { 'r' } else { '-' })?;
            write!(f, "{}", if bits & 0o2 != 0 { 'w' } else { '-' })?;
            write!(f, "{}", if bits & 0o1 != 0 { 'x' } else { '-' })?;
        }
        Ok(())
    }
}

/// One node of a revision's file tree.
#[derive(Clone, Debug)]
pub struct FileEntry {
    /// Forward-slash separated path, no leading slash.
    pub path: String,
    pub mode: FileMode,
    /// Declared total size in bytes; for regular files this equals the sum of
    /// the block lengths.
    pub size: u64,
    pub mtime: DateTime<Utc>,
    /// Content blocks in concatenation order. Empty for non-regular entries.
    pub blocks: Vec<BlockId>,
}

impl FileEntry {
    /// The path's final component.
    pub fn base_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(self.path.as_str())
    }
}
