//! Path filters restricting which entries a listing or read considers.
//!
//! A filter is either an inclusion set or an exclusion set, built per call
//! and never persisted. Inclusion patterns name exact paths (the download
//! path selects precisely one file). Exclusion patterns are looser: a pattern
//! knocks out a path when it equals the path, is a directory prefix of it, or
//! equals any slash-separated component (so `.git` excludes every `.git`
//! directory in the tree).

/// Which entries an operation considers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathFilter {
    /// No restriction; every entry passes.
    All,
    /// Only the named paths pass, matched exactly.
    Include(Vec<String>),
    /// Every entry passes except those matched by a pattern.
    Exclude(Vec<String>),
}

impl PathFilter {
    /// Builds an exclusion filter from a comma-separated pattern list.
    /// An empty string (or one that is all separators) means no filter.
    pub fn from_excludes(list: &str) -> Self {
        let patterns: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if patterns.is_empty() {
            Self::All
        } else {
            Self::Exclude(patterns)
        }
    }

    /// An inclusion filter selecting exactly one path.
    pub fn single(path: impl Into<String>) -> Self {
        Self::Include(vec![path.into()])
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::All => true,
            Self::Include(paths) => paths.iter().any(|p| p == path),
            Self::Exclude(patterns) => !patterns.iter().any(|p| excludes(p, path)),
        }
    }
}

fn excludes(pattern: &str, path: &str) -> bool {
    if path == pattern {
        return true;
    }
    // directory prefix: `docs` excludes `docs/guide.md`
    if let Some(rest) = path.strip_prefix(pattern) {
        if rest.starts_with('/') {
            return true;
        }
    }
    // component anywhere: `.git` excludes `src/.git/config`
    path.split('/').any(|component| component == pattern)
}
