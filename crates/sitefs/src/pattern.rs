//! Glob-based exclusion of site paths

use crate::error::{Error, Result};
use glob::Pattern;

/// A compiled list of exclude patterns
///
/// Patterns are matched against the path relative to the site root without
/// the leading `./` (e.g. `drafts/post.html`). As with `s3cmd --exclude`,
/// `*` also matches `/`, so `*.bak` excludes backups at any depth.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compile a list of glob patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p.trim_start_matches("./")).map_err(|e| Error::InvalidPattern {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Check whether a relative path (with or without `./`) is excluded
    pub fn is_excluded(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./");
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Render a relative filesystem path as a manifest key (`./a/b.css`)
pub fn manifest_key(rel: &std::path::Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    format!("./{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_exclude_matching() {
        let set = ExcludeSet::new(&["drafts/*", "*.bak", ".checksums"]).unwrap();
        assert!(set.is_excluded("./drafts/post.html"));
        assert!(set.is_excluded("./deep/dir/file.bak"));
        assert!(set.is_excluded("./.checksums"));
        assert!(set.is_excluded(".checksums"));
        assert!(!set.is_excluded("./sub/.checksums"));
        assert!(!set.is_excluded("./index.html"));
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let set = ExcludeSet::new::<&str>(&[]).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_excluded("./anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExcludeSet::new(&["[unclosed"]).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_manifest_key() {
        assert_eq!(manifest_key(Path::new("a/b.css")), "./a/b.css");
        assert_eq!(manifest_key(Path::new("index.html")), "./index.html");
    }
}
