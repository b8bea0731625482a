//! Snapshot of a site tree and its manifest text format
//!
//! A manifest is zero or more lines of `<hash><two spaces><path>`, the same
//! layout `sha1sum` and friends print:
//!
//! ```text
//! 3b18e512dba79e4c8300dd08aeb37f8e728b8dad  ./index.html
//! 0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33  ./css/site.css
//! ```

use std::collections::HashMap;

/// Separator between hash and path on a manifest line
const SEPARATOR: &str = "  ";

/// Immutable mapping from relative path to content hash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: HashMap<String, String>,
}

/// Outcome of a lenient parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Lines kept as entries
    pub parsed: usize,
    /// Non-blank lines dropped as malformed
    pub dropped: usize,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest text, silently dropping malformed lines
    pub fn parse(raw: &str) -> Self {
        Self::parse_with_report(raw).0
    }

    /// Parse raw manifest bytes; invalid UTF-8 is replaced, not rejected
    pub fn parse_bytes(raw: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(raw))
    }

    /// Parse manifest text and report how many lines were dropped
    pub fn parse_with_report(raw: &str) -> (Self, ParseReport) {
        let mut entries = HashMap::new();
        let mut report = ParseReport::default();

        for line in raw.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }

            match parse_line(line) {
                Some((hash, path)) => {
                    entries.insert(path.to_string(), hash.to_string());
                    report.parsed += 1;
                }
                None => report.dropped += 1,
            }
        }

        (Self { entries }, report)
    }

    /// Render as manifest text, one line per entry sorted by path
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (path, hash) in self.sorted() {
            out.push_str(hash);
            out.push_str(SEPARATOR);
            out.push_str(path);
            out.push('\n');
        }
        out
    }

    /// Hash recorded for a path
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, h)| (p.as_str(), h.as_str()))
    }

    /// Entries sorted by path
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Every path in the snapshot
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<P: Into<String>, H: Into<String>> FromIterator<(P, H)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (P, H)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(p, h)| (p.into(), h.into()))
                .collect(),
        }
    }
}

/// Split one line into (hash, path). Returns None for malformed lines.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (hash, path) = line.split_once(SEPARATOR)?;
    if hash.is_empty() || path.is_empty() {
        return None;
    }
    Some((hash, path))
}
