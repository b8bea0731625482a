//! Core types for deploy planning

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Canonical path of the site entry document
pub const HOMEPAGE_PATH: &str = "./index.html";

/// Default name of the manifest file, locally and in the bucket
pub const DEFAULT_MANIFEST_NAME: &str = ".checksums";

/// A deduplicated set of relative paths
///
/// Backed by a `BTreeSet` so iteration is always sorted and reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathSet(BTreeSet<String>);

impl PathSet {
    /// Create an empty path set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path, returning false if it was already present
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.0.insert(path.into())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate paths in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Check whether two sets share no path
    pub fn is_disjoint(&self, other: &PathSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Merge another set into this one
    pub fn extend_from(&mut self, other: &PathSet) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl<S: Into<String>> FromIterator<S> for PathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for PathSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Remote operation a stage performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Upload,
    Delete,
    Sync,
    SetAcl,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Upload => write!(f, "upload"),
            Operation::Delete => write!(f, "delete"),
            Operation::Sync => write!(f, "sync"),
            Operation::SetAcl => write!(f, "set-acl"),
        }
    }
}

/// Ordering class of the paths a stage touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathClass {
    /// Anything that is not an HTML document
    Assets,
    /// HTML documents other than the homepage
    Pages,
    /// The root `index.html`
    Homepage,
    /// The checksum manifest itself
    Manifest,
    /// The whole site tree
    All,
}

impl fmt::Display for PathClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathClass::Assets => write!(f, "assets"),
            PathClass::Pages => write!(f, "pages"),
            PathClass::Homepage => write!(f, "homepage"),
            PathClass::Manifest => write!(f, "manifest"),
            PathClass::All => write!(f, "all"),
        }
    }
}

/// Which part of the ordering policy emitted a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageGroup {
    /// Paths that did not exist remotely
    New,
    /// Paths whose content hash changed
    Updated,
    /// Paths no longer present locally
    Removed,
    /// Full deploy without a baseline manifest
    Full,
    /// Manifest upload and ACL tightening
    Commit,
}

impl fmt::Display for StageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageGroup::New => write!(f, "new"),
            StageGroup::Updated => write!(f, "updated"),
            StageGroup::Removed => write!(f, "removed"),
            StageGroup::Full => write!(f, "full"),
            StageGroup::Commit => write!(f, "commit"),
        }
    }
}

/// Filter applied to the site tree by tree-sourced stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeFilter {
    /// Every file except `*.html`
    NonHtml,
    /// Only `*.html`
    Html,
    /// Every file
    All,
}

impl TreeFilter {
    /// Check whether a relative path passes this filter
    pub fn matches(&self, path: &str) -> bool {
        match self {
            TreeFilter::NonHtml => !path.ends_with(".html"),
            TreeFilter::Html => path.ends_with(".html"),
            TreeFilter::All => true,
        }
    }
}

/// Where a stage takes its paths from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Exactly these relative paths
    Paths(PathSet),
    /// Every file under the site root matching the filter
    Tree(TreeFilter),
}

impl Source {
    /// Number of explicitly listed paths (0 for tree sources)
    pub fn path_count(&self) -> usize {
        match self {
            Source::Paths(paths) => paths.len(),
            Source::Tree(_) => 0,
        }
    }

    pub fn paths(&self) -> Option<&PathSet> {
        match self {
            Source::Paths(paths) => Some(paths),
            Source::Tree(_) => None,
        }
    }
}

/// One planned unit of remote work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub operation: Operation,
    pub class: PathClass,
    pub group: StageGroup,
    pub source: Source,
    pub recursive: bool,
}

impl Stage {
    /// Upload an explicit set of paths
    pub fn upload(group: StageGroup, class: PathClass, paths: PathSet) -> Self {
        Self {
            operation: Operation::Upload,
            class,
            group,
            source: Source::Paths(paths),
            recursive: true,
        }
    }

    /// Delete an explicit set of remote keys
    pub fn delete(class: PathClass, paths: PathSet) -> Self {
        Self {
            operation: Operation::Delete,
            class,
            group: StageGroup::Removed,
            source: Source::Paths(paths),
            recursive: false,
        }
    }

    /// Upload a filtered view of the whole tree
    pub fn upload_tree(class: PathClass, filter: TreeFilter) -> Self {
        Self {
            operation: Operation::Upload,
            class,
            group: StageGroup::Full,
            source: Source::Tree(filter),
            recursive: true,
        }
    }

    /// Mirror the whole tree, deleting remote keys missing locally
    pub fn mirror() -> Self {
        Self {
            operation: Operation::Sync,
            class: PathClass::All,
            group: StageGroup::Full,
            source: Source::Tree(TreeFilter::All),
            recursive: true,
        }
    }

    /// Short human-readable label, e.g. `upload new assets (3)`
    pub fn label(&self) -> String {
        match &self.source {
            Source::Paths(paths) => format!(
                "{} {} {} ({})",
                self.operation,
                self.group,
                self.class,
                paths.len()
            ),
            Source::Tree(_) => format!("{} {} {}", self.operation, self.group, self.class),
        }
    }
}

/// Whether a plan was diffed against a baseline manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanKind {
    Incremental,
    Full,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::Incremental => write!(f, "incremental"),
            PlanKind::Full => write!(f, "full"),
        }
    }
}

/// Object access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Acl {
    Public,
    Private,
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acl::Public => write!(f, "public"),
            Acl::Private => write!(f, "private"),
        }
    }
}

/// Where and how a plan is executed
#[derive(Debug, Clone)]
pub struct DeployTarget {
    /// Local site tree being deployed
    pub site_root: PathBuf,
    /// Scratch directory for this deploy; upload stages stage into subdirectories
    pub staging_dir: PathBuf,
    /// Glob patterns never sent by tree-sourced stages
    pub exclude: Vec<String>,
    /// Access level for uploaded site content
    pub acl: Acl,
    /// Report stages without touching any collaborator
    pub dry_run: bool,
}

impl DeployTarget {
    pub fn new(site_root: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_root: site_root.into(),
            staging_dir: staging_dir.into(),
            exclude: Vec::new(),
            acl: Acl::Public,
            dry_run: false,
        }
    }
}

/// Summary of an executed plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    /// Stages that ran to completion
    pub stages: usize,
    /// Listed paths uploaded
    pub uploaded: usize,
    /// Remote keys deleted
    pub deleted: usize,
    /// ACL changes applied
    pub acl_changes: usize,
    /// Tree-sourced uploads/syncs run
    pub tree_transfers: usize,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl ExecuteSummary {
    /// Total listed paths touched remotely
    pub fn total_paths(&self) -> usize {
        self.uploaded + self.deleted
    }

    /// Record a completed stage
    pub fn add_stage(&mut self, stage: &Stage) {
        self.stages += 1;
        match (stage.operation, &stage.source) {
            (Operation::Upload, Source::Paths(paths)) => self.uploaded += paths.len(),
            (Operation::Delete, Source::Paths(paths)) => self.deleted += paths.len(),
            (Operation::SetAcl, Source::Paths(paths)) => self.acl_changes += paths.len(),
            (_, Source::Tree(_)) => self.tree_transfers += 1,
            (Operation::Sync, Source::Paths(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_set_is_sorted_and_deduplicated() {
        let set: PathSet = ["./b.css", "./a.css", "./b.css"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["./a.css", "./b.css"]);
    }

    #[test]
    fn test_stage_label() {
        let paths: PathSet = ["./a.css", "./b.js"].into_iter().collect();
        let stage = Stage::upload(StageGroup::New, PathClass::Assets, paths);
        assert_eq!(stage.label(), "upload new assets (2)");
        assert_eq!(Stage::mirror().label(), "sync full all");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        let paths: PathSet = ["./a.css", "./b.js"].into_iter().collect();
        summary.add_stage(&Stage::upload(StageGroup::New, PathClass::Assets, paths.clone()));
        summary.add_stage(&Stage::delete(PathClass::Assets, paths));
        summary.add_stage(&Stage::mirror());
        assert_eq!(summary.stages, 3);
        assert_eq!(summary.uploaded, 2);
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.tree_transfers, 1);
        assert_eq!(summary.total_paths(), 4);
    }

    #[test]
    fn test_tree_filter_matches() {
        assert!(TreeFilter::NonHtml.matches("./a.css"));
        assert!(!TreeFilter::NonHtml.matches("./a.html"));
        assert!(TreeFilter::Html.matches("./docs/a.html"));
        assert!(!TreeFilter::Html.matches("./a.htm"));
        assert!(TreeFilter::All.matches("./anything"));
    }
}
