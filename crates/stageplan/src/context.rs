//! Collaborator traits used by the stage executor
//!
//! These traits allow the planner crate to run deploys without depending
//! on a particular object store client, file copier or UI.

use crate::types::{Acl, PathSet, Stage, TreeFilter};
use anyhow::Result;
use std::path::Path;

/// Options for a recursive copy into the bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Glob patterns to skip
    pub exclude: Vec<String>,
    /// Glob patterns re-admitted after `exclude`
    pub include: Vec<String>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Access level for uploaded objects
    pub acl: Option<Acl>,
}

/// Options for a mirror sync into the bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Delete remote keys that are missing locally
    pub delete: bool,
    /// Glob patterns neither uploaded nor deleted
    pub exclude: Vec<String>,
    /// Access level for uploaded objects
    pub acl: Option<Acl>,
}

/// Remote object store holding the deployed site
///
/// Keys are relative site paths (`./css/site.css`); implementations map
/// them onto their bucket and prefix.
pub trait ObjectStore {
    /// Copy the contents of a local directory into the bucket root
    fn copy(&self, source: &Path, options: &CopyOptions) -> Result<()>;

    /// Remove objects by key
    fn remove(&self, keys: &PathSet, recursive: bool) -> Result<()>;

    /// Make the bucket mirror a local directory
    fn sync(&self, source: &Path, options: &SyncOptions) -> Result<()>;

    /// Change the access level of one object
    fn set_acl(&self, key: &str, acl: Acl) -> Result<()>;

    /// Fetch an object's contents, `None` if it does not exist
    fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Copies files into an isolated staging directory
pub trait FileStager {
    /// Copy exactly `paths` (relative to `source_root`) into `dest_dir`,
    /// preserving their relative layout. Fails if any path cannot be copied.
    fn stage(&self, paths: &PathSet, source_root: &Path, dest_dir: &Path) -> Result<()>;

    /// Copy every file under `source_root` that passes `filter` and matches
    /// none of `exclude` into `dest_dir`. Returns the number of files copied.
    fn stage_tree(
        &self,
        source_root: &Path,
        filter: TreeFilter,
        exclude: &[String],
        dest_dir: &Path,
    ) -> Result<usize>;

    /// Remove and recreate an empty directory
    fn reset(&self, dir: &Path) -> Result<()>;
}

/// Progress callback for plan execution
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once before anything runs
    fn on_plan_start(&mut self, total: usize, dry_run: bool);

    /// Called after a stage's files were staged locally
    fn on_stage_prepared(&mut self, index: usize, stage: &Stage, dir: &Path);

    /// Called when a stage starts its remote work
    fn on_stage_start(&mut self, index: usize, stage: &Stage);

    /// Called when a stage completes
    fn on_stage_complete(&mut self, index: usize, stage: &Stage);

    /// Called once after the last stage
    fn on_plan_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan_start(&mut self, _total: usize, _dry_run: bool) {}
    fn on_stage_prepared(&mut self, _index: usize, _stage: &Stage, _dir: &Path) {}
    fn on_stage_start(&mut self, _index: usize, _stage: &Stage) {}
    fn on_stage_complete(&mut self, _index: usize, _stage: &Stage) {}
    fn on_plan_complete(&mut self) {}
}
