//! # Stageplan
//!
//! Incremental diff-and-stage planning for deploying a static site to an
//! object store that has no transactions.
//!
//! The crate compares two snapshots of a site (path → content hash), sorts
//! the differences into ordering classes and derives a plan whose stage
//! order keeps the live site consistent for as long as possible.
//!
//! ## Core Concepts
//!
//! - **Snapshot**: path → hash mapping, read from and written to manifest text
//! - **ChangeSet**: added / removed / changed paths between two snapshots
//! - **ClassifiedPaths**: a path set split into assets, pages and homepage
//! - **DeploymentPlan**: the ordered stages of one deploy
//! - **Executor**: stages uploads locally, then runs every stage in order
//!
//! ## Example
//!
//! ```ignore
//! use stageplan::{Planner, Snapshot, diff, execute, DeployTarget, NoProgress};
//!
//! let old = Snapshot::parse(&remote_manifest_text);
//! let new = Snapshot::parse(&local_manifest_text);
//!
//! let planner = Planner::new(".checksums");
//! let plan = if old.is_empty() {
//!     planner.plan_full()
//! } else {
//!     planner.plan_incremental(&diff(&new, &old))?
//! };
//!
//! let target = DeployTarget::new("public", "/tmp/staging/my-bucket");
//! let summary = execute(plan, &target, &stager, &store, &mut NoProgress)?;
//! ```
//!
//! ## Collaborator Traits
//!
//! The executor talks to the outside world only through traits:
//!
//! - [`ObjectStore`]: copy, remove, sync, ACL changes and object reads
//! - [`FileStager`]: copies file subsets into a staging directory
//! - [`ProgressCallback`]: receives stage progress (logging, progress bars)

pub mod classify;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod snapshot;
pub mod types;

// Re-export main types at crate root
pub use classify::{ClassifiedPaths, class_of, classify};
pub use context::{CopyOptions, FileStager, NoProgress, ObjectStore, ProgressCallback, SyncOptions};
pub use diff::{ChangeSet, DiffSummary, diff};
pub use error::{Error, Result};
pub use executor::execute;
pub use planner::{DeploymentPlan, Planner};
pub use snapshot::{ParseReport, Snapshot};
pub use types::{
    Acl, DEFAULT_MANIFEST_NAME, DeployTarget, ExecuteSummary, HOMEPAGE_PATH, Operation, PathClass,
    PathSet, PlanKind, Source, Stage, StageGroup, TreeFilter,
};
