//! Deployment planner - orders stages to approximate an atomic deploy
//!
//! The stage sequence is the atomicity contract:
//!
//! 1. New content (assets, pages, homepage) goes up first, so nothing can
//!    reference a file that does not exist yet.
//! 2. Updated content follows in the same class order.
//! 3. Removed pages are deleted before removed assets.
//! 4. The manifest is uploaded and made private last. It is the commit
//!    marker: if anything before it fails, the next run still diffs against
//!    the previous manifest.

use crate::classify::{ClassifiedPaths, classify};
use crate::diff::ChangeSet;
use crate::error::{Error, Result};
use crate::types::{
    DEFAULT_MANIFEST_NAME, HOMEPAGE_PATH, Operation, PathClass, PathSet, PlanKind, Source, Stage,
    StageGroup, TreeFilter,
};
use serde::{Deserialize, Serialize};

/// Upload order within the new and updated groups
const UPLOAD_ORDER: [PathClass; 3] = [PathClass::Assets, PathClass::Pages, PathClass::Homepage];

/// Deletion order within the removed group
const DELETE_ORDER: [PathClass; 2] = [PathClass::Pages, PathClass::Assets];

/// Ordered stages for one deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub kind: PlanKind,
    pub stages: Vec<Stage>,
}

impl DeploymentPlan {
    /// Create an empty plan
    pub fn new(kind: PlanKind) -> Self {
        Self {
            kind,
            stages: Vec::new(),
        }
    }

    /// Append a stage unless its explicit path set is empty
    fn push(&mut self, stage: Stage) {
        if matches!(&stage.source, Source::Paths(paths) if paths.is_empty()) {
            return;
        }
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    /// Number of stages performing an operation
    pub fn count(&self, operation: Operation) -> usize {
        self.stages
            .iter()
            .filter(|s| s.operation == operation)
            .count()
    }

    /// Number of stages that need local staging before any transfer
    pub fn upload_stages(&self) -> usize {
        self.count(Operation::Upload)
    }
}

/// Builds deployment plans
#[derive(Debug, Clone)]
pub struct Planner {
    manifest_path: String,
}

impl Planner {
    /// Create a planner for a manifest stored as `manifest_name` at the site root
    pub fn new(manifest_name: &str) -> Self {
        Self {
            manifest_path: format!("./{}", manifest_name.trim_start_matches("./")),
        }
    }

    /// Relative path of the manifest, e.g. `./.checksums`
    pub fn manifest_path(&self) -> &str {
        &self.manifest_path
    }

    /// Plan an incremental deploy from a change set
    ///
    /// Fails with [`Error::Precondition`] if the change set removes the
    /// homepage. Returns an empty plan when there is nothing to change.
    pub fn plan_incremental(&self, changes: &ChangeSet) -> Result<DeploymentPlan> {
        if changes.removed.contains(HOMEPAGE_PATH) {
            return Err(Error::precondition(format!(
                "{HOMEPAGE_PATH} would be deleted; the site would lose its entry point"
            )));
        }

        // The manifest describes the tree, it is never part of the diff it commits
        let changes = self.without_manifest(changes);

        let mut plan = DeploymentPlan::new(PlanKind::Incremental);
        if changes.is_empty() {
            return Ok(plan);
        }

        self.push_uploads(&mut plan, StageGroup::New, &classify(&changes.added));
        self.push_uploads(&mut plan, StageGroup::Updated, &classify(&changes.changed));

        let removed = classify(&changes.removed);
        for class in DELETE_ORDER {
            if let Some(paths) = removed.get(class) {
                plan.push(Stage::delete(class, paths.clone()));
            }
        }

        self.push_commit(&mut plan);
        Ok(plan)
    }

    /// Plan a full deploy for a bucket without a baseline manifest
    pub fn plan_full(&self) -> DeploymentPlan {
        let mut plan = DeploymentPlan::new(PlanKind::Full);
        plan.push(Stage::upload_tree(PathClass::Assets, TreeFilter::NonHtml));
        plan.push(Stage::upload_tree(PathClass::Pages, TreeFilter::Html));
        plan.push(Stage::mirror());
        self.push_commit(&mut plan);
        plan
    }

    fn push_uploads(&self, plan: &mut DeploymentPlan, group: StageGroup, paths: &ClassifiedPaths) {
        for class in UPLOAD_ORDER {
            if let Some(paths) = paths.get(class) {
                plan.push(Stage::upload(group, class, paths.clone()));
            }
        }
    }

    fn push_commit(&self, plan: &mut DeploymentPlan) {
        let manifest: PathSet = [self.manifest_path.as_str()].into_iter().collect();
        plan.push(Stage::upload(StageGroup::Commit, PathClass::Manifest, manifest.clone()));
        plan.push(Stage {
            operation: Operation::SetAcl,
            class: PathClass::Manifest,
            group: StageGroup::Commit,
            source: Source::Paths(manifest),
            recursive: false,
        });
    }

    fn without_manifest(&self, changes: &ChangeSet) -> ChangeSet {
        let keep = |set: &PathSet| -> PathSet {
            set.iter().filter(|p| *p != self.manifest_path).collect()
        };
        ChangeSet {
            added: keep(&changes.added),
            removed: keep(&changes.removed),
            changed: keep(&changes.changed),
        }
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::snapshot::Snapshot;

    fn set(paths: &[&str]) -> PathSet {
        paths.iter().copied().collect()
    }

    fn shape(plan: &DeploymentPlan) -> Vec<(Operation, PathClass, StageGroup)> {
        plan.iter().map(|s| (s.operation, s.class, s.group)).collect()
    }

    #[test]
    fn test_full_plan_order() {
        let plan = Planner::default().plan_full();
        assert_eq!(plan.kind, PlanKind::Full);
        assert_eq!(
            shape(&plan),
            vec![
                (Operation::Upload, PathClass::Assets, StageGroup::Full),
                (Operation::Upload, PathClass::Pages, StageGroup::Full),
                (Operation::Sync, PathClass::All, StageGroup::Full),
                (Operation::Upload, PathClass::Manifest, StageGroup::Commit),
                (Operation::SetAcl, PathClass::Manifest, StageGroup::Commit),
            ]
        );
        assert_eq!(plan.stages[0].source, Source::Tree(TreeFilter::NonHtml));
        assert_eq!(plan.stages[1].source, Source::Tree(TreeFilter::Html));
        assert_eq!(plan.stages[2].source, Source::Tree(TreeFilter::All));
    }

    #[test]
    fn test_full_plan_is_stable() {
        let planner = Planner::default();
        assert_eq!(planner.plan_full(), planner.plan_full());
        assert_eq!(planner.plan_full(), Planner::new(".checksums").plan_full());
    }

    #[test]
    fn test_empty_change_set_yields_empty_plan() {
        let plan = Planner::default()
            .plan_incremental(&ChangeSet::default())
            .unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.count(Operation::Upload), 0);
        assert_eq!(plan.count(Operation::Delete), 0);
    }

    #[test]
    fn test_homepage_removal_is_rejected() {
        let changes = ChangeSet {
            removed: set(&["./index.html"]),
            ..Default::default()
        };
        let err = Planner::default().plan_incremental(&changes).unwrap_err();
        assert!(matches!(err, Error::Precondition { .. }));
    }

    #[test]
    fn test_new_asset_before_updated_homepage() {
        let old: Snapshot = [("a.css", "h1"), ("./index.html", "h2")].into_iter().collect();
        let new: Snapshot = [("a.css", "h1"), ("b.js", "h3"), ("./index.html", "h4")]
            .into_iter()
            .collect();

        let plan = Planner::default().plan_incremental(&diff(&new, &old)).unwrap();
        assert_eq!(
            shape(&plan),
            vec![
                (Operation::Upload, PathClass::Assets, StageGroup::New),
                (Operation::Upload, PathClass::Homepage, StageGroup::Updated),
                (Operation::Upload, PathClass::Manifest, StageGroup::Commit),
                (Operation::SetAcl, PathClass::Manifest, StageGroup::Commit),
            ]
        );
        assert_eq!(plan.stages[0].source, Source::Paths(set(&["b.js"])));
        assert_eq!(plan.stages[1].source, Source::Paths(set(&["./index.html"])));
        assert_eq!(plan.count(Operation::Delete), 0);
    }

    #[test]
    fn test_removed_pages_deleted_before_assets() {
        let changes = ChangeSet {
            removed: set(&["./old/page.html", "./old/img.png"]),
            ..Default::default()
        };
        let plan = Planner::default().plan_incremental(&changes).unwrap();
        assert_eq!(
            shape(&plan),
            vec![
                (Operation::Delete, PathClass::Pages, StageGroup::Removed),
                (Operation::Delete, PathClass::Assets, StageGroup::Removed),
                (Operation::Upload, PathClass::Manifest, StageGroup::Commit),
                (Operation::SetAcl, PathClass::Manifest, StageGroup::Commit),
            ]
        );
        assert_eq!(plan.stages[0].source, Source::Paths(set(&["./old/page.html"])));
        assert_eq!(plan.stages[1].source, Source::Paths(set(&["./old/img.png"])));
    }

    #[test]
    fn test_full_incremental_order() {
        let changes = ChangeSet {
            added: set(&["./new.css", "./new.html", "./index.html"]),
            changed: set(&["./app.js", "./about.html"]),
            removed: set(&["./gone.html", "./gone.png"]),
        };
        let plan = Planner::default().plan_incremental(&changes).unwrap();
        assert_eq!(
            shape(&plan),
            vec![
                (Operation::Upload, PathClass::Assets, StageGroup::New),
                (Operation::Upload, PathClass::Pages, StageGroup::New),
                (Operation::Upload, PathClass::Homepage, StageGroup::New),
                (Operation::Upload, PathClass::Assets, StageGroup::Updated),
                (Operation::Upload, PathClass::Pages, StageGroup::Updated),
                (Operation::Delete, PathClass::Pages, StageGroup::Removed),
                (Operation::Delete, PathClass::Assets, StageGroup::Removed),
                (Operation::Upload, PathClass::Manifest, StageGroup::Commit),
                (Operation::SetAcl, PathClass::Manifest, StageGroup::Commit),
            ]
        );
        assert_eq!(plan.upload_stages(), 6);
    }

    #[test]
    fn test_empty_classes_are_omitted() {
        let changes = ChangeSet {
            changed: set(&["./a.css", "./b.css"]),
            ..Default::default()
        };
        let plan = Planner::default().plan_incremental(&changes).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.stages[0].source.path_count(), 2);
    }

    #[test]
    fn test_manifest_never_planned_as_content() {
        let planner = Planner::new(".checksums");
        let changes = ChangeSet {
            changed: set(&["./.checksums", "./a.css"]),
            ..Default::default()
        };
        let plan = planner.plan_incremental(&changes).unwrap();
        assert_eq!(plan.stages[0].source, Source::Paths(set(&["./a.css"])));
        assert_eq!(
            plan.stages[1].source,
            Source::Paths(set(&["./.checksums"]))
        );
        assert_eq!(plan.stages[1].class, PathClass::Manifest);
    }

    #[test]
    fn test_every_upload_is_recursive() {
        // Uploads always ship a staged directory, the commit included
        let changes = ChangeSet {
            added: set(&["./b.js"]),
            changed: set(&["./about.html"]),
            ..Default::default()
        };
        let incremental = Planner::default().plan_incremental(&changes).unwrap();
        for plan in [incremental, Planner::default().plan_full()] {
            let uploads: Vec<_> = plan
                .iter()
                .filter(|s| s.operation == Operation::Upload)
                .collect();
            assert!(uploads.iter().any(|s| s.class == PathClass::Manifest));
            assert!(uploads.iter().all(|s| s.recursive), "{uploads:?}");
        }
    }

    #[test]
    fn test_manifest_path_normalized() {
        assert_eq!(Planner::new(".checksums").manifest_path(), "./.checksums");
        assert_eq!(Planner::new("./.checksums").manifest_path(), "./.checksums");
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let plan = Planner::default().plan_full();
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"kind\":\"full\""));
        assert!(json.contains("\"operation\":\"set-acl\""));
    }
}
