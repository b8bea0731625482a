//! Stage executor - runs a plan against the collaborators, in order
//!
//! Execution has two phases. First every upload stage is staged into its own
//! directory under the deploy's staging area, so a local failure (disk full,
//! unreadable file) aborts before anything reaches the bucket. Then the
//! stages run strictly in plan order; the first failure aborts the rest.
//! Nothing is rolled back.

use crate::context::{CopyOptions, FileStager, ObjectStore, ProgressCallback, SyncOptions};
use crate::error::{Error, Result};
use crate::planner::DeploymentPlan;
use crate::types::{Acl, DeployTarget, ExecuteSummary, Operation, PathClass, Source, Stage};
use std::path::{Path, PathBuf};

/// Execute a plan with the given collaborators
///
/// # Arguments
/// * `plan` - The plan to run; consumed
/// * `target` - Site root, staging area, excludes and ACL policy
/// * `stager` - Copies files into the staging area
/// * `store` - The remote object store
/// * `progress` - Progress callback
///
/// # Returns
/// Summary of the stages that ran
pub fn execute<F, O, P>(
    plan: DeploymentPlan,
    target: &DeployTarget,
    stager: &F,
    store: &O,
    progress: &mut P,
) -> Result<ExecuteSummary>
where
    F: FileStager + ?Sized,
    O: ObjectStore + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let mut summary = ExecuteSummary {
        dry_run: target.dry_run,
        ..Default::default()
    };

    if plan.is_empty() {
        return Ok(summary);
    }

    progress.on_plan_start(plan.len(), target.dry_run);

    if target.dry_run {
        for (index, stage) in plan.iter().enumerate() {
            progress.on_stage_start(index, stage);
            summary.add_stage(stage);
            progress.on_stage_complete(index, stage);
        }
        progress.on_plan_complete();
        return Ok(summary);
    }

    let exclude = tree_excludes(&plan, target);
    let staged = prepare(&plan, target, &exclude, stager, progress)?;

    for (index, stage) in plan.iter().enumerate() {
        progress.on_stage_start(index, stage);
        run_stage(index, stage, staged[index].as_deref(), target, &exclude, store)?;
        summary.add_stage(stage);
        progress.on_stage_complete(index, stage);
    }

    progress.on_plan_complete();
    Ok(summary)
}

/// Stage every upload before any remote mutation
///
/// Returns the staging directory of each stage, `None` for stages that
/// act on the bucket directly.
fn prepare<F, P>(
    plan: &DeploymentPlan,
    target: &DeployTarget,
    exclude: &[String],
    stager: &F,
    progress: &mut P,
) -> Result<Vec<Option<PathBuf>>>
where
    F: FileStager + ?Sized,
    P: ProgressCallback + ?Sized,
{
    stager
        .reset(&target.staging_dir)
        .map_err(|e| staging_error(0, PathClass::All, 0, &e))?;

    let mut staged = Vec::with_capacity(plan.len());
    for (index, stage) in plan.iter().enumerate() {
        if stage.operation != Operation::Upload {
            staged.push(None);
            continue;
        }

        let dir = target.staging_dir.join(stage_dir_name(index, stage));
        let paths = stage.source.path_count();
        match &stage.source {
            Source::Paths(list) => stager
                .stage(list, &target.site_root, &dir)
                .map_err(|e| staging_error(index, stage.class, paths, &e))?,
            Source::Tree(filter) => {
                stager
                    .stage_tree(&target.site_root, *filter, exclude, &dir)
                    .map_err(|e| staging_error(index, stage.class, paths, &e))?;
            }
        }
        progress.on_stage_prepared(index, stage, &dir);
        staged.push(Some(dir));
    }

    Ok(staged)
}

/// Run one stage against the bucket
fn run_stage<O: ObjectStore + ?Sized>(
    index: usize,
    stage: &Stage,
    staged: Option<&Path>,
    target: &DeployTarget,
    exclude: &[String],
    store: &O,
) -> Result<()> {
    let paths = stage.source.path_count();
    let transfer_error = |e: anyhow::Error| Error::Transfer {
        stage: index,
        operation: stage.operation,
        class: stage.class,
        paths,
        message: format!("{e:#}"),
    };

    match stage.operation {
        Operation::Upload => {
            let dir = staged.ok_or_else(|| Error::Transfer {
                stage: index,
                operation: stage.operation,
                class: stage.class,
                paths,
                message: "upload stage was not staged".to_string(),
            })?;
            let options = CopyOptions {
                recursive: stage.recursive,
                acl: Some(target.acl),
                ..Default::default()
            };
            store.copy(dir, &options).map_err(transfer_error)
        }
        Operation::Delete => match &stage.source {
            Source::Paths(keys) => store.remove(keys, stage.recursive).map_err(transfer_error),
            Source::Tree(_) => Err(transfer_error(anyhow::anyhow!(
                "refusing to delete a whole tree"
            ))),
        },
        Operation::Sync => {
            let options = SyncOptions {
                delete: true,
                exclude: exclude.to_vec(),
                acl: Some(target.acl),
            };
            store
                .sync(&target.site_root, &options)
                .map_err(transfer_error)
        }
        Operation::SetAcl => {
            let keys = stage.source.paths().into_iter().flat_map(|p| p.iter());
            for key in keys {
                store
                    .set_acl(key, Acl::Private)
                    .map_err(|e| Error::Acl {
                        stage: index,
                        key: key.to_string(),
                        message: format!("{e:#}"),
                    })?;
            }
            Ok(())
        }
    }
}

/// Excludes for tree-sourced stages: configured patterns plus the manifest,
/// which only the commit stages may send.
fn tree_excludes(plan: &DeploymentPlan, target: &DeployTarget) -> Vec<String> {
    let mut exclude = target.exclude.clone();
    let manifests = plan
        .iter()
        .filter(|s| s.class == PathClass::Manifest)
        .filter_map(|s| s.source.paths())
        .flat_map(|p| p.iter());
    for path in manifests {
        let pattern = path.trim_start_matches("./").to_string();
        if !exclude.contains(&pattern) {
            exclude.push(pattern);
        }
    }
    exclude
}

fn stage_dir_name(index: usize, stage: &Stage) -> String {
    format!("{:02}-{}-{}", index, stage.group, stage.class)
}

fn staging_error(stage: usize, class: PathClass, paths: usize, e: &anyhow::Error) -> Error {
    Error::Staging {
        stage,
        class,
        paths,
        message: format!("{e:#}"),
    }
}
