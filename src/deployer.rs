//! Deploy orchestration
//!
//! Hashes the local site, fetches the remote manifest, picks the full or
//! incremental plan and hands it to the stage executor.

use anyhow::{Context, Result};
use objstore::Destination;
use sitefs::{Stager, TreeHasher};
use stageplan::{
    ChangeSet, DeploymentPlan, ExecuteSummary, ObjectStore, Planner, ProgressCallback, Snapshot,
    diff, execute,
};

use crate::config::DeployConfig;

/// Why a deploy took the plan it did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// Remote manifest was read and diffed against
    Manifest { entries: usize, dropped: usize },
    /// No remote manifest (first deploy, or it was never committed)
    Missing,
    /// Remote manifest exists but holds no usable entries
    Empty,
    /// `--full` was requested
    Ignored,
}

/// Everything computed before any remote mutation
#[derive(Debug)]
pub struct Prepared {
    pub local: Snapshot,
    pub baseline: Baseline,
    /// `None` when the full plan was chosen
    pub changes: Option<ChangeSet>,
    pub plan: DeploymentPlan,
}

/// Result of a finished deploy
#[derive(Debug)]
pub struct Outcome {
    pub prepared_files: usize,
    pub baseline: Baseline,
    pub changes: Option<ChangeSet>,
    pub summary: ExecuteSummary,
}

pub struct Deployer<'a, S: ObjectStore + ?Sized> {
    config: &'a DeployConfig,
    store: &'a S,
    hasher: TreeHasher,
    planner: Planner,
}

impl<'a, S: ObjectStore + ?Sized> Deployer<'a, S> {
    pub fn new(config: &'a DeployConfig, store: &'a S) -> Result<Self> {
        let hasher = TreeHasher::new(&config.exclude, &config.manifest_name)
            .context("Invalid exclude pattern")?;
        Ok(Self {
            config,
            store,
            hasher,
            planner: Planner::new(&config.manifest_name),
        })
    }

    /// Hash the local site; an empty site is refused
    pub fn local_snapshot(&self) -> Result<Snapshot> {
        let snapshot = self
            .hasher
            .hash_tree(&self.config.site_root)
            .with_context(|| format!("Failed to hash {}", self.config.site_root.display()))?;

        if snapshot.is_empty() {
            return Err(stageplan::Error::precondition(format!(
                "no files to deploy under {}",
                self.config.site_root.display()
            ))
            .into());
        }
        log::debug!("hashed {} local files", snapshot.len());
        Ok(snapshot)
    }

    /// Fetch and parse the remote manifest
    pub fn remote_snapshot(&self) -> Result<(Option<Snapshot>, Baseline)> {
        let key = self.planner.manifest_path();
        let Some(raw) = self
            .store
            .get_object(key)
            .with_context(|| format!("Failed to fetch remote manifest {key}"))?
        else {
            log::debug!("no remote manifest at {key}");
            return Ok((None, Baseline::Missing));
        };

        let (snapshot, report) = Snapshot::parse_with_report(&String::from_utf8_lossy(&raw));
        if report.dropped > 0 {
            log::warn!(
                "remote manifest: ignored {} malformed lines ({} parsed)",
                report.dropped,
                report.parsed
            );
        }
        if snapshot.is_empty() {
            log::debug!("remote manifest is empty");
            return Ok((None, Baseline::Empty));
        }

        let baseline = Baseline::Manifest {
            entries: snapshot.len(),
            dropped: report.dropped,
        };
        Ok((Some(snapshot), baseline))
    }

    /// Choose and build the plan for a local snapshot
    pub fn plan(
        &self,
        local: &Snapshot,
        remote: Option<&Snapshot>,
    ) -> Result<(Option<ChangeSet>, DeploymentPlan)> {
        match remote {
            None => {
                log::debug!("planning full deploy");
                Ok((None, self.planner.plan_full()))
            }
            Some(remote) => {
                let changes = diff(local, remote);
                log::debug!(
                    "planning incremental deploy: {} added, {} changed, {} removed",
                    changes.added.len(),
                    changes.changed.len(),
                    changes.removed.len()
                );
                let plan = self.planner.plan_incremental(&changes)?;
                Ok((Some(changes), plan))
            }
        }
    }

    /// Compute the plan without mutating anything
    pub fn prepare(&self, force_full: bool) -> Result<Prepared> {
        let local = self.local_snapshot()?;
        let (remote, baseline) = if force_full {
            (None, Baseline::Ignored)
        } else {
            self.remote_snapshot()?
        };
        let (changes, plan) = self.plan(&local, remote.as_ref())?;

        Ok(Prepared {
            local,
            baseline,
            changes,
            plan,
        })
    }

    /// Run a full deploy: prepare, write the local manifest, execute
    pub fn deploy(
        &self,
        force_full: bool,
        dry_run: bool,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Outcome> {
        let prepared = self.prepare(force_full)?;

        // The commit stage uploads this file, so it must match the snapshot
        if !dry_run && !prepared.plan.is_empty() {
            self.hasher
                .save_manifest(&self.config.site_root, &prepared.local)
                .context("Failed to write local manifest")?;
        }

        let destination = self.config.destination()?;
        let target = self.config.target(dry_run)?;
        let total = prepared.plan.len();
        let summary = execute(prepared.plan, &target, &Stager::new(), self.store, progress)
            .map_err(|e| {
                let message = abort_message(&e, destination, total);
                anyhow::Error::new(e).context(message)
            })?;

        Ok(Outcome {
            prepared_files: prepared.local.len(),
            baseline: prepared.baseline,
            changes: prepared.changes,
            summary,
        })
    }
}

/// Headline for a failed execution, saying how far the remote got
fn abort_message(error: &stageplan::Error, destination: &Destination, total: usize) -> String {
    match error.stage_index() {
        Some(done) if !error.is_pre_mutation() => format!(
            "Deploy to {destination} aborted after {done} of {total} stages; \
             the remote is partially updated"
        ),
        _ => format!("Deploy to {destination} aborted before any remote change"),
    }
}
