//! Progress reporting for deploys.
//!
//! Implements the executor's progress callback with an indicatif bar and
//! `log` records for each stage transition.

use indicatif::{ProgressBar, ProgressStyle};
use stageplan::{ProgressCallback, Stage};
use std::path::Path;

use crate::ui;

/// Progress bar over the stages of one plan
pub struct DeployProgress {
    bar: ProgressBar,
    quiet: bool,
    dry_run: bool,
    total: usize,
}

impl DeployProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            quiet,
            dry_run: false,
            total: 0,
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

impl ProgressCallback for DeployProgress {
    fn on_plan_start(&mut self, total: usize, dry_run: bool) {
        self.total = total;
        self.dry_run = dry_run;
        log::info!(
            "running {total} stages{}",
            if dry_run { " (dry run)" } else { "" }
        );

        // Dry runs print each stage instead of animating
        if !self.quiet && !dry_run {
            self.bar = ProgressBar::new(total as u64);
            self.bar.set_style(bar_style());
        }
    }

    fn on_stage_prepared(&mut self, index: usize, stage: &Stage, dir: &Path) {
        log::debug!("staged #{index} {} in {}", stage.label(), dir.display());
    }

    fn on_stage_start(&mut self, index: usize, stage: &Stage) {
        let label = stage.label();
        log::info!("stage {}/{}: {label}", index + 1, self.total);
        self.bar.set_message(ui::truncate_path(&label, 40));
    }

    fn on_stage_complete(&mut self, index: usize, stage: &Stage) {
        if self.dry_run && !self.quiet {
            ui::step(index + 1, self.total, &format!("would {}", stage.label()));
        }
        self.bar.inc(1);
    }

    fn on_plan_complete(&mut self) {
        self.bar.finish_and_clear();
        log::info!("all stages complete");
    }
}
