use anyhow::{Context as _, Result};
use colored::Colorize;
use stageplan::{DeploymentPlan, PlanKind, Source};

use crate::Context;
use crate::cli::PlanArgs;
use crate::deployer::{Baseline, Deployer};
use crate::ui;

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let client = super::client(&config)?;
    let prepared = Deployer::new(&config, &client)?.prepare(args.full)?;

    if args.json {
        let json = serde_json::to_string_pretty(&prepared.plan).context("Failed to encode plan")?;
        println!("{json}");
        return Ok(());
    }

    ui::header("Deploy Plan");
    ui::kv("Site", &config.site_root.display().to_string());
    ui::kv("Destination", &config.destination()?.to_string());
    ui::kv("Local files", &prepared.local.len().to_string());
    ui::kv("Baseline", &describe_baseline(&prepared.baseline));
    println!();

    print_plan(&prepared.plan, ctx.verbose > 0);
    Ok(())
}

/// Human description of what the plan was diffed against
pub fn describe_baseline(baseline: &Baseline) -> String {
    match baseline {
        Baseline::Manifest { entries, dropped: 0 } => format!("remote manifest ({entries} files)"),
        Baseline::Manifest { entries, dropped } => {
            format!("remote manifest ({entries} files, {dropped} malformed lines ignored)")
        }
        Baseline::Missing => "none (first deploy)".to_string(),
        Baseline::Empty => "remote manifest is empty".to_string(),
        Baseline::Ignored => "ignored (--full)".to_string(),
    }
}

/// Print the stages of a plan, optionally with their paths
pub fn print_plan(plan: &DeploymentPlan, with_paths: bool) {
    if plan.is_empty() {
        ui::success("Nothing to deploy - remote is up to date");
        return;
    }

    let kind = match plan.kind {
        PlanKind::Full => "full".yellow(),
        PlanKind::Incremental => "incremental".green(),
    };
    println!("  {} plan, {} stages", kind.bold(), plan.len());
    println!();

    for (i, stage) in plan.iter().enumerate() {
        ui::step(i + 1, plan.len(), &stage.label());
        if !with_paths {
            continue;
        }
        match &stage.source {
            Source::Paths(paths) => {
                for path in paths {
                    ui::dim(path);
                }
            }
            Source::Tree(filter) => ui::dim(&format!("site tree ({filter:?})")),
        }
    }
}
