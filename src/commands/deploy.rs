use anyhow::Result;

use crate::Context;
use crate::cli::DeployArgs;
use crate::deployer::{Baseline, Deployer, Outcome};
use crate::progress::DeployProgress;
use crate::ui;

use super::plan::describe_baseline;

pub fn run(ctx: &Context, args: &DeployArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let client = super::client(&config)?;
    let deployer = Deployer::new(&config, &client)?;

    if !ctx.quiet {
        ui::header(if args.dry_run { "Deploy (dry run)" } else { "Deploy" });
        ui::kv("Site", &config.site_root.display().to_string());
        ui::kv("Destination", &config.destination()?.to_string());
        println!();
    }

    let mut progress = DeployProgress::new(ctx.quiet);
    let outcome = deployer.deploy(args.full, args.dry_run, &mut progress)?;

    if !ctx.quiet {
        report(&outcome);
    }
    Ok(())
}

fn report(outcome: &Outcome) {
    let summary = &outcome.summary;
    ui::kv("Local files", &outcome.prepared_files.to_string());
    ui::kv("Baseline", &describe_baseline(&outcome.baseline));
    if let Some(changes) = &outcome.changes {
        let counts = changes.summary();
        ui::kv(
            "Changes",
            &format!(
                "{} added, {} changed, {} removed",
                counts.additions, counts.modifications, counts.removals
            ),
        );
    }
    println!();

    if let Baseline::Manifest { dropped, .. } = outcome.baseline
        && dropped > 0
    {
        ui::warn(&format!(
            "Remote manifest had {dropped} malformed lines; those files were treated as new"
        ));
    }

    if summary.stages == 0 {
        ui::success("Nothing to deploy - remote is up to date");
        return;
    }

    let mut parts = vec![format!("{} stages", summary.stages)];
    if summary.uploaded > 0 {
        parts.push(format!("{} files uploaded", summary.uploaded));
    }
    if summary.deleted > 0 {
        parts.push(format!("{} deleted", summary.deleted));
    }
    if summary.tree_transfers > 0 {
        parts.push(format!("{} full-tree transfers", summary.tree_transfers));
    }

    if summary.dry_run {
        ui::info(&format!("Dry run: {} (nothing was changed)", parts.join(", ")));
    } else {
        ui::success(&format!("Deployed: {}", parts.join(", ")));
    }
}
