use anyhow::Result;
use stageplan::{ChangeSet, PathSet, classify};

use crate::Context;
use crate::deployer::Deployer;
use crate::ui;

use super::plan::describe_baseline;

pub fn run(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let client = super::client(&config)?;
    let prepared = Deployer::new(&config, &client)?.prepare(false)?;

    ui::header("Site Changes");
    ui::kv("Baseline", &describe_baseline(&prepared.baseline));

    let Some(changes) = prepared.changes else {
        println!();
        ui::info(&format!(
            "No usable remote manifest; the next deploy uploads all {} files",
            prepared.local.len()
        ));
        return Ok(());
    };

    if changes.is_empty() {
        println!();
        ui::success("No changes since the last deploy");
        return Ok(());
    }

    print_changes(&changes);
    Ok(())
}

fn print_changes(changes: &ChangeSet) {
    for (title, marker, paths) in [
        ("Added", "+", &changes.added),
        ("Changed", "~", &changes.changed),
        ("Removed", "-", &changes.removed),
    ] {
        if paths.is_empty() {
            continue;
        }
        ui::section(&format!("{title} ({})", paths.len()));
        print_classified(marker, paths);
    }

    let counts = changes.summary();
    println!();
    ui::info(&format!(
        "{} added, {} changed, {} removed",
        counts.additions, counts.modifications, counts.removals
    ));
}

/// Print paths grouped the way the planner orders them
fn print_classified(marker: &str, paths: &PathSet) {
    let classified = classify(paths);
    for (class, set) in [
        ("assets", &classified.assets),
        ("pages", &classified.pages),
        ("homepage", &classified.homepage),
    ] {
        for path in set {
            ui::item(marker, &format!("{path}  [{class}]"));
        }
    }
}
