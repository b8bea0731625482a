use anyhow::{Context as _, Result};
use sitefs::TreeHasher;

use crate::Context;
use crate::cli::ManifestArgs;
use crate::ui;

pub fn run(ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let hasher = TreeHasher::new(&config.exclude, &config.manifest_name)
        .context("Invalid exclude pattern")?;

    let snapshot = hasher
        .hash_tree(&config.site_root)
        .with_context(|| format!("Failed to hash {}", config.site_root.display()))?;
    log::debug!("hashed {} files", snapshot.len());

    let target = if args.write {
        Some(hasher.manifest_path(&config.site_root))
    } else {
        args.output.clone()
    };

    match target {
        Some(path) => {
            std::fs::write(&path, snapshot.serialize())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !ctx.quiet {
                ui::success(&format!(
                    "Wrote {} entries to {}",
                    snapshot.len(),
                    path.display()
                ));
            }
        }
        None => print!("{}", snapshot.serialize()),
    }

    Ok(())
}
