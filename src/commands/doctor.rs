use anyhow::Result;
use colored::Colorize;
use objstore::Destination;
use sitefs::TreeHasher;

use crate::Context;
use crate::config::DeployConfig;
use crate::ui;

struct Issue {
    category: &'static str,
    summary: String,
    fix: Option<String>,
}

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("sitepush Health Check");

    let mut issues: Vec<Issue> = Vec::new();

    // Config must load before anything else can be checked
    let config = match ctx.load_config() {
        Ok(config) => {
            check_config(&config);
            Some(config)
        }
        Err(e) => {
            ui::section("Configuration");
            println!("  {} {}", "✗".red(), format!("{e:#}").red());
            issues.push(Issue {
                category: "Configuration",
                summary: "Configuration could not be loaded".into(),
                fix: Some("Fix sitepush.toml or pass --site-root / --destination".into()),
            });
            None
        }
    };

    if let Some(config) = &config {
        check_site(config, &mut issues);
        check_backend(config, &mut issues);
        check_staging(config, &mut issues);
    }

    println!();
    if issues.is_empty() {
        ui::success("Ready to deploy");
    } else {
        print_issue_summary(&issues);
    }

    Ok(())
}

fn print_issue_summary(issues: &[Issue]) {
    let count = issues.len();
    let label = if count == 1 { "Issue" } else { "Issues" };
    ui::header(&format!("{count} {label} Found"));

    for (i, issue) in issues.iter().enumerate() {
        println!(
            "  {}  {} {}",
            format!("{}.", i + 1).bold(),
            issue.summary,
            format!("[{}]", issue.category).dimmed()
        );
        if let Some(fix) = &issue.fix {
            println!("      {} {}", "Fix:".cyan(), fix);
        }
    }
}

fn ok(what: &str, detail: &str) {
    println!("  {} {} - {}", "✓".green(), what, detail.dimmed());
}

fn check_config(config: &DeployConfig) {
    ui::section("Configuration");
    match &config.source {
        Some(path) => ok("config file", &path.display().to_string()),
        None => ui::dim("no config file, using flags and defaults"),
    }
    ui::kv("manifest", &config.manifest_name);
    ui::kv("acl", &config.acl.to_string());
    if !config.exclude.is_empty() {
        ui::kv("exclude", &config.exclude.join(", "));
    }
}

fn check_site(config: &DeployConfig, issues: &mut Vec<Issue>) {
    ui::section("Site");
    let root = &config.site_root;

    let hasher = match TreeHasher::new(&config.exclude, &config.manifest_name) {
        Ok(hasher) => hasher,
        Err(e) => {
            ui::error(&e.to_string());
            issues.push(Issue {
                category: "Site",
                summary: e.to_string(),
                fix: Some("Correct the pattern in `exclude`".into()),
            });
            return;
        }
    };

    match hasher.hash_tree(root) {
        Ok(snapshot) if snapshot.is_empty() => {
            println!("  {} {} - {}", "⚠".yellow(), root.display(), "no files".yellow());
            issues.push(Issue {
                category: "Site",
                summary: format!("{} contains no deployable files", root.display()),
                fix: Some("Build the site first, or check `exclude`".into()),
            });
        }
        Ok(snapshot) => {
            ok(&root.display().to_string(), &format!("{} files", snapshot.len()));
            let local = hasher.read_manifest(root);
            if !local.is_empty() && local != snapshot {
                ui::dim("local manifest is out of date (rewritten on next deploy)");
            }
        }
        Err(e) => {
            ui::error(&e.to_string());
            issues.push(Issue {
                category: "Site",
                summary: format!("Could not read {}", root.display()),
                fix: None,
            });
        }
    }
}

fn check_backend(config: &DeployConfig, issues: &mut Vec<Issue>) {
    ui::section("Destination");

    let destination = match config.destination() {
        Ok(destination) => destination,
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            issues.push(Issue {
                category: "Destination",
                summary: "No destination configured".into(),
                fix: Some("Add destination = \"s3://bucket\" to sitepush.toml".into()),
            });
            return;
        }
    };

    let client = match super::client(config) {
        Ok(client) => client,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            issues.push(Issue {
                category: "Destination",
                summary: format!("Cannot use {destination}"),
                fix: None,
            });
            return;
        }
    };

    match client.check() {
        Ok(detail) => ok(&destination.to_string(), &format!("{} ({detail})", client.backend_name())),
        Err(e) => {
            println!("  {} {} - {}", "✗".red(), destination, e.to_string().red());
            let fix = match destination {
                Destination::S3 { .. } if e.is_unavailable() => {
                    Some("Install s3cmd and run `s3cmd --configure`".into())
                }
                _ => None,
            };
            issues.push(Issue {
                category: "Destination",
                summary: format!("{} backend unavailable", client.backend_name()),
                fix,
            });
        }
    }
}

fn check_staging(config: &DeployConfig, issues: &mut Vec<Issue>) {
    ui::section("Staging");
    let Ok(dir) = config.staging_dir() else {
        return;
    };

    match std::fs::create_dir_all(&dir) {
        Ok(()) => ok(&dir.display().to_string(), "writable"),
        Err(e) => {
            println!("  {} {} - {}", "✗".red(), dir.display(), e.to_string().red());
            issues.push(Issue {
                category: "Staging",
                summary: format!("Cannot create {}", dir.display()),
                fix: Some("Set staging_root or SITEPUSH_STAGING_DIR to a writable path".into()),
            });
        }
    }
}
