//! Centralized path resolution for sitepush
//!
//! # Environment Variables
//!
//! - `SITEPUSH_CONFIG` - Config file to use when `--config` is not given
//! - `SITEPUSH_STAGING_DIR` - Override the staging root
//!
//! # Config File Resolution Priority
//!
//! 1. `--config <path>` (must exist)
//! 2. `SITEPUSH_CONFIG` environment variable (must exist)
//! 3. `./sitepush.toml`
//! 4. `<config_dir>/sitepush/config.toml`
//!
//! When none of these exist, sitepush runs on CLI flags and defaults alone.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const ENV_CONFIG: &str = "SITEPUSH_CONFIG";

/// Environment variable for staging root override
pub const ENV_STAGING_DIR: &str = "SITEPUSH_STAGING_DIR";

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = "sitepush.toml";

/// Get the sitepush config directory path
///
/// Priority:
/// 1. `XDG_CONFIG_HOME/sitepush`
/// 2. Platform default (`~/.config/sitepush`, `%APPDATA%\sitepush`, ...)
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("sitepush");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("sitepush"))
}

/// Get the root under which per-destination staging directories live
///
/// Priority:
/// 1. `SITEPUSH_STAGING_DIR` env var
/// 2. `<cache_dir>/sitepush/staging`
/// 3. `<tmp>/sitepush/staging`
pub fn staging_root() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_STAGING_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using staging root from {}: {}",
            ENV_STAGING_DIR,
            path.display()
        );
        return path;
    }

    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sitepush")
        .join("staging")
}

/// Find the config file to load, if any
pub fn find_config(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(value) = std::env::var(ENV_CONFIG) {
        let path = expand(&value);
        if !path.is_file() {
            bail!("{ENV_CONFIG} points to a missing file: {}", path.display());
        }
        log::debug!("Using config from {ENV_CONFIG}: {}", path.display());
        return Ok(Some(path));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }

    let global = config_dir()?.join("config.toml");
    if global.is_file() {
        return Ok(Some(global));
    }

    log::debug!("No config file found, using defaults");
    Ok(None)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with an env var set, restoring the previous value afterwards.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: each test uses its own variable
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: see above
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_staging_root_env_override() {
        with_env_var(ENV_STAGING_DIR, "/custom/staging", || {
            assert_eq!(staging_root(), PathBuf::from("/custom/staging"));
        });
    }

    #[test]
    fn test_find_config_explicit() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("deploy.toml");
        std::fs::write(&file, "").unwrap();

        assert_eq!(find_config(Some(&file)).unwrap(), Some(file.clone()));
        assert!(find_config(Some(&tmp.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/site/public");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("site").join("public"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env_var("SITEPUSH_TEST_VAR", "blog", || {
            assert_eq!(expand("/srv/$SITEPUSH_TEST_VAR"), PathBuf::from("/srv/blog"));
        });
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}
