use anyhow::{Context, Result, bail};
use objstore::{Destination, S3cmdOptions};
use serde::{Deserialize, Serialize};
use stageplan::{Acl, DEFAULT_MANIFEST_NAME, DeployTarget};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

// ============================================================================
// Config File
// ============================================================================

/// Contents of `sitepush.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Directory holding the built site; relative to the config file
    pub site_root: Option<String>,
    pub destination: Option<Destination>,
    /// Glob patterns never hashed, uploaded or deleted
    pub exclude: Vec<String>,
    pub manifest_name: Option<String>,
    pub staging_root: Option<String>,
    /// Upload objects public-read (default true)
    pub public: Option<bool>,
    pub s3cmd: S3cmdOptions,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }
}

/// Values given on the command line, taking precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub site_root: Option<PathBuf>,
    pub destination: Option<Destination>,
    /// Replaces the file's exclude list when non-empty
    pub exclude: Vec<String>,
}

// ============================================================================
// Resolved Config
// ============================================================================

/// Everything a deploy needs, resolved and validated
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub site_root: PathBuf,
    pub destination: Option<Destination>,
    pub exclude: Vec<String>,
    pub manifest_name: String,
    pub staging_root: PathBuf,
    pub acl: Acl,
    pub s3cmd: S3cmdOptions,
    /// Config file the values came from, if any
    pub source: Option<PathBuf>,
}

impl DeployConfig {
    /// Find and load the config file, then apply CLI overrides
    pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let source = paths::find_config(explicit)?;
        let file = match &source {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let base = source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut config = Self::resolve(file, overrides, &base)?;
        config.source = source;
        Ok(config)
    }

    /// Merge file values with overrides; relative file paths resolve against `base`
    pub fn resolve(file: ConfigFile, overrides: Overrides, base: &Path) -> Result<Self> {
        let site_root = match (overrides.site_root, file.site_root) {
            (Some(cli), _) => cli,
            (None, Some(from_file)) => base.join(paths::expand(&from_file)),
            (None, None) => PathBuf::from("."),
        };

        let exclude = if overrides.exclude.is_empty() {
            file.exclude
        } else {
            overrides.exclude
        };

        let staging_root = file
            .staging_root
            .map(|dir| base.join(paths::expand(&dir)))
            .unwrap_or_else(paths::staging_root);

        let mut s3cmd = file.s3cmd;
        if let Some(cfg) = &s3cmd.config_file {
            s3cmd.config_file = Some(paths::expand(&cfg.to_string_lossy()));
        }

        let config = Self {
            site_root,
            destination: overrides.destination.or(file.destination),
            exclude,
            manifest_name: file
                .manifest_name
                .unwrap_or_else(|| DEFAULT_MANIFEST_NAME.to_string()),
            staging_root,
            acl: if file.public.unwrap_or(true) {
                Acl::Public
            } else {
                Acl::Private
            },
            s3cmd,
            source: None,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let name = &self.manifest_name;
        if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\')
        {
            bail!("manifest_name must be a bare file name, got '{name}'");
        }
        if !self.site_root.exists() {
            bail!("Site root does not exist: {}", self.site_root.display());
        }
        if !self.site_root.is_dir() {
            bail!("Site root is not a directory: {}", self.site_root.display());
        }
        Ok(())
    }

    /// The configured destination, required for anything touching the bucket
    pub fn destination(&self) -> Result<&Destination> {
        self.destination.as_ref().context(
            "No destination configured (set `destination` in sitepush.toml or pass --destination)",
        )
    }

    /// Staging directory of this destination, separate per bucket
    pub fn staging_dir(&self) -> Result<PathBuf> {
        Ok(self.staging_root.join(self.destination()?.bucket_name()))
    }

    /// Execution target for the stage executor
    pub fn target(&self, dry_run: bool) -> Result<DeployTarget> {
        let mut target = DeployTarget::new(&self.site_root, self.staging_dir()?);
        target.exclude = self.exclude.clone();
        target.acl = self.acl;
        target.dry_run = dry_run;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("public")).unwrap();
        tmp
    }

    #[test]
    fn test_parse_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            site_root = "public"
            destination = "s3://www.example.com/blog"
            exclude = ["drafts/*", "*.bak"]
            public = false

            [s3cmd]
            config_file = "/etc/s3cfg"
            "#,
        )
        .unwrap();

        assert_eq!(file.site_root.as_deref(), Some("public"));
        assert_eq!(
            file.destination.unwrap().to_string(),
            "s3://www.example.com/blog"
        );
        assert_eq!(file.exclude.len(), 2);
        assert_eq!(file.s3cmd.binary, PathBuf::from("s3cmd"));
        assert_eq!(file.s3cmd.config_file, Some(PathBuf::from("/etc/s3cfg")));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<ConfigFile>("bucket = \"x\"").is_err());
        assert!(toml::from_str::<ConfigFile>("destination = \"ftp://x\"").is_err());
    }

    #[test]
    fn test_resolve_relative_to_config_dir() {
        let tmp = site();
        let file = ConfigFile {
            site_root: Some("public".to_string()),
            destination: Some("s3://bucket".parse().unwrap()),
            staging_root: Some("stage".to_string()),
            ..Default::default()
        };

        let config = DeployConfig::resolve(file, Overrides::default(), tmp.path()).unwrap();
        assert_eq!(config.site_root, tmp.path().join("public"));
        assert_eq!(config.manifest_name, ".checksums");
        assert_eq!(config.acl, Acl::Public);
        assert_eq!(
            config.staging_dir().unwrap(),
            tmp.path().join("stage").join("bucket")
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let tmp = site();
        let file = ConfigFile {
            site_root: Some("missing".to_string()),
            destination: Some("s3://from-file".parse().unwrap()),
            exclude: vec!["*.bak".to_string()],
            ..Default::default()
        };
        let overrides = Overrides {
            site_root: Some(tmp.path().join("public")),
            destination: Some("s3://from-cli".parse().unwrap()),
            exclude: vec!["drafts/*".to_string()],
        };

        let config = DeployConfig::resolve(file, overrides, tmp.path()).unwrap();
        assert_eq!(config.destination().unwrap().to_string(), "s3://from-cli");
        assert_eq!(config.exclude, vec!["drafts/*".to_string()]);
    }

    #[test]
    fn test_validation() {
        let tmp = site();
        let missing_root = ConfigFile {
            site_root: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(DeployConfig::resolve(missing_root, Overrides::default(), tmp.path()).is_err());

        let bad_manifest = ConfigFile {
            site_root: Some("public".to_string()),
            manifest_name: Some("sub/.checksums".to_string()),
            ..Default::default()
        };
        assert!(DeployConfig::resolve(bad_manifest, Overrides::default(), tmp.path()).is_err());
    }

    #[test]
    fn test_destination_required_for_target() {
        let tmp = site();
        let file = ConfigFile {
            site_root: Some("public".to_string()),
            ..Default::default()
        };
        let config = DeployConfig::resolve(file, Overrides::default(), tmp.path()).unwrap();
        assert!(config.destination().is_err());
        assert!(config.target(false).is_err());
    }

    #[test]
    fn test_target_carries_policy() {
        let tmp = site();
        let file = ConfigFile {
            site_root: Some("public".to_string()),
            destination: Some("file:///srv/preview".parse().unwrap()),
            exclude: vec!["drafts/*".to_string()],
            public: Some(false),
            staging_root: Some("stage".to_string()),
            ..Default::default()
        };
        let config = DeployConfig::resolve(file, Overrides::default(), tmp.path()).unwrap();
        let target = config.target(true).unwrap();
        assert!(target.dry_run);
        assert_eq!(target.acl, Acl::Private);
        assert_eq!(target.exclude, vec!["drafts/*".to_string()]);
        assert_eq!(target.staging_dir, tmp.path().join("stage").join("local_preview"));
    }
}
