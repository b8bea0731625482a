//! Local directory backend.
//!
//! Treats a directory as the bucket: object keys are relative file paths
//! under the root. ACLs have no filesystem meaning and are only recorded in
//! memory so callers (and tests) can inspect them.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use glob::Pattern;
use stageplan::{Acl, CopyOptions, SyncOptions};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::Backend;

/// Backend storing objects as files under a root directory.
pub struct LocalBackend {
    root: PathBuf,
    acls: Mutex<HashMap<String, Acl>>,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            acls: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// ACL last recorded for `key`, if any.
    pub fn acl_of(&self, key: &str) -> Option<Acl> {
        self.acls.lock().ok()?.get(key).copied()
    }

    fn record_acl(&self, key: &str, acl: Option<Acl>) {
        if let (Some(acl), Ok(mut acls)) = (acl, self.acls.lock()) {
            acls.insert(key.to_string(), acl);
        }
    }

    fn forget_acl(&self, key: &str) {
        if let Ok(mut acls) = self.acls.lock() {
            acls.retain(|k, _| k != key && !k.starts_with(&format!("{key}/")));
        }
    }

    fn copy_in(&self, source: &Path, key: &str, acl: Option<Acl>) -> Result<()> {
        let dest = self.root.join(key);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source, &dest)?;
        self.record_acl(key, acl);
        Ok(())
    }
}

/// Compiled include/exclude filters with s3cmd semantics: a key is skipped
/// when it matches an exclude and no include.
struct Filter {
    exclude: Vec<Pattern>,
    include: Vec<Pattern>,
}

impl Filter {
    fn new(exclude: &[String], include: &[String]) -> Result<Self> {
        Ok(Self {
            exclude: compile(exclude)?,
            include: compile(include)?,
        })
    }

    fn skips(&self, key: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(key)) && !self.include.iter().any(|p| p.matches(key))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p.trim_start_matches("./")).map_err(|e| Error::InvalidPattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// List (key, path) of regular files under `dir`.
fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let walker = WalkDir::new(dir).follow_links(false).sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            Error::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        files.push((key, entry.path().to_path_buf()));
    }
    Ok(files)
}

fn require_dir(source: &Path) -> Result<()> {
    if source.is_dir() {
        Ok(())
    } else {
        Err(Error::NotFound(source.display().to_string()))
    }
}

impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn check(&self) -> Result<String> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(Error::InvalidDestination(format!(
                "file://{} is not a directory",
                self.root.display()
            )));
        }
        Ok(format!("directory {}", self.root.display()))
    }

    fn put(&self, source: &Path, options: &CopyOptions) -> Result<()> {
        require_dir(source)?;
        // s3cmd refuses a directory source without --recursive
        if !options.recursive {
            return Err(Error::NotRecursive(source.to_path_buf()));
        }
        let filter = Filter::new(&options.exclude, &options.include)?;

        for (key, path) in list_files(source)? {
            if filter.skips(&key) {
                continue;
            }
            self.copy_in(&path, &key, options.acl)?;
        }
        Ok(())
    }

    fn delete(&self, keys: &[String], recursive: bool) -> Result<()> {
        for key in keys {
            let path = self.root.join(key);
            if path.is_dir() {
                if !recursive {
                    return Err(Error::InvalidKey(format!("{key} is a prefix, not an object")));
                }
                std::fs::remove_dir_all(&path)?;
            } else if path.exists() {
                std::fs::remove_file(&path)?;
            }
            self.forget_acl(key);
        }
        Ok(())
    }

    fn sync(&self, source: &Path, options: &SyncOptions) -> Result<()> {
        require_dir(source)?;
        let filter = Filter::new(&options.exclude, &[])?;

        let mut local = BTreeSet::new();
        for (key, path) in list_files(source)? {
            if filter.skips(&key) {
                continue;
            }
            self.copy_in(&path, &key, options.acl)?;
            local.insert(key);
        }

        if options.delete && self.root.is_dir() {
            for (key, path) in list_files(&self.root)? {
                if !local.contains(&key) && !filter.skips(&key) {
                    std::fs::remove_file(&path)?;
                    self.forget_acl(&key);
                }
            }
        }
        Ok(())
    }

    fn set_acl(&self, key: &str, acl: Acl) -> Result<()> {
        if !self.root.join(key).is_file() {
            return Err(Error::NotFound(key.to_string()));
        }
        self.record_acl(key, Some(acl));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.root.join(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn setup() -> (TempDir, PathBuf, LocalBackend) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        write(&source, "index.html", "home");
        write(&source, "css/site.css", "body {}");
        write(&source, "drafts/wip.html", "wip");
        let backend = LocalBackend::new(tmp.path().join("bucket"));
        (tmp, source, backend)
    }

    #[test]
    fn test_put_recursive_with_acl() {
        let (_tmp, source, backend) = setup();
        let options = CopyOptions {
            recursive: true,
            acl: Some(Acl::Public),
            ..Default::default()
        };
        backend.put(&source, &options).unwrap();

        assert_eq!(backend.get("css/site.css").unwrap().unwrap(), b"body {}");
        assert_eq!(backend.acl_of("index.html"), Some(Acl::Public));
    }

    #[test]
    fn test_put_directory_requires_recursive() {
        let (_tmp, source, backend) = setup();
        let err = backend.put(&source, &CopyOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NotRecursive(_)));
        assert!(backend.get("index.html").unwrap().is_none());
    }

    #[test]
    fn test_put_exclude_and_include() {
        let (_tmp, source, backend) = setup();
        let options = CopyOptions {
            exclude: vec!["*".to_string()],
            include: vec!["*.html".to_string()],
            recursive: true,
            acl: None,
        };
        backend.put(&source, &options).unwrap();
        assert!(backend.get("index.html").unwrap().is_some());
        assert!(backend.get("drafts/wip.html").unwrap().is_some());
        assert!(backend.get("css/site.css").unwrap().is_none());
    }

    #[test]
    fn test_delete_objects_and_prefixes() {
        let (_tmp, source, backend) = setup();
        let options = CopyOptions {
            recursive: true,
            ..Default::default()
        };
        backend.put(&source, &options).unwrap();

        backend.delete(&["index.html".to_string(), "missing".to_string()], false).unwrap();
        assert!(backend.get("index.html").unwrap().is_none());

        assert!(backend.delete(&["css".to_string()], false).is_err());
        backend.delete(&["css".to_string()], true).unwrap();
        assert!(backend.get("css/site.css").unwrap().is_none());
    }

    #[test]
    fn test_sync_mirrors_and_keeps_excluded() {
        let (tmp, source, backend) = setup();
        write(backend.root(), "stale.html", "old");
        write(backend.root(), ".checksums", "manifest");

        let options = SyncOptions {
            delete: true,
            exclude: vec![".checksums".to_string(), "drafts/*".to_string()],
            acl: Some(Acl::Public),
        };
        backend.sync(&source, &options).unwrap();

        assert!(backend.get("stale.html").unwrap().is_none());
        assert!(backend.get(".checksums").unwrap().is_some());
        assert!(backend.get("drafts/wip.html").unwrap().is_none());
        assert!(backend.get("css/site.css").unwrap().is_some());
        drop(tmp);
    }

    #[test]
    fn test_set_acl_requires_object() {
        let (_tmp, source, backend) = setup();
        assert!(backend.set_acl("index.html", Acl::Private).unwrap_err().is_not_found());

        let options = CopyOptions {
            recursive: true,
            ..Default::default()
        };
        backend.put(&source, &options).unwrap();
        backend.set_acl("index.html", Acl::Private).unwrap();
        assert_eq!(backend.acl_of("index.html"), Some(Acl::Private));
    }

    #[test]
    fn test_missing_source_dir() {
        let (tmp, _source, backend) = setup();
        let err = backend
            .put(&tmp.path().join("nope"), &CopyOptions::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
