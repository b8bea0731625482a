//! Local staging of file subsets
//!
//! Upload stages never point the object store at the live site root.
//! Instead the exact files of a stage are copied into a fresh directory,
//! and that directory is what gets uploaded.

use crate::error::{Error, Result};
use crate::pattern::{ExcludeSet, manifest_key};
use stageplan::{FileStager, PathSet, TreeFilter};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Copies site files into staging directories
#[derive(Debug, Clone, Copy, Default)]
pub struct Stager;

impl Stager {
    pub fn new() -> Self {
        Self
    }

    /// Copy exactly `paths` from `source_root` into `dest_dir`
    ///
    /// Returns the number of files copied. Fails on the first path that is
    /// missing, not a regular file, or escapes the root.
    pub fn copy_subset(&self, paths: &PathSet, source_root: &Path, dest_dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(dest_dir)?;

        for key in paths.iter() {
            let rel = relative_path(key)?;
            let source = source_root.join(&rel);
            if !source.is_file() {
                return Err(Error::CopyFailed {
                    path: source,
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "not a regular file",
                    ),
                });
            }
            copy_file(&source, &dest_dir.join(&rel))?;
        }

        Ok(paths.len())
    }

    /// Copy every file under `source_root` passing `filter` and not excluded
    pub fn copy_tree(
        &self,
        source_root: &Path,
        filter: TreeFilter,
        exclude: &ExcludeSet,
        dest_dir: &Path,
    ) -> Result<usize> {
        if !source_root.is_dir() {
            return Err(Error::NotADirectory(source_root.to_path_buf()));
        }
        std::fs::create_dir_all(dest_dir)?;

        let mut copied = 0;
        for entry in WalkDir::new(source_root).follow_links(false) {
            let entry = entry.map_err(|e| Error::Walk {
                root: source_root.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = entry.path().strip_prefix(source_root).unwrap_or(entry.path());
            let key = manifest_key(rel);
            if !filter.matches(&key) || exclude.is_excluded(&key) {
                continue;
            }
            copy_file(entry.path(), &dest_dir.join(rel))?;
            copied += 1;
        }

        Ok(copied)
    }

    /// Remove a directory if present and recreate it empty
    pub fn reset_dir(&self, dir: &Path) -> Result<()> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;
        Ok(())
    }
}

impl FileStager for Stager {
    fn stage(&self, paths: &PathSet, source_root: &Path, dest_dir: &Path) -> anyhow::Result<()> {
        self.copy_subset(paths, source_root, dest_dir)?;
        Ok(())
    }

    fn stage_tree(
        &self,
        source_root: &Path,
        filter: TreeFilter,
        exclude: &[String],
        dest_dir: &Path,
    ) -> anyhow::Result<usize> {
        let exclude = ExcludeSet::new(exclude)?;
        Ok(self.copy_tree(source_root, filter, &exclude, dest_dir)?)
    }

    fn reset(&self, dir: &Path) -> anyhow::Result<()> {
        Ok(self.reset_dir(dir)?)
    }
}

/// Turn a manifest key into a relative path that stays under the root
fn relative_path(key: &str) -> Result<PathBuf> {
    let rel = PathBuf::from(key.trim_start_matches("./"));
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || rel.as_os_str().is_empty() {
        return Err(Error::InvalidPath(key.to_string()));
    }
    Ok(rel)
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(source, dest).map_err(|e| Error::CopyFailed {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("site");
        std::fs::create_dir_all(root.join("css")).unwrap();
        std::fs::write(root.join("index.html"), "home").unwrap();
        std::fs::write(root.join("about.html"), "about").unwrap();
        std::fs::write(root.join("css/site.css"), "body {}").unwrap();
        std::fs::write(root.join(".checksums"), "h  ./index.html\n").unwrap();
        tmp
    }

    #[test]
    fn test_copy_subset() {
        let tmp = site();
        let dest = tmp.path().join("stage");
        let paths: PathSet = ["./css/site.css", "./index.html"].into_iter().collect();

        let copied = Stager::new()
            .copy_subset(&paths, &tmp.path().join("site"), &dest)
            .unwrap();
        assert_eq!(copied, 2);
        assert_eq!(std::fs::read_to_string(dest.join("css/site.css")).unwrap(), "body {}");
        assert!(dest.join("index.html").exists());
        assert!(!dest.join("about.html").exists());
    }

    #[test]
    fn test_copy_subset_missing_file_fails() {
        let tmp = site();
        let paths: PathSet = ["./nope.css"].into_iter().collect();
        let err = Stager::new()
            .copy_subset(&paths, &tmp.path().join("site"), &tmp.path().join("stage"))
            .unwrap_err();
        assert!(matches!(err, Error::CopyFailed { .. }));
    }

    #[test]
    fn test_copy_subset_rejects_escaping_paths() {
        let tmp = site();
        let paths: PathSet = ["./../outside"].into_iter().collect();
        let err = Stager::new()
            .copy_subset(&paths, &tmp.path().join("site"), &tmp.path().join("stage"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn test_copy_tree_filters() {
        let tmp = site();
        let root = tmp.path().join("site");
        let exclude = ExcludeSet::new(&[".checksums"]).unwrap();

        let html = tmp.path().join("html");
        let copied = Stager::new()
            .copy_tree(&root, TreeFilter::Html, &exclude, &html)
            .unwrap();
        assert_eq!(copied, 2);
        assert!(html.join("about.html").exists());
        assert!(!html.join("css/site.css").exists());

        let assets = tmp.path().join("assets");
        let copied = Stager::new()
            .copy_tree(&root, TreeFilter::NonHtml, &exclude, &assets)
            .unwrap();
        assert_eq!(copied, 1);
        assert!(assets.join("css/site.css").exists());
        assert!(!assets.join(".checksums").exists());
    }

    #[test]
    fn test_reset_dir_clears_previous_run() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("staging");
        std::fs::create_dir_all(dir.join("00-new-assets")).unwrap();
        std::fs::write(dir.join("00-new-assets/left.css"), "x").unwrap();

        Stager::new().reset_dir(&dir).unwrap();
        assert!(dir.exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_file_stager_trait() {
        let tmp = site();
        let stager: &dyn FileStager = &Stager::new();
        let paths: PathSet = ["./about.html"].into_iter().collect();
        stager
            .stage(&paths, &tmp.path().join("site"), &tmp.path().join("stage"))
            .unwrap();
        assert!(tmp.path().join("stage/about.html").exists());
    }
}
