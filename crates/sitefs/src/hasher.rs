//! Site tree hashing
//!
//! Walks a site root and computes a BLAKE3 hash for every regular file,
//! producing the [`Snapshot`] the planner diffs against the remote manifest.

use crate::error::{Error, Result};
use crate::pattern::{ExcludeSet, manifest_key};
use blake3::Hasher;
use rayon::prelude::*;
use stageplan::{DEFAULT_MANIFEST_NAME, Snapshot};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Hashes a site tree into a snapshot
#[derive(Debug, Clone)]
pub struct TreeHasher {
    exclude: ExcludeSet,
    manifest_name: String,
}

impl TreeHasher {
    /// Create a hasher skipping `exclude` patterns and the manifest file
    pub fn new<S: AsRef<str>>(exclude: &[S], manifest_name: &str) -> Result<Self> {
        Ok(Self {
            exclude: ExcludeSet::new(exclude)?,
            manifest_name: manifest_name.trim_start_matches("./").to_string(),
        })
    }

    /// Path of the manifest file under `root`
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest_name)
    }

    /// Hash every regular file under `root`
    ///
    /// Symlinks are not followed. Keys are `./`-prefixed and `/`-separated.
    pub fn hash_tree(&self, root: &Path) -> Result<Snapshot> {
        let files = self.collect_files(root)?;

        let entries = files
            .par_iter()
            .map(|(key, path)| {
                hash_file(path)
                    .map(|hash| (key.clone(), hash))
                    .map_err(|source| Error::HashFailed {
                        path: path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(entries.into_iter().collect())
    }

    /// Hash the tree and write the manifest file under `root`
    pub fn write_manifest(&self, root: &Path) -> Result<Snapshot> {
        let snapshot = self.hash_tree(root)?;
        self.save_manifest(root, &snapshot)?;
        Ok(snapshot)
    }

    /// Write an already computed snapshot as the manifest file under `root`
    pub fn save_manifest(&self, root: &Path, snapshot: &Snapshot) -> Result<()> {
        std::fs::write(self.manifest_path(root), snapshot.serialize())?;
        Ok(())
    }

    /// Read the manifest file under `root`; missing or unreadable yields empty
    pub fn read_manifest(&self, root: &Path) -> Snapshot {
        std::fs::read(self.manifest_path(root))
            .map(|raw| Snapshot::parse_bytes(&raw))
            .unwrap_or_default()
    }

    /// List (key, absolute path) of every file that should be hashed
    fn collect_files(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        let manifest = format!("./{}", self.manifest_name);
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Walk {
                root: root.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let key = manifest_key(rel);
            if key == manifest || self.exclude.is_excluded(&key) {
                continue;
            }
            files.push((key, entry.path().to_path_buf()));
        }

        Ok(files)
    }
}

impl Default for TreeHasher {
    fn default() -> Self {
        Self {
            exclude: ExcludeSet::default(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }
}

/// Compute the BLAKE3 hash of a file as lowercase hex
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(1024 * 1024, file); // 1MB buffer
    let mut hasher = Hasher::new();

    let mut buffer = [0u8; 65536]; // 64KB chunks
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
