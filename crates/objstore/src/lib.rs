//! # objstore
//!
//! Object storage client used by sitepush to publish a static site.
//!
//! The [`Client`] implements [`stageplan::ObjectStore`], so the stage
//! executor can drive it directly. Site paths (`./css/site.css`) are turned
//! into object keys under the destination prefix (`css/site.css`).
//!
//! ## Example
//!
//! ```no_run
//! use objstore::{Client, Destination, S3cmdOptions};
//! use stageplan::ObjectStore;
//!
//! let dest: Destination = "s3://www.example.com".parse()?;
//! let client = Client::new(&dest, &S3cmdOptions::default())?;
//!
//! if let Some(bytes) = client.get_object("./.checksums")? {
//!     println!("remote manifest is {} bytes", bytes.len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Backends
//!
//! - `s3cmd` (default feature): shells out to the s3cmd CLI for `s3://` destinations
//! - `local`: a directory acting as the bucket, for `file://` destinations

#![deny(unsafe_code)]

/// Backend implementations for object store operations.
pub mod backend;
/// Error types for object store operations.
pub mod error;
/// Destination and backend option types.
pub mod types;

pub use error::{Error, Result};
pub use types::{Destination, S3cmdOptions, object_key};

use backend::Backend;
use stageplan::{Acl, CopyOptions, ObjectStore, PathSet, SyncOptions};
use std::path::Path;

/// High-level client for one deploy destination.
pub struct Client {
    destination: Destination,
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client with the backend matching the destination scheme.
    pub fn new(destination: &Destination, s3cmd: &S3cmdOptions) -> Result<Self> {
        let backend: Box<dyn Backend> = match destination {
            Destination::Local(dir) => Box::new(backend::local::LocalBackend::new(dir)),
            #[cfg(feature = "s3cmd")]
            Destination::S3 { .. } => Box::new(backend::s3cmd::S3cmdBackend::new(destination, s3cmd)?),
            #[cfg(not(feature = "s3cmd"))]
            Destination::S3 { .. } => {
                let _ = s3cmd;
                return Err(Error::InvalidDestination(destination.to_string()));
            }
        };
        Ok(Self::with_backend(destination.clone(), backend))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(destination: Destination, backend: Box<dyn Backend>) -> Self {
        Self {
            destination,
            backend,
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Verify the backend is usable; returns a description for diagnostics.
    pub fn check(&self) -> Result<String> {
        self.backend.check()
    }

    /// Fetch an object by site path, `None` if it does not exist.
    pub fn fetch(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let key = object_key(path)?;
        log::debug!("fetching {}", self.destination.object_uri(&key));
        self.backend.get(&key)
    }
}

impl ObjectStore for Client {
    fn copy(&self, source: &Path, options: &CopyOptions) -> anyhow::Result<()> {
        log::debug!("copy {} -> {}", source.display(), self.destination.root_uri());
        Ok(self.backend.put(source, options)?)
    }

    fn remove(&self, keys: &PathSet, recursive: bool) -> anyhow::Result<()> {
        let keys = keys.iter().map(object_key).collect::<Result<Vec<_>>>()?;
        log::debug!("remove {} objects from {}", keys.len(), self.destination);
        Ok(self.backend.delete(&keys, recursive)?)
    }

    fn sync(&self, source: &Path, options: &SyncOptions) -> anyhow::Result<()> {
        log::debug!("sync {} -> {}", source.display(), self.destination.root_uri());
        Ok(self.backend.sync(source, options)?)
    }

    fn set_acl(&self, key: &str, acl: Acl) -> anyhow::Result<()> {
        let key = object_key(key)?;
        log::debug!("set {acl} on {}", self.destination.object_uri(&key));
        Ok(self.backend.set_acl(&key, acl)?)
    }

    fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.fetch(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local_client(tmp: &TempDir) -> Client {
        let dest: Destination = format!("file://{}", tmp.path().join("bucket").display())
            .parse()
            .unwrap();
        Client::new(&dest, &S3cmdOptions::default()).unwrap()
    }

    #[test]
    fn test_local_destination_uses_local_backend() {
        let tmp = TempDir::new().unwrap();
        let client = local_client(&tmp);
        assert_eq!(client.backend_name(), "local");
        assert!(client.check().is_ok());
    }

    #[cfg(feature = "s3cmd")]
    #[test]
    fn test_s3_destination_uses_s3cmd_backend() {
        let dest: Destination = "s3://bucket".parse().unwrap();
        let client = Client::new(&dest, &S3cmdOptions::default()).unwrap();
        assert_eq!(client.backend_name(), "s3cmd");
    }

    #[test]
    fn test_object_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let stage = tmp.path().join("stage");
        std::fs::create_dir_all(stage.join("css")).unwrap();
        std::fs::write(stage.join("css/site.css"), "body {}").unwrap();
        std::fs::write(stage.join(".checksums"), "h  ./css/site.css\n").unwrap();

        let client = local_client(&tmp);
        assert!(client.get_object("./.checksums").unwrap().is_none());

        let options = CopyOptions {
            recursive: true,
            acl: Some(Acl::Public),
            ..Default::default()
        };
        client.copy(&stage, &options).unwrap();
        client.set_acl("./.checksums", Acl::Private).unwrap();
        assert_eq!(
            client.get_object("./.checksums").unwrap().unwrap(),
            b"h  ./css/site.css\n"
        );

        let keys: PathSet = ["./css/site.css"].into_iter().collect();
        client.remove(&keys, false).unwrap();
        assert!(client.get_object("./css/site.css").unwrap().is_none());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        let client = local_client(&tmp);
        let keys: PathSet = ["./../escape"].into_iter().collect();
        assert!(client.remove(&keys, false).is_err());
        assert!(client.set_acl("./", Acl::Private).is_err());
    }
}
