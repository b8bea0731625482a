use std::path::Path;

use stageplan::{Acl, CopyOptions, SyncOptions};

use crate::error::Result;

pub mod local;
#[cfg(feature = "s3cmd")]
pub mod s3cmd;

/// Backend trait for object store operations
///
/// Keys passed to a backend are already normalized: relative to the
/// destination root, `/`-separated, without a leading `./`.
///
/// This trait abstracts the underlying implementation, allowing us to:
/// - Shell out to s3cmd for real buckets
/// - Use a plain directory for previews and tests
pub trait Backend: Send + Sync {
    /// Short name shown in diagnostics
    fn name(&self) -> &'static str;

    /// Check that the backend can be used, returning a version or location
    fn check(&self) -> Result<String>;

    /// Upload the contents of `source` into the destination root
    fn put(&self, source: &Path, options: &CopyOptions) -> Result<()>;

    /// Delete objects (or whole prefixes when `recursive`)
    fn delete(&self, keys: &[String], recursive: bool) -> Result<()>;

    /// Make the destination mirror `source`
    fn sync(&self, source: &Path, options: &SyncOptions) -> Result<()>;

    /// Change the ACL of one object
    fn set_acl(&self, key: &str, acl: Acl) -> Result<()>;

    /// Read one object, `None` if it does not exist
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}
