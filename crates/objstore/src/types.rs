use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Where a site is deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Destination {
    /// An S3 bucket, optionally under a key prefix (no leading/trailing `/`)
    S3 {
        /// Bucket name
        bucket: String,
        /// Key prefix, empty for the bucket root
        prefix: String,
    },
    /// A local directory acting as the bucket
    Local(PathBuf),
}

impl Destination {
    /// Short name identifying the bucket, used to separate staging areas
    pub fn bucket_name(&self) -> String {
        match self {
            Self::S3 { bucket, prefix } if prefix.is_empty() => bucket.clone(),
            Self::S3 { bucket, prefix } => format!("{bucket}_{}", prefix.replace('/', "_")),
            Self::Local(dir) => dir
                .file_name()
                .map(|n| format!("local_{}", n.to_string_lossy()))
                .unwrap_or_else(|| "local".to_string()),
        }
    }

    /// URI of the destination root, with a trailing `/`
    pub fn root_uri(&self) -> String {
        match self {
            Self::S3 { bucket, prefix } if prefix.is_empty() => format!("s3://{bucket}/"),
            Self::S3 { bucket, prefix } => format!("s3://{bucket}/{prefix}/"),
            Self::Local(dir) => format!("file://{}/", dir.display()),
        }
    }

    /// URI of a single object under the destination
    pub fn object_uri(&self, key: &str) -> String {
        format!("{}{key}", self.root_uri())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidDestination(s.to_string());

        if let Some(rest) = s.strip_prefix("s3://") {
            let rest = rest.trim_end_matches('/');
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() || prefix.split('/').any(|p| p == "..") {
                return Err(invalid());
            }
            return Ok(Self::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.trim_matches('/').to_string(),
            });
        }

        if let Some(rest) = s.strip_prefix("file://") {
            let dir = rest.trim_end_matches('/');
            if dir.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Local(PathBuf::from(dir)));
        }

        Err(invalid())
    }
}

impl TryFrom<String> for Destination {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Destination> for String {
    fn from(value: Destination) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3 { bucket, prefix } if prefix.is_empty() => write!(f, "s3://{bucket}"),
            Self::S3 { bucket, prefix } => write!(f, "s3://{bucket}/{prefix}"),
            Self::Local(dir) => write!(f, "file://{}", dir.display()),
        }
    }
}

/// How the s3cmd backend is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3cmdOptions {
    /// Binary to run
    pub binary: PathBuf,
    /// Passed as `-c <file>` when set
    pub config_file: Option<PathBuf>,
}

impl Default for S3cmdOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("s3cmd"),
            config_file: None,
        }
    }
}

/// Turn a site path (`./css/site.css`) into an object key (`css/site.css`)
pub fn object_key(path: &str) -> Result<String> {
    let key = path.trim_start_matches("./").trim_start_matches('/');
    if key.is_empty() || key.split('/').any(|part| part == ".." || part == ".") {
        return Err(Error::InvalidKey(path.to_string()));
    }
    Ok(key.to_string())
}
