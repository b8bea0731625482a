//! # sitefs
//!
//! Local filesystem side of a sitepush deploy.
//!
//! This crate provides functionality to:
//! - Walk a site tree and compute BLAKE3 hashes for all files
//! - Read and write the checksum manifest kept at the site root
//! - Copy exact file subsets into staging directories before upload
//!
//! ## Example
//!
//! ```no_run
//! use sitefs::{Stager, TreeHasher};
//! use std::path::Path;
//!
//! let hasher = TreeHasher::new(&["drafts/*"], ".checksums")?;
//! let snapshot = hasher.write_manifest(Path::new("public"))?;
//! println!("{} files hashed", snapshot.len());
//!
//! let paths = snapshot.paths().collect();
//! Stager::new().copy_subset(&paths, Path::new("public"), Path::new("/tmp/stage"))?;
//! # Ok::<(), sitefs::Error>(())
//! ```

mod error;
mod hasher;
mod pattern;
mod stager;

pub use error::{Error, Result};
pub use hasher::{TreeHasher, hash_file};
pub use pattern::{ExcludeSet, manifest_key};
pub use stager::Stager;
