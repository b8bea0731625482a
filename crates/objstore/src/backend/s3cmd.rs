//! s3cmd backend implementation.
//!
//! Shells out to the `s3cmd` CLI for every bucket operation. Credentials and
//! endpoint come from the s3cmd config file (`~/.s3cfg` unless overridden).

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use stageplan::{Acl, CopyOptions, SyncOptions};

use crate::error::{Error, Result};
use crate::types::{Destination, S3cmdOptions};

use super::Backend;

/// Backend implementation using the s3cmd CLI.
///
/// ## Commands used
///
/// - `s3cmd put --recursive <dir>/ s3://bucket/prefix/` - upload a staged tree
/// - `s3cmd del [--recursive] <uri>...` - delete objects
/// - `s3cmd sync --delete-removed <dir>/ s3://bucket/prefix/` - mirror a tree
/// - `s3cmd setacl --acl-private <uri>` - change one object's ACL
/// - `s3cmd get <uri> -` - read one object to stdout
pub struct S3cmdBackend {
    binary: PathBuf,
    config_file: Option<PathBuf>,
    root_uri: String,
}

impl S3cmdBackend {
    /// Create a backend targeting an `s3://` destination.
    pub fn new(destination: &Destination, options: &S3cmdOptions) -> Result<Self> {
        if destination.is_local() {
            return Err(Error::InvalidDestination(destination.to_string()));
        }
        Ok(Self {
            binary: options.binary.clone(),
            config_file: options.config_file.clone(),
            root_uri: destination.root_uri(),
        })
    }

    fn uri(&self, key: &str) -> String {
        format!("{}{key}", self.root_uri)
    }

    /// Build the argument list for a command, including the config file.
    fn args<I, S>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut all = Vec::new();
        if let Some(config) = &self.config_file {
            all.push(OsString::from("-c"));
            all.push(config.clone().into_os_string());
        }
        all.extend(args.into_iter().map(Into::into));
        all
    }

    /// Run s3cmd and return its stdout.
    fn run(&self, args: &[OsString]) -> Result<Vec<u8>> {
        let command = self.render(args);
        log::debug!("running: {command}");

        let output = Command::new(&self.binary).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::S3cmdNotFound(self.binary.clone())
            } else {
                Error::Io(e)
            }
        })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(parse_s3cmd_error(command, stderr))
        }
    }

    fn render(&self, args: &[OsString]) -> String {
        let mut rendered = self.binary.display().to_string();
        for arg in args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}

/// Directory argument with a trailing slash so s3cmd uploads its contents.
fn dir_arg(source: &Path) -> OsString {
    let mut arg = source.as_os_str().to_os_string();
    if !arg.to_string_lossy().ends_with('/') {
        arg.push("/");
    }
    arg
}

fn acl_flag(acl: Acl) -> &'static str {
    match acl {
        Acl::Public => "--acl-public",
        Acl::Private => "--acl-private",
    }
}

fn filter_args(args: &mut Vec<String>, flag: &str, patterns: &[String]) {
    for pattern in patterns {
        args.push(flag.to_string());
        args.push(pattern.clone());
    }
}

/// Parse s3cmd error output into specific error types.
fn parse_s3cmd_error(command: String, stderr: String) -> Error {
    if stderr.contains("404") || stderr.contains("NoSuchKey") || stderr.contains("does not exist")
    {
        Error::NotFound(command)
    } else if stderr.contains("403") || stderr.contains("AccessDenied") {
        Error::PermissionDenied(stderr)
    } else {
        Error::CommandFailed { command, stderr }
    }
}

impl S3cmdBackend {
    fn put_args(&self, source: &Path, options: &CopyOptions) -> Vec<OsString> {
        let mut args = vec!["put".to_string()];
        if options.recursive {
            args.push("--recursive".to_string());
        }
        if let Some(acl) = options.acl {
            args.push(acl_flag(acl).to_string());
        }
        filter_args(&mut args, "--exclude", &options.exclude);
        filter_args(&mut args, "--include", &options.include);

        let mut args = self.args(args);
        args.push(dir_arg(source));
        args.push(self.root_uri.clone().into());
        args
    }

    fn del_args(&self, keys: &[String], recursive: bool) -> Vec<OsString> {
        let mut args = vec!["del".to_string()];
        if recursive {
            args.push("--recursive".to_string());
        }
        args.extend(keys.iter().map(|k| self.uri(k)));
        self.args(args)
    }

    fn sync_args(&self, source: &Path, options: &SyncOptions) -> Vec<OsString> {
        let mut args = vec!["sync".to_string()];
        if options.delete {
            args.push("--delete-removed".to_string());
        }
        if let Some(acl) = options.acl {
            args.push(acl_flag(acl).to_string());
        }
        filter_args(&mut args, "--exclude", &options.exclude);

        let mut args = self.args(args);
        args.push(dir_arg(source));
        args.push(self.root_uri.clone().into());
        args
    }

    fn setacl_args(&self, key: &str, acl: Acl) -> Vec<OsString> {
        self.args(["setacl".to_string(), acl_flag(acl).to_string(), self.uri(key)])
    }
}

impl Backend for S3cmdBackend {
    fn name(&self) -> &'static str {
        "s3cmd"
    }

    fn check(&self) -> Result<String> {
        let out = self.run(&self.args(["--version"]))?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    fn put(&self, source: &Path, options: &CopyOptions) -> Result<()> {
        self.run(&self.put_args(source, options))?;
        Ok(())
    }

    fn delete(&self, keys: &[String], recursive: bool) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.run(&self.del_args(keys, recursive))?;
        Ok(())
    }

    fn sync(&self, source: &Path, options: &SyncOptions) -> Result<()> {
        self.run(&self.sync_args(source, options))?;
        Ok(())
    }

    fn set_acl(&self, key: &str, acl: Acl) -> Result<()> {
        self.run(&self.setacl_args(key, acl))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.run(&self.args(["get".to_string(), self.uri(key), "-".to_string()])) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
