//! URL to filesystem path resolution.
//!
//! Every request is resolved against the served root and re-read from disk;
//! nothing is cached.

use std::fs;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::utils::mime;

/// Files served for a directory request, in order of preference.
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Why a request path could not be served.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("not found")]
    NotFound,

    #[error("path escapes the served root")]
    Forbidden,
}

impl ResolveError {
    /// HTTP status code for this error.
    pub const fn status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden => 403,
        }
    }
}

/// A file under the served root, ready to be sent.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    /// Canonical path, guaranteed to be under the served root
    pub path: PathBuf,
    /// Size in bytes at resolution time
    pub size: u64,
    pub content_type: &'static str,
    /// HTML documents get the reload script injected
    pub inject: bool,
}

/// Resolve a request URL to a file under `root`.
///
/// `root` must already be canonical. Directories resolve to their index file.
///
/// Order of checks:
/// 1. the joined path must exist (`NotFound`)
/// 2. its canonical form must stay under `root` (`Forbidden`)
///
/// The containment check runs on the canonical path so `..` segments,
/// percent-encoded dots and symlinks pointing outside are all caught.
pub fn resolve_path(url: &str, root: &Path) -> Result<ResolvedFile, ResolveError> {
    let clean = normalize_url(url);
    let relative = Path::new(&clean);

    if relative
        .components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
    {
        return Err(ResolveError::Forbidden);
    }

    let mut canonical = contain(&root.join(relative), root)?;

    if canonical.is_dir() {
        let index = INDEX_FILES
            .iter()
            .map(|name| canonical.join(name))
            .find(|path| path.is_file())
            .ok_or(ResolveError::NotFound)?;
        // The index file itself may be a symlink
        canonical = contain(&index, root)?;
    }

    let metadata = fs::metadata(&canonical).map_err(|_| ResolveError::NotFound)?;
    if !metadata.is_file() {
        return Err(ResolveError::NotFound);
    }

    let content_type = mime::from_path(&canonical);
    Ok(ResolvedFile {
        size: metadata.len(),
        content_type,
        inject: mime::is_html(content_type),
        path: canonical,
    })
}

/// Canonicalize `path` and require it to be `root` or nested under it.
fn contain(path: &Path, root: &Path) -> Result<PathBuf, ResolveError> {
    let canonical = path.canonicalize().map_err(|_| ResolveError::NotFound)?;

    if !canonical.starts_with(root) {
        return Err(ResolveError::Forbidden);
    }

    Ok(canonical)
}

/// Normalize URL: strip query and fragment, decode, trim slashes
fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.trim_matches('/').to_string()
}
