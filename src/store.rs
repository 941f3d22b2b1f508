//! File persistence: the feed itself and the `item.json` hand-off between
//! the `generate` and `update` steps. Every write goes through a temporary
//! file in the target directory that is renamed over the target.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::article::{is_known_category, Article};
use crate::feed::{FeedDocument, FeedError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} not found, run `generate` first", .0.display())]
    MissingItem(PathBuf),
    #[error("{} is not a valid article: {source}", .path.display())]
    InvalidItem {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid category '{0}' in article")]
    InvalidCategory(String),
    #[error("feed {}: {source}", .path.display())]
    Feed {
        path: PathBuf,
        #[source]
        source: FeedError,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load the feed at `path`. A missing file is not an error and yields `None`.
pub fn load_feed(path: &Path) -> Result<Option<FeedDocument>, StoreError> {
    let xml = match std::fs::read_to_string(path) {
        Ok(xml) => xml,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path)(e)),
    };
    let doc = FeedDocument::parse(&xml).map_err(|source| StoreError::Feed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(doc))
}

/// Serialize and atomically replace the feed at `path`.
pub fn write_feed(path: &Path, doc: &FeedDocument) -> Result<(), StoreError> {
    let xml = doc.to_xml().map_err(|source| StoreError::Feed {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, xml.as_bytes())
}

pub fn write_item(path: &Path, article: &Article) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(article).map_err(|source| StoreError::InvalidItem {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &json)
}

pub fn read_item(path: &Path) -> Result<Article, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::MissingItem(path.to_path_buf()))
        }
        Err(e) => return Err(io_error(path)(e)),
    };
    let article: Article = serde_json::from_str(&content).map_err(|source| StoreError::InvalidItem {
        path: path.to_path_buf(),
        source,
    })?;
    if !is_known_category(&article.category) {
        return Err(StoreError::InvalidCategory(article.category));
    }
    Ok(article)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
    temp.write_all(contents).map_err(io_error(path))?;
    if let Some(permissions) = target_permissions(path) {
        temp.as_file().set_permissions(permissions).map_err(io_error(path))?;
    }
    temp.as_file().sync_all().map_err(io_error(path))?;
    temp.persist(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Temp files are created owner-only; the replacement keeps the target's
/// permissions, or gets 0644 when there is no target yet.
#[cfg(unix)]
fn target_permissions(path: &Path) -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(
        std::fs::metadata(path)
            .map(|m| m.permissions())
            .unwrap_or_else(|_| std::fs::Permissions::from_mode(0o644)),
    )
}

#[cfg(not(unix))]
fn target_permissions(path: &Path) -> Option<std::fs::Permissions> {
    std::fs::metadata(path).map(|m| m.permissions()).ok()
}
