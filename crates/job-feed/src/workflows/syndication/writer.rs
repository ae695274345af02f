use std::fs::{self, File};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("output path '{}' does not name a file", path.display())]
    InvalidPath { path: PathBuf },
    #[error("unable to create output directory '{}': {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("unable to write staging file '{}': {source}", path.display())]
    Stage { path: PathBuf, source: io::Error },
    #[error("unable to replace '{}': {source}", path.display())]
    Replace { path: PathBuf, source: io::Error },
}

/// Replaces the published feed in one step: the document is staged next to
/// the target and renamed over it, so readers see either the old feed or the
/// new one.
#[derive(Debug, Clone)]
pub struct FeedWriter {
    path: PathBuf,
}

impl FeedWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, contents: &str) -> Result<(), WriteError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| WriteError::InvalidPath {
                path: self.path.clone(),
            })?;

        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory).map_err(|source| WriteError::CreateDir {
            path: directory.clone(),
            source,
        })?;

        let staging = directory.join(format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            std::process::id()
        ));

        if let Err(source) = stage(&staging, contents) {
            discard(&staging);
            return Err(WriteError::Stage {
                path: staging,
                source,
            });
        }

        if let Err(source) = fs::rename(&staging, &self.path) {
            discard(&staging);
            return Err(WriteError::Replace {
                path: self.path.clone(),
                source,
            });
        }

        debug!(path = %self.path.display(), bytes = contents.len(), "feed written");
        Ok(())
    }
}

fn stage(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "could not remove staging file");
        }
    }
}
