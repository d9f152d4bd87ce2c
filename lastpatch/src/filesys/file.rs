//! File operations

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::errors::LastPatchError;

/// A file wrapper with path
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    /// Create a new file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    /// Read file contents as string
    pub async fn read_string(&self) -> Result<String, LastPatchError> {
        let mut file = fs::File::open(&self.path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;
        Ok(contents)
    }

    /// Read file as JSON
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, LastPatchError> {
        let contents = self.read_string().await?;
        let value = serde_json::from_str(&contents)?;
        Ok(value)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Sibling path for a temporary file, unique per call so concurrent runs
    /// never share one
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        self.parent_dir()
            .join(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
    }

    /// Fail early when the file could not be written later
    pub async fn ensure_writable(&self) -> Result<(), LastPatchError> {
        if let Ok(meta) = fs::metadata(&self.path).await {
            if meta.is_dir() {
                return Err(LastPatchError::ConfigError(format!(
                    "{} is a directory",
                    self.path.display()
                )));
            }
        }

        let probe = self.temp_path();
        fs::File::create(&probe).await.map_err(|e| {
            LastPatchError::ConfigError(format!(
                "Cannot write to {}: {e}",
                self.parent_dir().display()
            ))
        })?;
        fs::remove_file(&probe).await?;
        Ok(())
    }

    /// Atomic write using a temporary file.
    ///
    /// The destination either keeps its previous contents or receives the
    /// complete new contents. The temporary file is removed on failure and
    /// when the returned future is dropped before the rename.
    pub async fn write_atomic(&self, contents: &[u8]) -> Result<(), LastPatchError> {
        // created synchronously: an in-flight create could outlive the guard
        let (temp, file) = TempFile::create(self.temp_path())?;
        debug!("Writing {} bytes via {}", contents.len(), temp.path.display());

        let mut file = fs::File::from_std(file);
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp.path, &self.path).await?;
        temp.persist();
        Ok(())
    }
}

/// Temporary sibling file, removed on drop unless persisted
struct TempFile {
    path: PathBuf,
    persisted: bool,
}

impl TempFile {
    fn create(path: PathBuf) -> Result<(Self, std::fs::File), LastPatchError> {
        let file = std::fs::File::create(&path)?;
        Ok((
            Self {
                path,
                persisted: false,
            },
            file,
        ))
    }

    fn persist(mut self) {
        self.persisted = true;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}
