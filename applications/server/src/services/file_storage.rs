/// File storage service - manages audio files on disk
///
/// Audio files live flat in `<base>/MusicFiles`. Tracks reference them by
/// absolute path once created.
use crate::error::{Result, ServerError};
use bytes::Bytes;
use cadence_core::trim_locator;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;

const MUSIC_DIR: &str = "MusicFiles";

/// Staged uploads keep the extension so probing detects the format
const UPLOAD_SUFFIX: &str = ".mp3";

#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Directory holding the audio files
    pub fn music_dir(&self) -> PathBuf {
        self.base_path.join(MUSIC_DIR)
    }

    /// Initialize storage directories
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(self.music_dir()).await?;
        Ok(())
    }

    /// Path a client-supplied file name refers to
    ///
    /// Only bare file names are accepted; anything with a directory
    /// component is rejected.
    pub fn resolve_file_name(&self, file_name: &str) -> Result<PathBuf> {
        let file_name = sanitize_file_name(file_name)?;
        Ok(self.music_dir().join(file_name))
    }

    /// Write an upload under a temporary name next to its final location
    ///
    /// Fails with `Conflict` when `file_name` is already taken. The returned
    /// `StagedUpload` removes its temporary file unless it is persisted.
    pub async fn stage_upload(&self, file_name: &str, data: Bytes) -> Result<StagedUpload> {
        let target = self.resolve_file_name(file_name)?;
        if fs::try_exists(&target).await? {
            return Err(file_exists(&target));
        }

        let music_dir = self.music_dir();
        fs::create_dir_all(&music_dir).await?;

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix(".upload-")
                .suffix(UPLOAD_SUFFIX)
                .tempfile_in(&music_dir)?;
            file.write_all(&data)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| ServerError::Internal(format!("upload task failed: {}", e)))??;

        tracing::debug!(staged = %file.path().display(), target = %target.display(), "Staged upload");
        Ok(StagedUpload { file, target })
    }
}

/// An upload written to a temporary file in the music directory
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedUpload {
    /// Temporary location, readable until the upload is persisted or dropped
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Final location the upload will be moved to
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the upload to its final name
    ///
    /// Never replaces an existing file: if the name was taken since staging,
    /// the temporary file is removed and `Conflict` is returned.
    pub async fn persist(self) -> Result<PathBuf> {
        let Self { file, target } = self;

        tokio::task::spawn_blocking(move || match file.persist_noclobber(&target) {
            Ok(_) => {
                tracing::info!(path = %target.display(), "Stored uploaded file");
                Ok(target)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Err(file_exists(&target)),
            Err(e) => Err(ServerError::Storage(format!(
                "failed to store {}: {}",
                target.display(),
                e.error
            ))),
        })
        .await
        .map_err(|e| ServerError::Internal(format!("upload task failed: {}", e)))?
    }
}

fn file_exists(target: &Path) -> ServerError {
    let name = target
        .file_name()
        .map_or_else(|| target.display().to_string(), |n| n.to_string_lossy().into_owned());
    ServerError::Conflict(format!("A file named {} already exists", name))
}

fn sanitize_file_name(file_name: &str) -> Result<&str> {
    let trimmed = trim_locator(file_name);
    if trimmed.is_empty() {
        return Err(ServerError::BadRequest("File name is required".to_string()));
    }

    let is_bare = Path::new(trimmed)
        .file_name()
        .is_some_and(|name| name == trimmed)
        && !trimmed.contains(['/', '\\']);
    if !is_bare {
        return Err(ServerError::BadRequest(format!(
            "Invalid file name: {}",
            trimmed
        )));
    }

    Ok(trimmed)
}
