use super::{BackendError, Note, NoteBackend, Result};
use log::trace;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Keeps the whole note collection in one JSON document
#[derive(Debug)]
pub struct FilesystemBackend {
    path: PathBuf,
}

impl FilesystemBackend {
    /// Creates a new `FilesystemBackend` for the document at `path`.
    /// Also ensures that the directory holding the document exists.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::DirectoryCreationError` if the parent directory cannot be created
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let backend = Self { path };
        fs::create_dir_all(backend.directory()).map_err(BackendError::DirectoryCreationError)?;
        Ok(backend)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // Directory of the document. A bare file name lives in the working directory
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl NoteBackend for FilesystemBackend {
    /// Reads and parses the notes document.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `BackendError::DocumentMissing` if the document does not exist.
    /// - `BackendError::FileReadError` if the document cannot be read.
    /// - `BackendError::DocumentCorrupted` if the document is not a valid array of notes.
    /// - `BackendError::DuplicateNoteId` if two records share an ID.
    fn load(&self) -> Result<Vec<Note>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BackendError::DocumentMissing(self.path.clone()).into());
            }
            Err(e) => return Err(BackendError::FileReadError(e).into()),
        };
        trace!("Read {} bytes from {}", data.len(), self.path.display());

        let notes: Vec<Note> =
            serde_json::from_slice(&data).map_err(BackendError::DocumentCorrupted)?;

        let mut seen = HashSet::with_capacity(notes.len());
        if let Some(note) = notes.iter().find(|note| !seen.insert(note.id)) {
            return Err(BackendError::DuplicateNoteId(note.id).into());
        }
        Ok(notes)
    }

    /// Writes the whole collection to a temporary file next to the document, flushes it to
    /// disk and renames it over the document. Readers see either the old or the new document.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `BackendError::Serialization` if the notes cannot be serialized.
    /// - `BackendError::FileCreationError` if the temporary file cannot be created.
    /// - `BackendError::FileWriteError` if writing, syncing or renaming fails.
    fn save(&self, notes: &[Note]) -> Result<()> {
        let data = serde_json::to_vec_pretty(notes).map_err(BackendError::Serialization)?;

        let mut temp =
            NamedTempFile::new_in(self.directory()).map_err(BackendError::FileCreationError)?;
        temp.write_all(&data).map_err(BackendError::FileWriteError)?;
        temp.as_file().sync_all().map_err(BackendError::FileWriteError)?;
        trace!("Wrote {} bytes to {}", data.len(), temp.path().display());

        // The temporary file is removed again if the rename fails
        temp.persist(&self.path).map_err(|e| BackendError::FileWriteError(e.error))?;

        // The rename itself only survives a crash once the directory entry is on disk
        #[cfg(unix)]
        fs::File::open(self.directory())
            .and_then(|dir| dir.sync_all())
            .map_err(BackendError::FileWriteError)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
