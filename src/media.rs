use crate::{AudioFileName, MediaError, Note, Result};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DEFAULT_AUDIO_EXTENSION: &str = "m4a";

/// Directory holding recorded audio clips as standalone files.
///
/// Notes only carry the file name; the path is derived from this directory at read time.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    /// Creates the audio directory if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `MediaError::DirectoryCreationError` if the directory cannot be created
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(MediaError::DirectoryCreationError)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies a recorded clip into the store under a fresh unique name
    ///
    /// # Errors
    ///
    /// Returns `MediaError::AudioWriteError` if the clip cannot be copied
    pub fn import(&self, source: &Path) -> Result<AudioFileName> {
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(DEFAULT_AUDIO_EXTENSION);
        let name = Self::fresh_name(extension);

        fs::copy(source, self.dir.join(name.as_str())).map_err(MediaError::AudioWriteError)?;
        debug!("Imported {} as {name}", source.display());
        Ok(name)
    }

    /// Writes an in-memory clip into the store under a fresh unique name
    ///
    /// # Errors
    ///
    /// Returns `MediaError::AudioWriteError` if the clip cannot be written
    pub fn store(&self, bytes: &[u8], extension: &str) -> Result<AudioFileName> {
        let name = Self::fresh_name(extension);
        fs::write(self.dir.join(name.as_str()), bytes).map_err(MediaError::AudioWriteError)?;
        debug!("Stored {} bytes as {name}", bytes.len());
        Ok(name)
    }

    /// Path of the clip called `name`. The file may not exist
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidAudioFileName` if `name` would point outside the store
    pub fn resolve(&self, name: &AudioFileName) -> Result<PathBuf> {
        if !is_plain_file_name(name.as_str()) {
            return Err(MediaError::InvalidAudioFileName(name.clone()).into());
        }
        Ok(self.dir.join(name.as_str()))
    }

    /// Path of the clip called `name`, which must exist
    ///
    /// # Errors
    ///
    /// Returns `MediaError::DanglingAudioReference` if there is no such clip, or
    /// `MediaError::InvalidAudioFileName` if `name` would point outside the store
    pub fn locate(&self, name: &AudioFileName) -> Result<PathBuf> {
        let path = self.resolve(name)?;
        if path.is_file() {
            Ok(path)
        } else {
            warn!("Note refers to missing audio file {name}");
            Err(MediaError::DanglingAudioReference(name.clone()).into())
        }
    }

    /// Audio files in the store that no note in `notes` refers to.
    ///
    /// Deleting a note leaves its clip behind; this only reports such files.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::DirectoryReadError` if the directory cannot be listed
    pub fn orphans(&self, notes: &[Note]) -> Result<Vec<AudioFileName>> {
        let referenced: HashSet<&str> = notes
            .iter()
            .filter_map(|note| note.audio_file_name.as_ref())
            .map(AudioFileName::as_str)
            .collect();

        let mut orphans = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(MediaError::DirectoryReadError)? {
            let entry = entry.map_err(MediaError::DirectoryReadError)?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && !referenced.contains(name)
            {
                orphans.push(AudioFileName::new(name));
            }
        }

        orphans.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(orphans)
    }

    fn fresh_name(extension: &str) -> AudioFileName {
        AudioFileName::new(format!("{}.{extension}", Uuid::new_v4()))
    }
}

// Only a single normal path component is allowed
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

/// Reads an encoded image file into a blob to be embedded in a note
///
/// # Errors
///
/// Returns `MediaError::ImageReadError` if the file cannot be read, or
/// `MediaError::EmptyImage` if it holds no data
pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(MediaError::ImageReadError)?;
    if bytes.is_empty() {
        return Err(MediaError::EmptyImage.into());
    }
    Ok(bytes)
}
