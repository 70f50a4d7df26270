#![deny(clippy::cargo)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::nursery)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![deny(clippy::suspicious)]
#![deny(clippy::pedantic)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tabled::Tabled;
use thiserror::Error;
use uuid::Uuid;

pub mod app;
pub mod backends;
pub mod media;
pub mod search;
pub mod setup;
pub mod ui;

// More convenient Result type
pub type Result<T> = std::result::Result<T, NoteError>;

/// Globally unique note identifier, minted once at creation and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First block of the hyphenated form. Enough to tell notes apart in a table
    #[must_use]
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(8).collect()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Name of an audio side file. The note does not own the file, it only refers to it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFileName(String);

impl AudioFileName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single note as it is kept in memory and written to the notes document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(rename = "imageData", default, with = "image_data")]
    pub image: Option<Vec<u8>>,
    #[serde(rename = "audioFileName", default)]
    pub audio_file_name: Option<AudioFileName>,
}

impl Note {
    /// Turns user input into a note with a freshly minted ID
    #[must_use]
    pub fn from_draft(draft: NoteDraft) -> Self {
        Self {
            id: NoteId::new(),
            title: draft.title,
            content: draft.content,
            category: draft.category,
            image: draft.image,
            audio_file_name: draft.audio_file_name,
        }
    }
}

// Everything the user types or attaches before the note gets an ID
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category: String,
    pub image: Option<Vec<u8>>,
    pub audio_file_name: Option<AudioFileName>,
}

// Row shown in note tables. Never persisted
#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    #[tabled(rename = "#")]
    pub position: usize,
    pub id: String,
    pub title: String,
    pub category: String,
    pub image: String,
    pub audio: String,
}

impl NoteSummary {
    #[must_use]
    pub fn new(position: usize, note: &Note) -> Self {
        Self {
            position,
            id: note.id.short(),
            title: note.title.clone(),
            category: note.category.clone(),
            image: if note.image.is_some() { "yes" } else { "-" }.to_string(),
            audio: note
                .audio_file_name
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
        }
    }
}

/// Trait to be implemented by all backends that keep the note collection durable
///
/// Backends always deal in the whole collection: every save replaces what was stored before.
pub trait NoteBackend {
    /// Reads the stored collection in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has been stored yet or the stored data cannot be read
    fn load(&self) -> Result<Vec<Note>>;

    /// Replaces the stored collection with `notes`
    ///
    /// A failed or interrupted save must leave the previously stored collection readable.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection could not be serialized or written
    fn save(&self, notes: &[Note]) -> Result<()>;

    /// Human readable location of the stored collection, used in log lines
    fn location(&self) -> String;
}

// Enum for all possible errors in this crate
#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Menu(#[from] MenuError),
}

// Misuse of the note store by its caller. The store is left unchanged
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A note with ID {0} already exists")]
    DuplicateId(NoteId),

    #[error("No note at position {index}. The collection holds {len} notes")]
    IndexOutOfRange { index: usize, len: usize },
}

// Enum for all possible load and persistence errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Notes document not found at '{0}'")]
    DocumentMissing(PathBuf),

    #[error("Notes document is not valid: {0}")]
    DocumentCorrupted(serde_json::Error),

    #[error("Notes document lists note ID {0} more than once")]
    DuplicateNoteId(NoteId),

    #[error("Failed serializing notes: {0}")]
    Serialization(serde_json::Error),

    #[error("Failed creating directory for notes: {0}")]
    DirectoryCreationError(io::Error),

    #[error("Failed creating temporary file for notes: {0}")]
    FileCreationError(io::Error),

    #[error("Failed writing notes document: {0}")]
    FileWriteError(io::Error),

    #[error("Failed reading notes document: {0}")]
    FileReadError(io::Error),

    #[error("Stored note is improperly formatted: {0}")]
    NoteCorrupted(String),

    #[error("Database is locked or busy")]
    DatabaseBusy,

    #[error("Database file is not a valid SQLite database")]
    NotADatabase,

    #[error("Database schema has changed unexpectedly")]
    SchemaChanged,

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error(transparent)]
    Other(#[from] anyhow::Error), // Used as fallback
}

// Enum for all possible image and audio file errors
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Audio file '{0}' does not exist")]
    DanglingAudioReference(AudioFileName),

    #[error("'{0}' is not a plain audio file name")]
    InvalidAudioFileName(AudioFileName),

    #[error("Failed creating audio directory: {0}")]
    DirectoryCreationError(io::Error),

    #[error("Failed writing audio file: {0}")]
    AudioWriteError(io::Error),

    #[error("Failed reading audio directory: {0}")]
    DirectoryReadError(io::Error),

    #[error("Failed reading image: {0}")]
    ImageReadError(io::Error),

    #[error("Image file is empty")]
    EmptyImage,
}

// Enum for all possible menu input errors
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Failed to read from stdin: {0}")]
    StdinReadError(io::Error),

    #[error("Couldn't convert '{0}' to a number. Please enter a number 1-8")]
    ParseError(String),

    #[error("Couldn't convert '{0}' to a MenuOption. Please enter a number 1-8")]
    InvalidOption(u8),

    #[error("Failed writing to stdout")]
    StdoutWriteError(io::Error),

    #[error("Input ended")]
    EndOfInput,
}

// Inline images are stored as base64 text since JSON has no binary type
mod image_data {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        image: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match image {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note_with_attachments() -> Note {
        Note {
            id: NoteId::new(),
            title: "Shopping".to_string(),
            content: "milk".to_string(),
            category: "Home".to_string(),
            image: Some(vec![0x89, b'P', b'N', b'G', 0, 255]),
            audio_file_name: Some(AudioFileName::new("clip.m4a")),
        }
    }

    #[test]
    fn given_note_when_serializing_then_uses_documented_field_names() {
        let note = note_with_attachments();

        let value = serde_json::to_value(&note).unwrap();

        assert_eq!(value["id"], json!(note.id.to_string()));
        assert_eq!(value["title"], json!("Shopping"));
        assert_eq!(value["content"], json!("milk"));
        assert_eq!(value["category"], json!("Home"));
        assert_eq!(value["imageData"], json!("iVBORwD/"));
        assert_eq!(value["audioFileName"], json!("clip.m4a"));
    }

    #[test]
    fn given_note_without_attachments_when_serializing_then_writes_null() {
        let mut note = note_with_attachments();
        note.image = None;
        note.audio_file_name = None;

        let value = serde_json::to_value(&note).unwrap();

        assert!(value["imageData"].is_null());
        assert!(value["audioFileName"].is_null());
    }

    #[test]
    fn given_record_missing_optional_fields_when_deserializing_then_they_are_absent() {
        let record = json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "title": "",
            "content": "",
            "category": ""
        });

        let note: Note = serde_json::from_value(record).unwrap();

        assert_eq!(note.image, None);
        assert_eq!(note.audio_file_name, None);
        assert_eq!(note.id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn given_invalid_base64_image_when_deserializing_then_fails() {
        let record = json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "title": "t",
            "content": "c",
            "category": "k",
            "imageData": "not base64!!"
        });

        assert!(serde_json::from_value::<Note>(record).is_err());
    }

    #[test]
    fn given_draft_when_creating_notes_then_each_gets_a_fresh_id() {
        let first = Note::from_draft(NoteDraft::default());
        let second = Note::from_draft(NoteDraft::default());

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn given_id_text_when_parsing_then_round_trips() {
        let id = NoteId::new();

        let parsed: NoteId = id.to_string().parse().unwrap();

        assert_eq!(parsed, id);
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn given_note_when_summarizing_then_marks_attachments() {
        let note = note_with_attachments();

        let summary = NoteSummary::new(3, &note);

        assert_eq!(summary.position, 3);
        assert_eq!(summary.title, "Shopping");
        assert_eq!(summary.image, "yes");
        assert_eq!(summary.audio, "clip.m4a");
    }
}
