use super::{BackendError, Note, NoteBackend, NoteError, Result};
use crate::{AudioFileName, NoteId};
use rusqlite::{Connection, Error as SqliteError, ErrorCode, params};
use std::path::Path;

#[derive(Debug)]
pub struct SqliteBackend {
    connection: Connection,
    path: String,
}

// A row as stored, before the ID is parsed back
struct StoredNote {
    id: String,
    title: String,
    content: String,
    category: String,
    image: Option<Vec<u8>>,
    audio_file_name: Option<String>,
}

impl SqliteBackend {
    /// Creates a new `SqliteBackend` by opening the `SQLite` database at the given path.
    /// Also ensures that the `notes` table exists.
    ///
    /// # Errors
    ///
    /// Returns a mapped `BackendError` if the database cannot be opened or the table cannot
    /// be created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(map_sqlite_error)?;

        // Create notes table if it doesn't exist
        connection
            .execute(
                "
                CREATE TABLE IF NOT EXISTS notes (
                    position        INTEGER PRIMARY KEY,
                    id              TEXT NOT NULL UNIQUE,
                    title           TEXT NOT NULL,
                    content         TEXT NOT NULL,
                    category        TEXT NOT NULL,
                    image_data      BLOB,
                    audio_file_name TEXT
                )
                ",
                [],
            )
            .map_err(map_sqlite_error)?;

        Ok(Self {
            connection,
            path: path.display().to_string(),
        })
    }
}

/// Maps a `rusqlite::Error` into a `NoteError`, wrapping known SQLite-specific codes into domain-specific variants.
///
/// This function is used internally by all database operations.
///
/// # Errors
///
/// Always returns a `NoteError::Backend` variant. Specific known `SQLite` error codes
/// are converted to more descriptive errors; all others are wrapped in `BackendError::Other`.
fn map_sqlite_error(e: rusqlite::Error) -> NoteError {
    match e {
        SqliteError::SqliteFailure(code, _) => match code.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                NoteError::Backend(BackendError::DatabaseBusy)
            }
            ErrorCode::PermissionDenied | ErrorCode::ReadOnly => {
                NoteError::Backend(BackendError::PermissionDenied)
            }
            ErrorCode::NotADatabase => NoteError::Backend(BackendError::NotADatabase),
            ErrorCode::SchemaChanged => NoteError::Backend(BackendError::SchemaChanged),
            _ => NoteError::Backend(BackendError::Other(anyhow::anyhow!(
                "SQLite error: {:?}",
                code
            ))),
        },
        other => NoteError::Backend(BackendError::Other(anyhow::Error::new(other))),
    }
}

impl TryFrom<StoredNote> for Note {
    type Error = NoteError;

    fn try_from(row: StoredNote) -> Result<Self> {
        let id: NoteId = row
            .id
            .parse()
            .map_err(|_| BackendError::NoteCorrupted(format!("invalid note ID '{}'", row.id)))?;

        Ok(Self {
            id,
            title: row.title,
            content: row.content,
            category: row.category,
            image: row.image,
            audio_file_name: row.audio_file_name.map(AudioFileName::new),
        })
    }
}

impl NoteBackend for SqliteBackend {
    /// Reads all notes ordered by their position in the collection.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `BackendError::NoteCorrupted` if a stored ID is not a valid note ID.
    /// - Other mapped `SQLite` errors for query failure.
    fn load(&self) -> Result<Vec<Note>> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT id, title, content, category, image_data, audio_file_name
                 FROM notes ORDER BY position ASC",
            )
            .map_err(map_sqlite_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StoredNote {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    category: row.get(3)?,
                    image: row.get(4)?,
                    audio_file_name: row.get(5)?,
                })
            })
            .map_err(map_sqlite_error)?;

        rows.map(|row| row.map_err(map_sqlite_error).and_then(Note::try_from))
            .collect()
    }

    /// Replaces the table contents with `notes` inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns a mapped `SQLite` error if any statement fails. The transaction is rolled
    /// back and the previous contents stay in place.
    fn save(&self, notes: &[Note]) -> Result<()> {
        let tx = self
            .connection
            .unchecked_transaction()
            .map_err(map_sqlite_error)?;

        tx.execute("DELETE FROM notes", []).map_err(map_sqlite_error)?;
        {
            let mut insert = tx
                .prepare(
                    "INSERT INTO notes (position, id, title, content, category, image_data, audio_file_name)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(map_sqlite_error)?;

            for (position, note) in notes.iter().enumerate() {
                let position =
                    i64::try_from(position).map_err(|e| BackendError::Other(e.into()))?;
                insert
                    .execute(params![
                        position,
                        note.id.to_string(),
                        note.title,
                        note.content,
                        note.category,
                        note.image.as_deref(),
                        note.audio_file_name.as_ref().map(AudioFileName::as_str),
                    ])
                    .map_err(map_sqlite_error)?;
            }
        }

        tx.commit().map_err(map_sqlite_error)
    }

    fn location(&self) -> String {
        self.path.clone()
    }
}
