use crate::app::NoteStore;
use crate::backends::{FilesystemBackend, SqliteBackend};
use crate::media::AudioStore;
use crate::{NoteBackend, Result};

use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "notekeeper";
const DOCUMENT_FILE_NAME: &str = "notes.json";
const DATABASE_FILE_NAME: &str = "notes.db";
const AUDIO_DIR_NAME: &str = "audio";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding the notes and recorded audio
    #[arg(long, env = "NOTEKEEPER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub backend: Option<Backend>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Keep notes in a JSON document (default)
    Filesystem {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    /// Keep notes in a SQLite database
    Sqlite {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

/// The note store and the audio storage it refers to, opened once at startup
pub struct Workspace {
    pub store: NoteStore,
    pub audio: AudioStore,
}

impl Args {
    /// Base directory: `--data-dir`, else the platform data directory, else `./notekeeper`
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir().map_or_else(|| PathBuf::from(APP_DIR_NAME), |d| d.join(APP_DIR_NAME))
        })
    }

    /// Opens the selected backend, loads the notes and prepares the audio directory
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or the audio directory cannot be created. A missing
    /// or unreadable notes collection is not an error.
    pub fn open(&self) -> Result<Workspace> {
        let data_dir = self.data_dir();
        debug!("Using data directory {}", data_dir.display());

        // Allow any struct that implements NoteBackend, and store on heap because size is unknown at compile time
        let backend: Box<dyn NoteBackend> = match &self.backend {
            None | Some(Backend::Filesystem { path: None }) => {
                Box::new(FilesystemBackend::new(data_dir.join(DOCUMENT_FILE_NAME))?)
            }
            Some(Backend::Filesystem { path: Some(path) }) => {
                Box::new(FilesystemBackend::new(path)?)
            }
            Some(Backend::Sqlite { path }) => {
                let path = path
                    .clone()
                    .unwrap_or_else(|| data_dir.join(DATABASE_FILE_NAME));
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(crate::BackendError::DirectoryCreationError)?;
                }
                Box::new(SqliteBackend::new(&path)?)
            }
        };

        Ok(Workspace {
            store: NoteStore::load(backend),
            audio: AudioStore::new(data_dir.join(AUDIO_DIR_NAME))?,
        })
    }
}

/// Parses command-line arguments and environment fallbacks
#[must_use]
pub fn handle_args() -> Args {
    Args::parse()
}
