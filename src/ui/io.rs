use crate::media::read_image;
use crate::search;
use crate::setup::arguments::{self, Workspace};
use crate::setup::logging;
use crate::ui::cli;
use crate::{MenuError, Note, NoteDraft, NoteError, NoteId, NoteSummary, Result};

use log::{debug, error, info, trace, warn};
use std::fmt;
use std::path::Path;

/// Abstraction for input/output
pub trait IO {
    /// Read a line of input without its line ending
    ///
    /// # Errors
    ///
    /// Returns `MenuError::EndOfInput` once input is exhausted, or a read/write error
    fn get_input(&self) -> Result<String>;
    /// Read multiple lines until a trimmed line equals `stop_at`
    ///
    /// # Errors
    ///
    /// Returns `MenuError::EndOfInput` once input is exhausted, or a read/write error
    fn get_input_until(&self, stop_at: &str) -> Result<String>;
    /// Display a list of selectable options
    fn show_menu(&self, options: &[impl fmt::Display]);
    /// Display a bolded title
    fn show_title(&self, title: &str);
    /// Render a table of note summaries
    fn show_notes_list(&self, rows: Vec<NoteSummary>);
    /// Print a plain text message
    fn show_text(&self, msg: &str);
}

/// Actions available in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Create = 1,
    List = 2,
    Search = 3,
    Delete = 4,
    DeleteAtPositions = 5,
    ShowAudio = 6,
    ListOrphanedAudio = 7,
    Quit = 8,
}

/// All menu options in display order
pub const ALL_MENU_OPTIONS: [MenuOption; 8] = [
    MenuOption::Create,
    MenuOption::List,
    MenuOption::Search,
    MenuOption::Delete,
    MenuOption::DeleteAtPositions,
    MenuOption::ShowAudio,
    MenuOption::ListOrphanedAudio,
    MenuOption::Quit,
];

/// Convert a numeric choice into a `MenuOption`
///
/// # Errors
///
/// Returns `Err(())` if the value does not map to a valid variant
impl TryFrom<u8> for MenuOption {
    type Error = ();

    fn try_from(n: u8) -> std::result::Result<Self, Self::Error> {
        ALL_MENU_OPTIONS
            .into_iter()
            .find(|option| *option as u8 == n)
            .ok_or(())
    }
}

/// Show the option number and label, e.g. `(1) Create note`
impl fmt::Display for MenuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "Create note",
            Self::List => "List notes",
            Self::Search => "Search notes",
            Self::Delete => "Delete note",
            Self::DeleteAtPositions => "Delete notes by position",
            Self::ShowAudio => "Show audio file of a note",
            Self::ListOrphanedAudio => "List audio files without a note",
            Self::Quit => "Quit",
        };
        write!(f, "({}) {}", *self as u8, label)
    }
}

/// Dispatch chosen `MenuOption` to its handler
fn handle_menu_option(io: &impl IO, workspace: &mut Workspace, option: MenuOption) -> Result<()> {
    match option {
        MenuOption::Create => handle_create(io, workspace),
        MenuOption::List => {
            handle_list(io, workspace);
            Ok(())
        }
        MenuOption::Search => handle_search(io, workspace),
        MenuOption::Delete => handle_delete(io, workspace),
        MenuOption::DeleteAtPositions => handle_delete_at_positions(io, workspace),
        MenuOption::ShowAudio => handle_show_audio(io, workspace),
        MenuOption::ListOrphanedAudio => handle_list_orphans(io, workspace),
        MenuOption::Quit => Ok(()),
    }
}

/// Initialize logging, parse args, open the notes and enter the main menu loop
///
/// # Errors
///
/// Returns an error if the notes or the audio directory cannot be opened, or if the
/// terminal cannot be read or written
pub fn run() -> Result<()> {
    let args = arguments::handle_args();
    logging::setup_log(args.verbose);
    let mut workspace = args.open()?;

    run_menu(&cli::Cli, &mut workspace)
}

/// Show the menu and handle choices until the user quits or input ends
///
/// Errors from individual actions are logged and the loop continues.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails
pub fn run_menu(io: &impl IO, workspace: &mut Workspace) -> Result<()> {
    loop {
        io.show_menu(&ALL_MENU_OPTIONS);
        let option = match get_menu_input(io) {
            Ok(option) => option,
            Err(NoteError::Menu(MenuError::EndOfInput)) => return Ok(()),
            Err(NoteError::Menu(e @ (MenuError::ParseError(_) | MenuError::InvalidOption(_)))) => {
                error!("{e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        if option == MenuOption::Quit {
            info!("Bye");
            return Ok(());
        }

        match handle_menu_option(io, workspace, option) {
            Ok(()) => {}
            Err(NoteError::Menu(MenuError::EndOfInput)) => return Ok(()),
            Err(e @ NoteError::Menu(_)) => return Err(e),
            Err(e) => error!("{e}"),
        }

        if workspace.store.is_dirty() {
            warn!("Notes could not be saved. The latest changes will be lost on exit");
        }
    }
}

/// Try parsing input as `MenuOption` or return an error
///
/// # Errors
///
/// Returns `NoteError::Menu(MenuError::ParseError)` if input is not an integer
/// Returns `NoteError::Menu(MenuError::InvalidOption)` if integer is out of range
fn get_menu_input(io: &impl IO) -> Result<MenuOption> {
    let input = io.get_input()?;
    let input = input.trim();

    match input.parse::<u8>() {
        Ok(n) => MenuOption::try_from(n).map_err(|()| MenuError::InvalidOption(n).into()),
        Err(_) => Err(MenuError::ParseError(input.to_string()).into()),
    }
}

// Ask a yes/no question until one of them is given
fn confirm(io: &impl IO, question: &str) -> Result<bool> {
    loop {
        io.show_text(&format!("{question} (y/n):"));
        let input = io.get_input()?;
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => warn!("Invalid input. Please enter 'y' or 'n'"),
        }
    }
}

/// Prompt for the note fields and attachments, then create the note
fn handle_create(io: &impl IO, workspace: &mut Workspace) -> Result<()> {
    io.show_title("Create note");

    io.show_text("Title:");
    let title = io.get_input()?;

    io.show_text("Category:");
    let category = io.get_input()?;

    // Stop when getting a "." alone on a line
    io.show_text("Content (end with '.' on last line):");
    let content = io.get_input_until(".")?;
    let content = content.trim_end_matches(['\n', '\r']).to_string();
    trace!("Got content: {content}");

    let image = loop {
        io.show_text("Image file (leave empty for none):");
        let input = io.get_input()?;
        let input = input.trim();
        if input.is_empty() {
            break None;
        }
        match read_image(Path::new(input)) {
            Ok(bytes) => {
                debug!("Attached {} bytes of image data", bytes.len());
                break Some(bytes);
            }
            Err(e) => error!("{e}"),
        }
    };

    let audio_file_name = loop {
        io.show_text("Audio recording (leave empty for none):");
        let input = io.get_input()?;
        let input = input.trim();
        if input.is_empty() {
            break None;
        }
        match workspace.audio.import(Path::new(input)) {
            Ok(name) => break Some(name),
            Err(e) => error!("{e}"),
        }
    };

    let id = workspace.store.create(NoteDraft {
        title,
        content,
        category,
        image,
        audio_file_name,
    });
    info!("Note saved with ID: {id}");
    Ok(())
}

/// Display the whole collection in a table
fn handle_list(io: &impl IO, workspace: &Workspace) {
    let notes = workspace.store.notes();
    if notes.is_empty() {
        io.show_text("No notes yet");
        return;
    }

    let rows = notes
        .iter()
        .enumerate()
        .map(|(position, note)| NoteSummary::new(position, note))
        .collect();
    io.show_notes_list(rows);
}

/// Prompt for a query and display the matching notes with their positions
fn handle_search(io: &impl IO, workspace: &Workspace) -> Result<()> {
    io.show_title("Search notes");
    io.show_text("Query:");
    let query = io.get_input()?;

    let notes = workspace.store.notes();
    let rows: Vec<NoteSummary> = search::positions(notes, &query)
        .into_iter()
        .map(|position| NoteSummary::new(position, &notes[position]))
        .collect();

    if rows.is_empty() {
        io.show_text(&format!("No notes match {query:?}"));
    } else {
        io.show_notes_list(rows);
    }
    Ok(())
}

// Full ID, or a prefix of it matching exactly one note
fn find_note_id(notes: &[Note], input: &str) -> Option<NoteId> {
    if let Ok(id) = input.parse::<NoteId>() {
        return Some(id);
    }

    let mut candidates = notes
        .iter()
        .filter(|note| note.id.to_string().starts_with(input))
        .map(|note| note.id);
    match (candidates.next(), candidates.next()) {
        (Some(id), None) => Some(id),
        _ => None,
    }
}

/// Prompt for a note ID, confirm deletion, and delete
fn handle_delete(io: &impl IO, workspace: &mut Workspace) -> Result<()> {
    io.show_title("Delete note");

    let id = loop {
        io.show_text("ID (or the start of it):");
        let input = io.get_input()?;
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        match find_note_id(workspace.store.notes(), input) {
            Some(id) => break id,
            None => error!("'{input}' does not identify a single note"),
        }
    };

    if !confirm(io, "Are you sure?")? {
        info!("Not deleting note with ID: {id}");
        return Ok(());
    }

    if workspace.store.delete(id) {
        info!("Successfully deleted note with ID: {id}");
    } else {
        warn!("No note with ID: {id}");
    }
    Ok(())
}

/// Prompt for positions from the list view, confirm, and delete them together
fn handle_delete_at_positions(io: &impl IO, workspace: &mut Workspace) -> Result<()> {
    io.show_title("Delete notes by position");

    let positions: Vec<usize> = loop {
        io.show_text("Positions separated by spaces or commas:");
        let input = io.get_input()?;
        let parsed: std::result::Result<Vec<usize>, _> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(str::parse::<usize>)
            .collect();
        match parsed {
            Ok(positions) if !positions.is_empty() => break positions,
            Ok(_) => warn!("No positions given"),
            Err(e) => error!("Got invalid position: {e}"),
        }
    };

    if !confirm(io, &format!("Delete {} note(s)?", positions.len()))? {
        info!("Not deleting anything");
        return Ok(());
    }

    let removed = workspace.store.delete_at_offsets(&positions)?;
    info!("Successfully deleted {} note(s)", removed.len());
    Ok(())
}

/// Prompt for a position and show where that note's audio clip lives
fn handle_show_audio(io: &impl IO, workspace: &Workspace) -> Result<()> {
    io.show_title("Show audio file");

    let position: usize = loop {
        io.show_text("Position:");
        let input = io.get_input()?;
        match input.trim().parse::<usize>() {
            Ok(position) => break position,
            Err(e) => error!("Got invalid position: {e}"),
        }
    };

    let notes = workspace.store.notes();
    let Some(note) = notes.get(position) else {
        return Err(crate::StoreError::IndexOutOfRange {
            index: position,
            len: notes.len(),
        }
        .into());
    };

    match &note.audio_file_name {
        Some(name) => {
            let path = workspace.audio.locate(name)?;
            io.show_text(&path.display().to_string());
        }
        None => io.show_text(&format!("'{}' has no audio recording", note.title)),
    }
    Ok(())
}

/// List audio files in the audio directory that no note refers to
fn handle_list_orphans(io: &impl IO, workspace: &Workspace) -> Result<()> {
    io.show_title("Audio files without a note");

    let orphans = workspace.audio.orphans(workspace.store.notes())?;
    if orphans.is_empty() {
        io.show_text("None");
    }
    for name in orphans {
        io.show_text(name.as_str());
    }
    Ok(())
}
