use crate::ui::io::IO;
use crate::{MenuError, NoteError, NoteSummary, Result};

use colored::Colorize;
use log::trace;
use std::io::{self, Write};
use tabled::{Table, settings::Style};

pub struct Cli;

impl Cli {
    // Prompt and read one raw line. Zero bytes read means stdin was closed
    fn read_line(prompt: &str) -> Result<String> {
        print!("{prompt}");
        io::stdout()
            .flush()
            .map_err(|e| NoteError::Menu(MenuError::StdoutWriteError(e)))?;
        trace!("Flushed stdout");

        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .map_err(|e| NoteError::Menu(MenuError::StdinReadError(e)))?;
        if read == 0 {
            return Err(MenuError::EndOfInput.into());
        }
        Ok(line)
    }
}

impl IO for Cli {
    /// Reads a single line of text and strips the line ending. Other whitespace is kept,
    /// since search queries are used exactly as typed.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout or reading from stdin fails, or
    /// `MenuError::EndOfInput` when stdin is closed.
    fn get_input(&self) -> Result<String> {
        let line = Self::read_line("> ")?;
        let input = line.trim_end_matches(['\n', '\r']).to_string();
        trace!("Got input: {input:?}");
        Ok(input)
    }

    /// Reads lines from stdin until a line exactly matching `stop_at` (trimmed) is entered,
    /// concatenates the preceding lines and returns it.
    ///
    /// # Parameters
    ///
    /// - `stop_at`: The sentinel string that terminates input collection.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout or reading from stdin fails.
    fn get_input_until(&self, stop_at: &str) -> Result<String> {
        let mut input = String::new();
        loop {
            let line = Self::read_line("> ")?;
            trace!("Got input: {}", line.trim_end());

            if line.trim() == stop_at {
                break;
            }
            input += &line;
        }
        println!();
        Ok(input)
    }

    /// Displays a numbered menu prompt with the given options.
    fn show_menu(&self, options: &[impl std::fmt::Display]) {
        self.show_title("Choose an option");
        for o in options {
            println!("{o}");
        }
        println!();
    }

    /// Renders a table of note summaries in `psql` style to stdout.
    fn show_notes_list(&self, rows: Vec<NoteSummary>) {
        let mut table = Table::new(rows);
        table.with(Style::psql());
        println!("{table}");
    }

    /// Prints a bolded title followed by a blank line.
    fn show_title(&self, title: &str) {
        println!("\n{}\n", title.bold());
    }

    /// Prints plain text to stdout.
    fn show_text(&self, msg: &str) {
        println!("{msg}");
    }
}
