//! Narrowing the note collection by a free text query.
//!
//! Matching is a case-insensitive substring test against the title, the category and the
//! content of each note. The query is used as typed: no trimming and no tokenizing, so a
//! query of only spaces matches notes that contain those spaces.

use crate::Note;

/// Returns the notes matching `query`, in the order they appear in `notes`
///
/// An empty query matches every note.
#[must_use]
pub fn filter(notes: &[Note], query: &str) -> Vec<Note> {
    positions(notes, query)
        .into_iter()
        .map(|index| notes[index].clone())
        .collect()
}

/// Positions in `notes` of the notes matching `query`, ascending
#[must_use]
pub fn positions(notes: &[Note], query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    notes
        .iter()
        .enumerate()
        .filter(|(_, note)| query.is_empty() || matches(note, &needle))
        .map(|(index, _)| index)
        .collect()
}

/// True if the lowercase `needle` occurs in the note's title, category or content
#[must_use]
pub fn matches(note: &Note, needle: &str) -> bool {
    [&note.title, &note.category, &note.content]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoteDraft, NoteId};

    fn note(title: &str, category: &str, content: &str) -> Note {
        Note::from_draft(NoteDraft {
            title: title.to_string(),
            category: category.to_string(),
            content: content.to_string(),
            ..NoteDraft::default()
        })
    }

    fn collection() -> Vec<Note> {
        vec![
            note("Shopping", "Home", "milk"),
            note("Standup", "Work", "Ask about the HOME office budget"),
            note("Ideas", "Personal", "a  b"),
            note("Groceries", "home", "eggs"),
        ]
    }

    fn ids(notes: &[Note]) -> Vec<NoteId> {
        notes.iter().map(|note| note.id).collect()
    }

    #[test]
    fn given_single_note_when_querying_category_then_finds_it() {
        let notes = vec![note("Shopping", "Home", "milk")];

        assert_eq!(filter(&notes, "home"), notes);
        assert!(filter(&notes, "xyz").is_empty());
    }

    #[test]
    fn given_empty_query_when_filtering_then_returns_everything_in_order() {
        let notes = collection();

        assert_eq!(filter(&notes, ""), notes);
        assert_eq!(positions(&notes, ""), [0, 1, 2, 3]);
    }

    #[test]
    fn given_query_when_filtering_then_matches_any_field_in_collection_order() {
        let notes = collection();

        let found = filter(&notes, "home");

        assert_eq!(ids(&found), [notes[0].id, notes[1].id, notes[3].id]);
        assert_eq!(positions(&notes, "home"), [0, 1, 3]);
    }

    #[test]
    fn given_differently_cased_queries_when_filtering_then_results_agree() {
        let notes = collection();

        assert_eq!(filter(&notes, "ABC"), filter(&notes, "abc"));
        assert_eq!(filter(&notes, "HoMe"), filter(&notes, "home"));
        assert_eq!(filter(&notes, "MILK"), vec![notes[0].clone()]);
    }

    #[test]
    fn given_whitespace_query_when_filtering_then_it_must_appear_literally() {
        let notes = collection();

        assert_eq!(ids(&filter(&notes, "  ")), [notes[2].id]);
        assert_eq!(filter(&notes, " ").len(), 2);
    }

    #[test]
    fn given_filtered_result_when_filtering_again_then_nothing_changes() {
        let notes = collection();

        for query in ["", "home", "o", "  ", "zzz"] {
            let once = filter(&notes, query);
            assert_eq!(filter(&once, query), once, "query {query:?}");
        }
    }

    #[test]
    fn given_partial_word_when_filtering_then_matches_substring() {
        let notes = collection();

        assert_eq!(ids(&filter(&notes, "ocer")), [notes[3].id]);
    }
}
