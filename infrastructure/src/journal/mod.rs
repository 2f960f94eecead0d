//! Structured run journal.
//!
//! [`JsonlRunJournal`] implements the [`RunJournal`] port by appending one
//! JSON object per event to a `.jsonl` file.
//!
//! [`RunJournal`]: litreview_application::RunJournal

mod jsonl;

pub use jsonl::JsonlRunJournal;
