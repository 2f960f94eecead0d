//! Review/revision feedback loop.
//!
//! [`suggestion`] turns reviewer JSON into typed suggestions and revision
//! checks; [`machine`] sequences drafts, suggestions and checks until the
//! draft is accepted or the cycle budget runs out.

pub mod machine;
pub mod suggestion;

pub use machine::{
    DEFAULT_MAX_CYCLES, ExhaustionPolicy, RevisionCycle, RevisionMachine, RevisionPolicy,
    RevisionState,
};
pub use suggestion::{NewIssue, PendingSuggestion, RevisionCheck, Severity, Suggestion, SuggestionSet};
