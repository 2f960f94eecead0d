//! Revision state machine.
//!
//! ```text
//! Drafted ─evaluate─▶ UnderReview ─issue─▶ SuggestionsIssued ─revise─▶ Revised
//!                                               ▲                          │
//!                                               │ resume                check
//!                                               │                          ▼
//!                            FurtherRevisionNeeded ◀─decide── RevisionChecked
//!                                                               │
//!                                          FinalAccepted / FailedQuality
//! ```
//!
//! Every method either performs its transition or returns
//! [`DomainError::InvalidTransition`] without touching the machine.

use super::suggestion::{RevisionCheck, SuggestionSet};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CYCLES: u32 = 3;

/// Position of a draft in the review loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RevisionState {
    Drafted,
    UnderReview,
    SuggestionsIssued,
    Revised,
    RevisionChecked,
    FurtherRevisionNeeded,
    /// Accepted; `caveats` is non-empty when acceptance was forced by the
    /// cycle budget
    FinalAccepted { caveats: Vec<String> },
    FailedQuality,
}

impl RevisionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionState::Drafted => "drafted",
            RevisionState::UnderReview => "under_review",
            RevisionState::SuggestionsIssued => "suggestions_issued",
            RevisionState::Revised => "revised",
            RevisionState::RevisionChecked => "revision_checked",
            RevisionState::FurtherRevisionNeeded => "further_revision_needed",
            RevisionState::FinalAccepted { .. } => "final_accepted",
            RevisionState::FailedQuality => "failed_quality",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RevisionState::FinalAccepted { .. } | RevisionState::FailedQuality
        )
    }
}

impl std::fmt::Display for RevisionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do when the cycle budget is spent without acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    #[default]
    AcceptWithCaveats,
    FailQuality,
}

impl std::str::FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "accept_with_caveats" | "accept" => Ok(ExhaustionPolicy::AcceptWithCaveats),
            "fail_quality" | "fail" => Ok(ExhaustionPolicy::FailQuality),
            _ => Err(format!("Invalid exhaustion policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionPolicy {
    pub max_cycles: u32,
    pub on_exhaustion: ExhaustionPolicy,
}

impl RevisionPolicy {
    pub fn new(max_cycles: u32) -> Self {
        Self {
            max_cycles: max_cycles.max(1),
            on_exhaustion: ExhaustionPolicy::default(),
        }
    }

    pub fn with_exhaustion(mut self, on_exhaustion: ExhaustionPolicy) -> Self {
        self.on_exhaustion = on_exhaustion;
        self
    }
}

impl Default for RevisionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CYCLES)
    }
}

/// One suggestion → revision → check round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionCycle {
    pub number: u32,
    pub draft: String,
    pub suggestions: SuggestionSet,
    pub revised_draft: Option<String>,
    pub check: Option<RevisionCheck>,
}

#[derive(Debug, Clone)]
pub struct RevisionMachine {
    policy: RevisionPolicy,
    state: RevisionState,
    draft: String,
    evaluation: Option<serde_json::Value>,
    cycles_completed: u32,
    current: Option<RevisionCycle>,
    history: Vec<RevisionCycle>,
}

impl RevisionMachine {
    pub fn new(draft: impl Into<String>, policy: RevisionPolicy) -> Self {
        Self {
            policy,
            state: RevisionState::Drafted,
            draft: draft.into(),
            evaluation: None,
            cycles_completed: 0,
            current: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &RevisionState {
        &self.state
    }

    pub fn policy(&self) -> RevisionPolicy {
        self.policy
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn evaluation(&self) -> Option<&serde_json::Value> {
        self.evaluation.as_ref()
    }

    pub fn history(&self) -> &[RevisionCycle] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The newest draft: the last revision if any, else the original.
    pub fn current_draft(&self) -> &str {
        if let Some(revised) = self
            .current
            .as_ref()
            .and_then(|c| c.revised_draft.as_deref())
        {
            return revised;
        }
        self.history
            .iter()
            .rev()
            .find_map(|c| c.revised_draft.as_deref())
            .unwrap_or(&self.draft)
    }

    /// The cycle between `SuggestionsIssued` and `RevisionChecked`.
    pub fn open_cycle(&self) -> Option<&RevisionCycle> {
        self.current.as_ref()
    }

    /// Suggestions of the open cycle.
    pub fn open_suggestions(&self) -> Option<&SuggestionSet> {
        self.current.as_ref().map(|c| &c.suggestions)
    }

    fn invalid(&self, action: &str) -> DomainError {
        DomainError::InvalidTransition {
            from: self.state.as_str().to_string(),
            action: action.to_string(),
        }
    }

    /// Drafted → UnderReview
    pub fn record_evaluation(
        &mut self,
        evaluation: serde_json::Value,
    ) -> Result<&RevisionState, DomainError> {
        if self.state != RevisionState::Drafted {
            return Err(self.invalid("evaluate"));
        }
        self.evaluation = Some(evaluation);
        self.state = RevisionState::UnderReview;
        Ok(&self.state)
    }

    /// UnderReview → SuggestionsIssued, opening the first cycle
    pub fn issue_suggestions(
        &mut self,
        suggestions: SuggestionSet,
    ) -> Result<&RevisionState, DomainError> {
        if self.state != RevisionState::UnderReview {
            return Err(self.invalid("issue_suggestions"));
        }
        self.start_cycle(suggestions);
        Ok(&self.state)
    }

    /// UnderReview → FinalAccepted, when the review raised nothing to revise
    pub fn accept_as_is(&mut self) -> Result<&RevisionState, DomainError> {
        if self.state != RevisionState::UnderReview {
            return Err(self.invalid("accept_as_is"));
        }
        self.state = RevisionState::FinalAccepted {
            caveats: Vec::new(),
        };
        Ok(&self.state)
    }

    /// FurtherRevisionNeeded → SuggestionsIssued, carrying what is still
    /// pending from the last check
    pub fn resume(&mut self) -> Result<&RevisionState, DomainError> {
        if self.state != RevisionState::FurtherRevisionNeeded {
            return Err(self.invalid("resume"));
        }
        let carried = match self.history.last() {
            Some(RevisionCycle {
                suggestions,
                check: Some(check),
                ..
            }) => check.carry_forward(suggestions),
            _ => SuggestionSet::default(),
        };
        self.start_cycle(carried);
        Ok(&self.state)
    }

    fn start_cycle(&mut self, suggestions: SuggestionSet) {
        self.current = Some(RevisionCycle {
            number: self.cycles_completed + 1,
            draft: self.current_draft().to_string(),
            suggestions,
            revised_draft: None,
            check: None,
        });
        self.state = RevisionState::SuggestionsIssued;
    }

    /// SuggestionsIssued → Revised
    pub fn record_revision(
        &mut self,
        revised: impl Into<String>,
    ) -> Result<&RevisionState, DomainError> {
        if self.state != RevisionState::SuggestionsIssued {
            return Err(self.invalid("revise"));
        }
        let Some(cycle) = self.current.as_mut() else {
            return Err(self.invalid("revise"));
        };
        cycle.revised_draft = Some(revised.into());
        self.state = RevisionState::Revised;
        Ok(&self.state)
    }

    /// Revised → RevisionChecked; completes the cycle
    pub fn record_check(&mut self, check: RevisionCheck) -> Result<&RevisionState, DomainError> {
        if self.state != RevisionState::Revised {
            return Err(self.invalid("check"));
        }
        let Some(mut cycle) = self.current.take() else {
            return Err(self.invalid("check"));
        };
        cycle.check = Some(check);
        self.history.push(cycle);
        self.cycles_completed += 1;
        self.state = RevisionState::RevisionChecked;
        Ok(&self.state)
    }

    /// RevisionChecked → FinalAccepted | FurtherRevisionNeeded, or the
    /// exhaustion outcome once `max_cycles` checks have been recorded
    pub fn decide(&mut self) -> Result<&RevisionState, DomainError> {
        if self.state != RevisionState::RevisionChecked {
            return Err(self.invalid("decide"));
        }
        let Some(check) = self.history.last().and_then(|c| c.check.as_ref()) else {
            return Err(self.invalid("decide"));
        };

        self.state = if check.is_acceptable() {
            RevisionState::FinalAccepted {
                caveats: Vec::new(),
            }
        } else if self.cycles_completed >= self.policy.max_cycles {
            match self.policy.on_exhaustion {
                ExhaustionPolicy::AcceptWithCaveats => RevisionState::FinalAccepted {
                    caveats: check.caveats(),
                },
                ExhaustionPolicy::FailQuality => RevisionState::FailedQuality,
            }
        } else {
            RevisionState::FurtherRevisionNeeded
        };
        Ok(&self.state)
    }
}
