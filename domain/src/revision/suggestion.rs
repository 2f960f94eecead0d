//! Reviewer suggestions and revision checks.
//!
//! Reviewer output is model-generated, so extraction is lenient: missing
//! fields become empty strings and unknown shapes are skipped rather than
//! rejected. The JSON contract on the task already guarantees the top-level
//! keys exist.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How much a suggestion matters for acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Major,
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" | "critical" | "high" => Some(Severity::Major),
            "minor" | "low" => Some(Severity::Minor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single revision suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub aspect: String,
    pub issue: String,
    pub suggestion: String,
    /// 1 is handled first
    pub priority: u32,
    pub severity: Severity,
}

impl Suggestion {
    pub fn new(
        aspect: impl Into<String>,
        suggestion: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            aspect: aspect.into(),
            issue: String::new(),
            suggestion: suggestion.into(),
            priority: 0,
            severity,
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issue = issue.into();
        self
    }

    pub fn is_major(&self) -> bool {
        self.severity == Severity::Major
    }

    /// Whether free text from a reviewer contains, or is contained in, the
    /// suggestion text.
    fn matches_text(&self, text: &str) -> bool {
        let text = text.trim();
        !text.is_empty()
            && !self.suggestion.is_empty()
            && (self.suggestion.contains(text) || text.contains(self.suggestion.as_str()))
    }

    fn has_aspect(&self, aspect: &str) -> bool {
        !self.aspect.is_empty() && self.aspect.eq_ignore_ascii_case(aspect.trim())
    }
}

/// Suggestions issued in one review round, ordered by priority
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestionSet {
    suggestions: Vec<Suggestion>,
}

impl SuggestionSet {
    pub fn new(mut suggestions: Vec<Suggestion>) -> Self {
        let mut next = suggestions.iter().map(|s| s.priority).max().unwrap_or(0);
        for s in suggestions.iter_mut().filter(|s| s.priority == 0) {
            next += 1;
            s.priority = next;
        }
        suggestions.sort_by_key(|s| s.priority);
        Self { suggestions }
    }

    /// Parse `{"major_revisions": [...], "minor_revisions": [...],
    /// "priority_order": [...]}`.
    ///
    /// Entries named in `priority_order` come first in that order; the rest
    /// keep their position, majors before minors.
    pub fn from_json(value: &Value) -> Self {
        let mut suggestions: Vec<Suggestion> = Vec::new();
        for (key, severity) in [
            ("major_revisions", Severity::Major),
            ("minor_revisions", Severity::Minor),
        ] {
            let Some(items) = value.get(key).and_then(Value::as_array) else {
                continue;
            };
            suggestions.extend(items.iter().filter_map(|item| parse_suggestion(item, severity)));
        }

        let order: Vec<&str> = value
            .get("priority_order")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut rank = 0;
        for label in order {
            if let Some(s) = suggestions
                .iter_mut()
                .find(|s| s.priority == 0 && (s.matches_text(label) || s.has_aspect(label)))
            {
                rank += 1;
                s.priority = rank;
            }
        }
        Self::new(suggestions)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.suggestions.iter()
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    pub fn major_count(&self) -> usize {
        self.suggestions.iter().filter(|s| s.is_major()).count()
    }

    /// Find the issued suggestion a reviewer's reference points at.
    ///
    /// The suggestion text decides: an exact match first, then containment
    /// either way. `aspect` is consulted only when no text matches and the
    /// reference names one explicitly.
    pub fn find(&self, text: &str, aspect: Option<&str>) -> Option<&Suggestion> {
        let text = text.trim();
        self.suggestions
            .iter()
            .find(|s| !text.is_empty() && s.suggestion == text)
            .or_else(|| self.suggestions.iter().find(|s| s.matches_text(text)))
            .or_else(|| {
                let aspect = aspect?;
                self.suggestions.iter().find(|s| s.has_aspect(aspect))
            })
    }

    /// Render back to the reviewer JSON shape, for prompts and artifacts.
    pub fn to_json(&self) -> Value {
        let entry = |s: &Suggestion| {
            serde_json::json!({
                "aspect": s.aspect,
                "current_issue": s.issue,
                "suggestion": s.suggestion,
            })
        };
        serde_json::json!({
            "major_revisions": self.suggestions.iter().filter(|s| s.is_major()).map(entry).collect::<Vec<_>>(),
            "minor_revisions": self.suggestions.iter().filter(|s| !s.is_major()).map(entry).collect::<Vec<_>>(),
            "priority_order": self.suggestions.iter().map(|s| s.suggestion.clone()).collect::<Vec<_>>(),
        })
    }
}

fn text_field(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn named(aspect: &str) -> Option<&str> {
    (!aspect.is_empty()).then_some(aspect)
}

fn parse_suggestion(item: &Value, severity: Severity) -> Option<Suggestion> {
    if let Some(text) = item.as_str() {
        return (!text.trim().is_empty()).then(|| Suggestion::new("", text.trim(), severity));
    }
    let suggestion = text_field(item, &["suggestion", "description"]);
    let issue = text_field(item, &["current_issue", "issue"]);
    if suggestion.is_empty() && issue.is_empty() {
        return None;
    }
    Some(Suggestion {
        aspect: text_field(item, &["aspect"]),
        issue,
        suggestion,
        priority: 0,
        severity,
    })
}

/// A suggestion the reviewer found not (fully) addressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSuggestion {
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub aspect: String,
    pub status: String,
    pub severity: Severity,
}

/// A problem introduced by the revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub description: String,
    pub critical: bool,
}

/// Reviewer verdict on one revised draft
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevisionCheck {
    pub addressed: Vec<String>,
    pub pending: Vec<PendingSuggestion>,
    pub new_issues: Vec<NewIssue>,
    pub assessment: String,
}

impl RevisionCheck {
    /// Parse `{"addressed_suggestions", "pending_suggestions", "new_issues"}`.
    ///
    /// A pending entry takes its severity from an explicit `severity` field,
    /// else from the issued suggestion it refers to, else counts as major.
    /// A new issue is critical only when flagged (`critical: true` or
    /// `severity: "critical"`); bare strings are non-critical.
    pub fn from_json(value: &Value, issued: &SuggestionSet) -> Self {
        let items = |key: &str| -> Vec<Value> {
            value
                .get(key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };

        let addressed = items("addressed_suggestions")
            .iter()
            .map(|item| match item.as_str() {
                Some(text) => text.trim().to_string(),
                None => text_field(item, &["suggestion", "description"]),
            })
            .filter(|s| !s.is_empty())
            .collect();

        let pending = items("pending_suggestions")
            .iter()
            .filter_map(|item| {
                let (text, aspect, status, explicit) = match item.as_str() {
                    Some(text) => (text.trim().to_string(), String::new(), String::new(), None),
                    None => (
                        text_field(item, &["suggestion", "description"]),
                        text_field(item, &["aspect"]),
                        text_field(item, &["current_status", "status"]),
                        item.get("severity")
                            .and_then(Value::as_str)
                            .and_then(Severity::parse),
                    ),
                };
                if text.is_empty() {
                    return None;
                }
                let severity = explicit
                    .or_else(|| issued.find(&text, named(&aspect)).map(|s| s.severity))
                    .unwrap_or(Severity::Major);
                Some(PendingSuggestion {
                    suggestion: text,
                    aspect,
                    status,
                    severity,
                })
            })
            .collect();

        let new_issues = items("new_issues")
            .iter()
            .filter_map(|item| {
                if let Some(text) = item.as_str() {
                    let text = text.trim();
                    return (!text.is_empty()).then(|| NewIssue {
                        description: text.to_string(),
                        critical: false,
                    });
                }
                let description = text_field(item, &["issue", "description"]);
                if description.is_empty() {
                    return None;
                }
                let critical = item.get("critical").and_then(Value::as_bool).unwrap_or(false)
                    || item
                        .get("severity")
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.eq_ignore_ascii_case("critical"));
                Some(NewIssue {
                    description,
                    critical,
                })
            })
            .collect();

        Self {
            addressed,
            pending,
            new_issues,
            assessment: text_field(value, &["overall_assessment"]),
        }
    }

    pub fn pending_major(&self) -> usize {
        self.pending
            .iter()
            .filter(|p| p.severity == Severity::Major)
            .count()
    }

    pub fn has_critical_issue(&self) -> bool {
        self.new_issues.iter().any(|i| i.critical)
    }

    /// No pending major suggestion and no new critical issue.
    pub fn is_acceptable(&self) -> bool {
        self.pending_major() == 0 && !self.has_critical_issue()
    }

    /// Suggestions to carry into the next round.
    ///
    /// Pending entries that match an issued suggestion keep its details;
    /// the rest become new suggestions. Critical new issues are added as
    /// major suggestions.
    pub fn carry_forward(&self, issued: &SuggestionSet) -> SuggestionSet {
        let mut carried: Vec<Suggestion> = self
            .pending
            .iter()
            .map(|p| match issued.find(&p.suggestion, named(&p.aspect)) {
                Some(s) => Suggestion {
                    priority: 0,
                    ..s.clone()
                },
                None => Suggestion::new("", p.suggestion.clone(), p.severity),
            })
            .collect();
        carried.extend(
            self.new_issues
                .iter()
                .filter(|i| i.critical)
                .map(|i| Suggestion::new("new issue", i.description.clone(), Severity::Major)),
        );
        SuggestionSet::new(carried)
    }

    /// Outstanding items, rendered for acceptance caveats.
    pub fn caveats(&self) -> Vec<String> {
        self.pending
            .iter()
            .map(|p| format!("pending {} suggestion: {}", p.severity, p.suggestion))
            .chain(
                self.new_issues
                    .iter()
                    .filter(|i| i.critical)
                    .map(|i| format!("critical issue: {}", i.description)),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issued() -> SuggestionSet {
        SuggestionSet::from_json(&json!({
            "major_revisions": [
                {"aspect": "coverage", "current_issue": "misses 2023 work", "suggestion": "add recent surveys"},
                {"aspect": "structure", "current_issue": "sections overlap", "suggestion": "merge sections 2 and 3"}
            ],
            "minor_revisions": [
                {"aspect": "style", "suggestion": "shorten the abstract"}
            ],
            "priority_order": ["merge sections 2 and 3", "add recent surveys"]
        }))
    }

    #[test]
    fn test_suggestions_parse_and_priority() {
        let set = issued();
        assert_eq!(set.len(), 3);
        assert_eq!(set.major_count(), 2);

        let order: Vec<_> = set.iter().map(|s| s.suggestion.as_str()).collect();
        assert_eq!(
            order,
            vec!["merge sections 2 and 3", "add recent surveys", "shorten the abstract"]
        );
        assert_eq!(set.iter().next().unwrap().issue, "sections overlap");
    }

    #[test]
    fn test_suggestions_skip_empty_entries() {
        let set = SuggestionSet::from_json(&json!({
            "major_revisions": [{}, "tighten the scope", ""],
            "minor_revisions": "not a list"
        }));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().suggestion, "tighten the scope");
    }

    #[test]
    fn test_check_inherits_severity_from_issued() {
        let set = issued();
        let check = RevisionCheck::from_json(
            &json!({
                "addressed_suggestions": [
                    {"suggestion": "merge sections 2 and 3"},
                    {"suggestion": "shorten the abstract"}
                ],
                "pending_suggestions": [
                    {"suggestion": "add recent surveys", "current_status": "only one added"}
                ],
                "new_issues": []
            }),
            &set,
        );

        assert_eq!(check.addressed.len(), 2);
        assert_eq!(check.pending_major(), 1);
        assert_eq!(check.pending[0].status, "only one added");
        assert!(!check.is_acceptable());
    }

    #[test]
    fn test_unknown_pending_counts_as_major() {
        let check = RevisionCheck::from_json(
            &json!({"pending_suggestions": ["something unrelated"]}),
            &SuggestionSet::default(),
        );
        assert_eq!(check.pending_major(), 1);
    }

    #[test]
    fn test_minor_pending_is_acceptable() {
        let check = RevisionCheck::from_json(
            &json!({
                "pending_suggestions": [{"suggestion": "shorten the abstract"}],
                "new_issues": ["a typo in section 4"]
            }),
            &issued(),
        );
        assert!(check.is_acceptable());
        assert!(!check.has_critical_issue());
    }

    #[test]
    fn test_pending_matches_suggestion_text_not_stray_aspect_words() {
        let set = SuggestionSet::from_json(&json!({
            "major_revisions": [{"aspect": "coverage", "suggestion": "add recent surveys"}],
            "minor_revisions": [{"aspect": "style", "suggestion": "shorten the abstract"}]
        }));
        let check = RevisionCheck::from_json(
            &json!({
                "pending_suggestions": [
                    {"suggestion": "shorten the abstract (it repeats the coverage section)"}
                ]
            }),
            &set,
        );

        assert_eq!(check.pending[0].severity, Severity::Minor);
        assert_eq!(check.pending_major(), 0);
        assert!(check.is_acceptable());
    }

    #[test]
    fn test_pending_falls_back_to_explicit_aspect() {
        let set = issued();
        let check = RevisionCheck::from_json(
            &json!({
                "pending_suggestions": [
                    {"aspect": "Style", "suggestion": "the summary paragraph is still long"},
                    {"suggestion": "style is inconsistent"}
                ]
            }),
            &set,
        );

        assert_eq!(check.pending[0].severity, Severity::Minor);
        assert_eq!(check.pending[0].aspect, "Style");
        assert_eq!(check.pending[1].severity, Severity::Major);

        let carried = check.carry_forward(&set);
        let first = carried.iter().next().unwrap();
        assert_eq!(first.suggestion, "shorten the abstract");
    }

    #[test]
    fn test_critical_new_issue_blocks_acceptance() {
        let check = RevisionCheck::from_json(
            &json!({
                "new_issues": [{"issue": "fabricated citation", "severity": "critical"}]
            }),
            &issued(),
        );
        assert!(check.has_critical_issue());
        assert!(!check.is_acceptable());

        let carried = check.carry_forward(&issued());
        assert_eq!(carried.len(), 1);
        assert!(carried.iter().next().unwrap().is_major());
    }

    #[test]
    fn test_carry_forward_keeps_issued_details() {
        let set = issued();
        let check = RevisionCheck::from_json(
            &json!({"pending_suggestions": [{"suggestion": "add recent surveys"}]}),
            &set,
        );
        let carried = check.carry_forward(&set);
        let first = carried.iter().next().unwrap();
        assert_eq!(first.aspect, "coverage");
        assert_eq!(first.priority, 1);
        assert_eq!(check.caveats(), vec!["pending major suggestion: add recent surveys"]);
    }
}
