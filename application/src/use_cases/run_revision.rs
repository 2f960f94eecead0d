//! Run Revision use case
//!
//! Drives a draft through the review loop: evaluation, suggestions, then
//! revise/check cycles until the reviewer accepts the draft or the cycle
//! budget runs out. A degraded reviewer or revision stage ends the loop
//! early; the outcome records why.
//!
//! Every revised draft lands in the PhD store and every reviewer output in
//! the reviewer store, keyed `<document>/<step>`.

use crate::ports::agent_executor::AgentExecutor;
use crate::ports::artifact_sink::{ArtifactSink, NoArtifacts};
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::ports::run_journal::{NoJournal, RunEvent, RunJournal};
use crate::use_cases::role_operations::ResearchTeam;
use crate::use_cases::shared::StageResult;
use litreview_domain::workflow::artifact;
use litreview_domain::{
    DomainError, KnowledgeStores, RevisionCheck, RevisionCycle, RevisionMachine, RevisionPolicy,
    RevisionState, RoleKind, SuggestionSet, require_text,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Where the loop ended and how it got there
#[derive(Debug, Clone, Serialize)]
pub struct RevisionOutcome {
    pub state: RevisionState,
    pub cycles: Vec<RevisionCycle>,
    pub evaluation: Option<Value>,
    pub final_draft: String,
    /// Why the loop stopped before reaching a terminal state
    pub interrupted: Option<String>,
}

impl RevisionOutcome {
    fn from_machine(machine: &RevisionMachine, interrupted: Option<String>) -> Self {
        Self {
            state: machine.state().clone(),
            cycles: machine.history().to_vec(),
            evaluation: machine.evaluation().cloned(),
            final_draft: machine.current_draft().to_string(),
            interrupted,
        }
    }

    pub fn cycles_completed(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.state, RevisionState::FinalAccepted { .. })
    }
}

/// Use case for the review/revision loop
pub struct RunRevisionUseCase<E: AgentExecutor + 'static> {
    team: ResearchTeam<E>,
    policy: RevisionPolicy,
    artifacts: Arc<dyn ArtifactSink>,
    journal: Arc<dyn RunJournal>,
    stores: KnowledgeStores,
    document_id: String,
}

impl<E: AgentExecutor + 'static> RunRevisionUseCase<E> {
    pub fn new(team: ResearchTeam<E>, policy: RevisionPolicy) -> Self {
        Self {
            team,
            policy,
            artifacts: Arc::new(NoArtifacts),
            journal: Arc::new(NoJournal),
            stores: KnowledgeStores::new(),
            document_id: "draft".to_string(),
        }
    }

    /// Share the run's knowledge stores with the loop.
    pub fn with_stores(mut self, stores: KnowledgeStores) -> Self {
        self.stores = stores;
        self
    }

    /// Key prefix for this document's store entries
    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = document_id.into();
        self
    }

    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactSink>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn RunJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Execute the loop with default (no-op) progress
    pub async fn execute(&self, draft: &str) -> Result<RevisionOutcome, DomainError> {
        self.execute_with_progress(draft, &NoProgress).await
    }

    /// Execute the loop with progress callbacks
    pub async fn execute_with_progress(
        &self,
        draft: &str,
        progress: &dyn PipelineProgress,
    ) -> Result<RevisionOutcome, DomainError> {
        require_text("draft", draft)?;
        let mut machine = RevisionMachine::new(draft, self.policy);
        self.notify(&machine, progress);

        let evaluation = self.team.evaluate_paper(draft).await?;
        let Some(evaluation) = Self::usable_json("evaluation", &evaluation)? else {
            return Ok(Self::interrupted(&machine, "evaluation", &evaluation));
        };
        self.persist_json(artifact::EVALUATION, &evaluation);
        self.remember(RoleKind::Reviewer, "evaluation", evaluation.clone());
        machine.record_evaluation(evaluation.clone())?;
        self.notify(&machine, progress);

        let suggestions = self.team.provide_suggestions(&evaluation).await?;
        let Some(suggestions) = Self::usable_json("suggestions", &suggestions)? else {
            return Ok(Self::interrupted(&machine, "suggestions", &suggestions));
        };
        self.persist_json(artifact::SUGGESTIONS, &suggestions);
        self.remember(RoleKind::Reviewer, "suggestions", suggestions.clone());

        let issued = SuggestionSet::from_json(&suggestions);
        if issued.is_empty() {
            info!("Reviewer raised no suggestions; accepting draft as is");
            machine.accept_as_is()?;
            self.notify(&machine, progress);
            return Ok(RevisionOutcome::from_machine(&machine, None));
        }
        info!(
            "Reviewer issued {} suggestion(s), {} major",
            issued.len(),
            issued.major_count()
        );
        machine.issue_suggestions(issued)?;
        self.notify(&machine, progress);

        while let Some(cycle) = machine.open_cycle().cloned() {
            let suggestions_json = cycle.suggestions.to_json();

            let revised = self
                .team
                .revise_draft(&cycle.draft, &suggestions_json)
                .await?;
            let revised_text = match revised.text() {
                Some(text) if !revised.is_degraded() => text.to_string(),
                _ => return Ok(Self::interrupted(&machine, "revision", &revised)),
            };
            self.persist_text(artifact::REVISED, &revised_text);
            self.remember(
                RoleKind::Phd,
                &format!("revision-{}", cycle.number),
                json!({"cycle": cycle.number, "draft": revised_text}),
            );
            machine.record_revision(revised_text.clone())?;
            self.notify(&machine, progress);

            let check = self
                .team
                .check_revision(&cycle.draft, &revised_text, &suggestions_json)
                .await?;
            let Some(check_json) = Self::usable_json("revision check", &check)? else {
                return Ok(Self::interrupted(&machine, "revision check", &check));
            };
            self.persist_json(artifact::REVISION_CHECK, &check_json);
            self.remember(
                RoleKind::Reviewer,
                &format!("check-{}", cycle.number),
                check_json.clone(),
            );

            let check = RevisionCheck::from_json(&check_json, &cycle.suggestions);
            info!(
                "Cycle {}: {} addressed, {} pending ({} major), {} new issue(s)",
                cycle.number,
                check.addressed.len(),
                check.pending.len(),
                check.pending_major(),
                check.new_issues.len()
            );
            machine.record_check(check)?;
            self.notify(&machine, progress);

            machine.decide()?;
            self.notify(&machine, progress);
            if machine.is_terminal() {
                break;
            }

            machine.resume()?;
            self.notify(&machine, progress);
        }

        Ok(RevisionOutcome::from_machine(&machine, None))
    }

    /// The JSON of a non-degraded stage, or `None` when the stage degraded.
    fn usable_json(stage: &str, result: &StageResult) -> Result<Option<Value>, DomainError> {
        if result.is_degraded() {
            return Ok(None);
        }
        match result.json() {
            Some(value) => Ok(Some(value.clone())),
            None => Err(DomainError::InputValidation(format!(
                "{} stage produced text where JSON was expected",
                stage
            ))),
        }
    }

    fn interrupted(machine: &RevisionMachine, stage: &str, result: &StageResult) -> RevisionOutcome {
        let reason = match &result.failure {
            Some(failure) => format!("{} failed: {}", stage, failure),
            None => format!("{} produced no usable output", stage),
        };
        warn!("Revision loop stopped in state {}: {}", machine.state(), reason);
        RevisionOutcome::from_machine(machine, Some(reason))
    }

    fn notify(&self, machine: &RevisionMachine, progress: &dyn PipelineProgress) {
        let cycle = machine
            .open_cycle()
            .map(|c| c.number)
            .unwrap_or(machine.cycles_completed());
        info!("Revision state: {} (cycle {})", machine.state(), cycle);
        progress.on_revision_state(machine.state(), cycle);
        self.journal.record(RunEvent::new(
            "revision_state",
            json!({"state": machine.state().as_str(), "cycle": cycle}),
        ));
    }

    fn remember(&self, role: RoleKind, step: &str, content: Value) {
        self.stores
            .for_role(role)
            .put(format!("{}/{}", self.document_id, step), content);
    }

    fn persist_json(&self, name: &str, value: &Value) {
        if let Err(e) = self.artifacts.write_json(name, value) {
            warn!("{}", e);
        }
    }

    fn persist_text(&self, name: &str, text: &str) {
        if let Err(e) = self.artifacts.write_text(name, text) {
            warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::artifact_sink::ArtifactError;
    use crate::use_cases::shared::testing::ScriptedExecutor;
    use litreview_domain::{ExhaustionPolicy, RoleKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryArtifacts {
        written: Mutex<Vec<String>>,
    }

    impl ArtifactSink for MemoryArtifacts {
        fn write_json(&self, name: &str, _value: &Value) -> Result<(), ArtifactError> {
            self.written.lock().unwrap().push(format!("{}.json", name));
            Ok(())
        }

        fn write_text(&self, name: &str, _text: &str) -> Result<(), ArtifactError> {
            self.written.lock().unwrap().push(format!("{}.txt", name));
            Ok(())
        }
    }

    const EVALUATION: &str = r#"{"scores": {"logic": 6}, "overall_score": 6}"#;
    const SUGGESTIONS: &str = r#"{
        "major_revisions": [
            {"aspect": "coverage", "current_issue": "misses 2023 work", "suggestion": "add recent surveys"},
            {"aspect": "structure", "current_issue": "sections overlap", "suggestion": "merge sections 2 and 3"}
        ],
        "minor_revisions": [{"aspect": "style", "suggestion": "shorten the abstract"}],
        "priority_order": []
    }"#;
    const ONE_MAJOR_PENDING: &str = r#"{
        "addressed_suggestions": [{"suggestion": "merge sections 2 and 3"}, {"suggestion": "shorten the abstract"}],
        "pending_suggestions": [{"suggestion": "add recent surveys"}],
        "new_issues": []
    }"#;
    const ALL_ADDRESSED: &str = r#"{
        "addressed_suggestions": [{"suggestion": "add recent surveys"}],
        "pending_suggestions": [],
        "new_issues": []
    }"#;

    fn use_case(
        executor: &Arc<ScriptedExecutor>,
        policy: RevisionPolicy,
    ) -> RunRevisionUseCase<ScriptedExecutor> {
        RunRevisionUseCase::new(ResearchTeam::new(executor.clone()), policy)
    }

    #[tokio::test]
    async fn test_pending_major_triggers_second_cycle() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            EVALUATION,
            SUGGESTIONS,
            "draft v1",
            ONE_MAJOR_PENDING,
            "draft v2",
            ALL_ADDRESSED,
        ]));
        let artifacts = Arc::new(MemoryArtifacts::default());

        let outcome = use_case(&executor, RevisionPolicy::default())
            .with_artifacts(artifacts.clone())
            .execute("draft v0")
            .await
            .unwrap();

        assert_eq!(outcome.cycles_completed(), 2);
        assert_eq!(outcome.state, RevisionState::FinalAccepted { caveats: vec![] });
        assert_eq!(outcome.final_draft, "draft v2");
        assert!(outcome.interrupted.is_none());

        let first = outcome.cycles[0].check.as_ref().unwrap();
        assert_eq!(first.addressed.len(), 2);
        assert_eq!(first.pending_major(), 1);
        assert_eq!(outcome.cycles[1].suggestions.len(), 1);
        assert_eq!(outcome.cycles[1].draft, "draft v1");

        assert_eq!(
            executor.roles(),
            vec![
                RoleKind::Reviewer,
                RoleKind::Reviewer,
                RoleKind::Phd,
                RoleKind::Reviewer,
                RoleKind::Phd,
                RoleKind::Reviewer,
            ]
        );
        assert_eq!(
            artifacts.written.lock().unwrap()[..4],
            ["evaluation.json", "suggestions.json", "revised.txt", "revision_check.json"]
        );
    }

    #[tokio::test]
    async fn test_loop_outputs_land_in_owning_role_stores() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            EVALUATION,
            SUGGESTIONS,
            "draft v1",
            ONE_MAJOR_PENDING,
            "draft v2",
            ALL_ADDRESSED,
        ]));
        let stores = KnowledgeStores::new();

        use_case(&executor, RevisionPolicy::default())
            .with_stores(stores.clone())
            .with_document_id("review/rag")
            .execute("draft v0")
            .await
            .unwrap();

        let reviewer = stores.for_role(RoleKind::Reviewer);
        assert_eq!(reviewer.len(), 4);
        assert_eq!(
            reviewer.get("review/rag/evaluation").unwrap().content["overall_score"],
            6
        );
        assert!(reviewer.contains("review/rag/suggestions"));
        assert!(reviewer.contains("review/rag/check-1"));
        assert!(reviewer.contains("review/rag/check-2"));
        assert_eq!(reviewer.get("review/rag/evaluation").unwrap().writer, RoleKind::Reviewer);

        let phd = stores.for_role(RoleKind::Phd);
        assert_eq!(phd.len(), 2);
        assert_eq!(phd.get("review/rag/revision-2").unwrap().content["draft"], "draft v2");
        assert!(phd.get("review/rag/revision-3").is_none());

        assert!(stores.for_role(RoleKind::Professor).is_empty());
    }

    #[tokio::test]
    async fn test_budget_exhaustion_stops_after_max_cycles() {
        let mut replies = vec![EVALUATION, SUGGESTIONS];
        for _ in 0..4 {
            replies.push("revised");
            replies.push(ONE_MAJOR_PENDING);
        }
        let executor = Arc::new(ScriptedExecutor::replies(&replies));

        let outcome = use_case(&executor, RevisionPolicy::default())
            .execute("draft v0")
            .await
            .unwrap();

        assert_eq!(outcome.cycles_completed(), 3);
        assert_eq!(executor.call_count(), 2 + 3 * 2);
        match &outcome.state {
            RevisionState::FinalAccepted { caveats } => assert_eq!(caveats.len(), 1),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_can_fail_quality() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            EVALUATION,
            SUGGESTIONS,
            "revised",
            ONE_MAJOR_PENDING,
        ]));
        let policy = RevisionPolicy::new(1).with_exhaustion(ExhaustionPolicy::FailQuality);

        let outcome = use_case(&executor, policy).execute("draft v0").await.unwrap();

        assert_eq!(outcome.state, RevisionState::FailedQuality);
        assert!(!outcome.is_accepted());
    }

    #[tokio::test]
    async fn test_degraded_evaluation_interrupts_loop() {
        let executor = Arc::new(ScriptedExecutor::replies(&["no json", "no json again"]));

        let outcome = use_case(&executor, RevisionPolicy::default())
            .execute("draft v0")
            .await
            .unwrap();

        assert_eq!(outcome.state, RevisionState::Drafted);
        assert!(outcome.interrupted.unwrap().starts_with("evaluation failed"));
        assert_eq!(outcome.final_draft, "draft v0");
        assert_eq!(executor.call_count(), 2);
    }

    #[tokio::test]
    async fn test_no_suggestions_accepts_as_is() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            EVALUATION,
            r#"{"major_revisions": [], "minor_revisions": []}"#,
        ]));

        let outcome = use_case(&executor, RevisionPolicy::default())
            .execute("draft v0")
            .await
            .unwrap();

        assert!(outcome.is_accepted());
        assert_eq!(outcome.cycles_completed(), 0);
    }

    #[tokio::test]
    async fn test_empty_draft_is_rejected() {
        let executor = Arc::new(ScriptedExecutor::replies(&[EVALUATION]));
        let err = use_case(&executor, RevisionPolicy::default())
            .execute("")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InputValidation(_)));
        assert_eq!(executor.call_count(), 0);
    }
}
