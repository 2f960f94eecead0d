//! Generate Review use case
//!
//! The top-level entry point: runs the literature-review pipeline for a
//! topic, then the revision loop and a final review on whatever draft the
//! pipeline produced. Task failures never abort the run; the returned
//! [`ReviewReport`] is partial instead.
//!
//! Each role's outputs are kept in its knowledge store under
//! `review/<topic slug>/<step>`; retrieved papers stay keyed by paper id.

use crate::config::PipelineParams;
use crate::ports::agent_executor::AgentExecutor;
use crate::ports::artifact_sink::{ArtifactSink, NoArtifacts};
use crate::ports::knowledge_archive::KnowledgeArchive;
use crate::ports::literature_search::LiteratureSearch;
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::ports::run_journal::{NoJournal, RunEvent, RunJournal};
use crate::use_cases::role_operations::ResearchTeam;
use crate::use_cases::run_pipeline::RunPipelineUseCase;
use crate::use_cases::run_revision::{RevisionOutcome, RunRevisionUseCase};
use litreview_domain::workflow::{artifact, stage};
use litreview_domain::{
    DomainError, KnowledgeStores, LiteratureReviewWorkflow, Pipeline, PipelineRun, RoleKind,
    RoleRoster, RunStatus, TaskId, TaskKind, TaskOutput, Topic,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that abort a review before it produces a report
#[derive(Error, Debug)]
pub enum GenerateReviewError {
    #[error("Invalid input: {0}")]
    InvalidInput(DomainError),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(DomainError),
}

/// Everything a review run produced
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub topic: String,
    pub status: RunStatus,
    pub run: PipelineRun,
    pub revision: Option<RevisionOutcome>,
    /// The newest draft: revised if the loop ran, else integrated or raw
    pub final_draft: Option<String>,
    pub final_review: Option<Value>,
    /// Non-fatal problems (artifact or archive I/O, degraded final review)
    pub warnings: Vec<String>,
}

impl ReviewReport {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Succeeded && self.final_review.is_some()
    }
}

/// Use case for generating a literature review end to end
pub struct GenerateReviewUseCase<E: AgentExecutor + 'static, S: LiteratureSearch + 'static> {
    executor: Arc<E>,
    search: Arc<S>,
    roster: RoleRoster,
    params: PipelineParams,
    artifacts: Arc<dyn ArtifactSink>,
    archive: Option<Arc<dyn KnowledgeArchive>>,
    journal: Arc<dyn RunJournal>,
    cancellation_token: Option<CancellationToken>,
}

impl<E: AgentExecutor + 'static, S: LiteratureSearch + 'static> GenerateReviewUseCase<E, S> {
    pub fn new(executor: Arc<E>, search: Arc<S>) -> Self {
        Self {
            executor,
            search,
            roster: RoleRoster::default(),
            params: PipelineParams::default(),
            artifacts: Arc::new(NoArtifacts),
            archive: None,
            journal: Arc::new(NoJournal),
            cancellation_token: None,
        }
    }

    pub fn with_roster(mut self, roster: RoleRoster) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_params(mut self, params: PipelineParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactSink>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_archive(mut self, archive: Arc<dyn KnowledgeArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn RunJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    fn team(&self) -> ResearchTeam<E> {
        let team = ResearchTeam::new(self.executor.clone())
            .with_roster(self.roster.clone())
            .with_parse_retries(self.params.parse_retries);
        match &self.cancellation_token {
            Some(token) => team.with_cancellation(token.clone()),
            None => team,
        }
    }

    fn crew(&self) -> RunPipelineUseCase<E, S> {
        let crew = RunPipelineUseCase::new(self.executor.clone(), self.search.clone())
            .with_roster(self.roster.clone())
            .with_params(self.params.clone())
            .with_journal(self.journal.clone());
        match &self.cancellation_token {
            Some(token) => crew.with_cancellation(token.clone()),
            None => crew,
        }
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, topic: &str) -> Result<ReviewReport, GenerateReviewError> {
        self.execute_with_progress(topic, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        topic: &str,
        progress: &dyn PipelineProgress,
    ) -> Result<ReviewReport, GenerateReviewError> {
        let topic = Topic::parse(topic).map_err(GenerateReviewError::InvalidInput)?;
        let pipeline = LiteratureReviewWorkflow::new(topic.clone())
            .build()
            .map_err(GenerateReviewError::InvalidPipeline)?;
        let mut warnings = Vec::new();
        let document_id = format!("review/{}", topic.slug());

        info!("Generating literature review for: {}", topic);
        self.journal.record(RunEvent::new(
            "review_started",
            json!({"topic": topic.content(), "tasks": pipeline.len()}),
        ));

        let stores = self.load_stores(&mut warnings);
        let run = self
            .crew()
            .execute_with_progress(&pipeline, &stores, progress)
            .await;
        self.persist_stage_outputs(&pipeline, &run, &mut warnings);
        Self::remember_stage_outputs(&pipeline, &run, &stores, &document_id);

        let draft = Self::best_draft(&run);
        let mut revision = None;
        let mut final_draft = draft.clone();
        let mut final_review = None;

        let cancelled = run.is_cancelled()
            || self
                .cancellation_token
                .as_ref()
                .is_some_and(|t| t.is_cancelled());

        if let Some(draft) = draft.filter(|_| !cancelled) {
            if self.params.skip_revision {
                info!("Revision loop disabled");
            } else {
                let outcome = RunRevisionUseCase::new(self.team(), self.params.revision)
                    .with_artifacts(self.artifacts.clone())
                    .with_journal(self.journal.clone())
                    .with_stores(stores.clone())
                    .with_document_id(document_id.clone())
                    .execute_with_progress(&draft, progress)
                    .await;
                revision = Self::absorb_revision(outcome, &mut warnings);
                if let Some(outcome) = &revision {
                    final_draft = Some(outcome.final_draft.clone());
                }
            }

            if let Some(paper) = final_draft.as_deref() {
                final_review = self.run_final_review(paper, &mut warnings).await;
                if let Some(review) = &final_review {
                    stores
                        .for_role(RoleKind::Reviewer)
                        .put(format!("{}/final_review", document_id), review.clone());
                }
            }
        } else if !cancelled {
            warnings.push("pipeline produced no draft; revision skipped".to_string());
        }

        self.save_stores(&stores, &mut warnings);

        let report = ReviewReport {
            topic: topic.into_content(),
            status: run.status(),
            run,
            revision,
            final_draft,
            final_review,
            warnings,
        };

        match serde_json::to_value(&report) {
            Ok(value) => self.write_json(artifact::REPORT, &value, &mut Vec::new()),
            Err(e) => warn!("Failed to serialize report: {}", e),
        }
        self.journal.record(RunEvent::new(
            "review_finished",
            json!({"status": report.status.as_str(), "warnings": report.warnings.len()}),
        ));
        info!("Review finished: {}", report.status.as_str());

        Ok(report)
    }

    /// Keep a finished loop's outcome; a loop error becomes a warning so
    /// the partial report and the stores are still persisted.
    fn absorb_revision(
        result: Result<RevisionOutcome, DomainError>,
        warnings: &mut Vec<String>,
    ) -> Option<RevisionOutcome> {
        match result {
            Ok(outcome) => {
                if let Some(reason) = &outcome.interrupted {
                    warnings.push(format!("revision loop interrupted: {}", reason));
                }
                Some(outcome)
            }
            Err(e) => {
                warn!("Revision loop aborted: {}", e);
                warnings.push(format!("revision loop aborted: {}", e));
                None
            }
        }
    }

    async fn run_final_review(&self, paper: &str, warnings: &mut Vec<String>) -> Option<Value> {
        let result = match self.team().final_review(paper).await {
            Ok(result) => result,
            Err(e) => {
                warnings.push(format!("final review skipped: {}", e));
                return None;
            }
        };
        if let Some(failure) = &result.failure {
            warnings.push(format!("final review failed: {}", failure));
            return None;
        }
        let value = result.json()?.clone();
        self.write_json(artifact::FINAL_REVIEW, &value, warnings);
        Some(value)
    }

    /// Integrated content if the integration stage produced any, else the
    /// raw draft.
    fn best_draft(run: &PipelineRun) -> Option<String> {
        let integrated = run
            .output(&TaskId::from(stage::INTEGRATE_REVIEW))
            .and_then(TaskOutput::as_json)
            .and_then(|v| v.get("integrated_content"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(text) = integrated {
            return Some(text.to_string());
        }
        run.output(&TaskId::from(stage::DRAFT_REVIEW))
            .and_then(TaskOutput::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Keep each succeeded prompt task's output in its role's store.
    /// Retrieval tasks already stored their papers.
    fn remember_stage_outputs(
        pipeline: &Pipeline,
        run: &PipelineRun,
        stores: &KnowledgeStores,
        document_id: &str,
    ) {
        for task in pipeline.tasks().iter().filter(|t| t.kind != TaskKind::Retrieval) {
            if let Some(output) = run.output(&task.id) {
                stores
                    .for_role(task.role)
                    .put(format!("{}/{}", document_id, task.id), output.to_value());
            }
        }
    }

    fn persist_stage_outputs(
        &self,
        pipeline: &Pipeline,
        run: &PipelineRun,
        warnings: &mut Vec<String>,
    ) {
        for task in pipeline.tasks() {
            let (Some(name), Some(output)) = (&task.artifact, run.output(&task.id)) else {
                continue;
            };
            match output {
                TaskOutput::Json(value) => self.write_json(name, value, warnings),
                TaskOutput::Text(text) => {
                    if let Err(e) = self.artifacts.write_text(name, text) {
                        warn!("{}", e);
                        warnings.push(e.to_string());
                    }
                }
            }
        }
    }

    fn write_json(&self, name: &str, value: &Value, warnings: &mut Vec<String>) {
        if let Err(e) = self.artifacts.write_json(name, value) {
            warn!("{}", e);
            warnings.push(e.to_string());
        }
    }

    fn load_stores(&self, warnings: &mut Vec<String>) -> KnowledgeStores {
        let mut stores = KnowledgeStores::new();
        let Some(archive) = self.archive.as_ref().filter(|_| self.params.persist_knowledge) else {
            return stores;
        };
        for kind in RoleKind::ALL {
            match archive.load(kind) {
                Ok(Some(store)) => {
                    info!("Loaded {} knowledge entries for {}", store.len(), kind);
                    stores = stores.with_store(store);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{}", e);
                    warnings.push(e.to_string());
                }
            }
        }
        stores
    }

    fn save_stores(&self, stores: &KnowledgeStores, warnings: &mut Vec<String>) {
        let Some(archive) = self.archive.as_ref().filter(|_| self.params.persist_knowledge) else {
            return;
        };
        for store in stores.iter().filter(|s| !s.is_empty()) {
            if let Err(e) = archive.save(store) {
                warn!("{}", e);
                warnings.push(e.to_string());
            }
        }
    }
}
