//! Direct role-scoped operations.
//!
//! [`ResearchTeam`] exposes each role's operations as plain async calls.
//! Every operation validates its input before touching the executor, so
//! an empty input is an [`DomainError::InputValidation`] with no call made.
//! Structured output goes through the same decode-and-retry step as the
//! crew.

use crate::ports::agent_executor::AgentExecutor;
use crate::use_cases::shared::{StageResult, execute_decoded};
use litreview_domain::workflow::contracts;
use litreview_domain::{
    AgentRole, DomainError, OutputContract, PromptTemplate, RoleKind, RoleRoster, require_text,
    require_value,
};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct ResearchTeam<E: AgentExecutor + 'static> {
    executor: Arc<E>,
    roster: RoleRoster,
    parse_retries: u32,
    cancellation_token: Option<CancellationToken>,
}

impl<E: AgentExecutor + 'static> Clone for ResearchTeam<E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            roster: self.roster.clone(),
            parse_retries: self.parse_retries,
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<E: AgentExecutor + 'static> ResearchTeam<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self {
            executor,
            roster: RoleRoster::default(),
            parse_retries: 1,
            cancellation_token: None,
        }
    }

    pub fn with_roster(mut self, roster: RoleRoster) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_parse_retries(mut self, retries: u32) -> Self {
        self.parse_retries = retries;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn role(&self, kind: RoleKind) -> AgentRole {
        self.roster
            .get(kind)
            .cloned()
            .unwrap_or_else(|| AgentRole::preset(kind))
    }

    async fn run(&self, kind: RoleKind, prompt: String, contract: OutputContract) -> StageResult {
        let role = self.role(kind);
        let tools = role.effective_tools(None);
        execute_decoded(
            self.executor.as_ref(),
            &role,
            &prompt,
            &tools,
            &contract,
            self.parse_retries,
            &self.cancellation_token,
        )
        .await
    }

    // ==================== Professor ====================

    pub async fn create_framework(&self, topic: &str) -> Result<StageResult, DomainError> {
        require_text("research topic", topic)?;
        info!("Professor: creating research framework");
        Ok(self
            .run(
                RoleKind::Professor,
                PromptTemplate::create_framework(topic.trim()),
                contracts::framework(),
            )
            .await)
    }

    pub async fn review_paper(&self, paper: &str) -> Result<StageResult, DomainError> {
        require_text("paper content", paper)?;
        info!("Professor: reviewing paper");
        Ok(self
            .run(
                RoleKind::Professor,
                PromptTemplate::review_paper(paper.trim()),
                contracts::paper_review(),
            )
            .await)
    }

    pub async fn provide_guidance(&self, question: &str) -> Result<StageResult, DomainError> {
        require_text("research question", question)?;
        Ok(self
            .run(
                RoleKind::Professor,
                PromptTemplate::provide_guidance(question.trim()),
                contracts::guidance(),
            )
            .await)
    }

    // ==================== Postdoc ====================

    pub async fn analyze_framework(&self, framework: &Value) -> Result<StageResult, DomainError> {
        require_value("research framework", framework)?;
        info!("Postdoc: analyzing framework");
        Ok(self
            .run(
                RoleKind::Postdoc,
                PromptTemplate::analyze_framework(framework),
                contracts::framework_analysis(),
            )
            .await)
    }

    pub async fn assign_tasks(&self, task: &str) -> Result<StageResult, DomainError> {
        require_text("research task", task)?;
        Ok(self
            .run(
                RoleKind::Postdoc,
                PromptTemplate::assign_tasks(task.trim()),
                contracts::keywords(),
            )
            .await)
    }

    pub async fn integrate_paper(&self, content: &str) -> Result<StageResult, DomainError> {
        require_text("paper content", content)?;
        Ok(self
            .run(
                RoleKind::Postdoc,
                PromptTemplate::integrate_paper(content),
                contracts::integrated(),
            )
            .await)
    }

    // ==================== PhD ====================

    pub async fn analyze_literature(&self, papers: &Value) -> Result<StageResult, DomainError> {
        require_value("papers", papers)?;
        Ok(self
            .run(
                RoleKind::Phd,
                PromptTemplate::analyze_literature(papers),
                contracts::findings(),
            )
            .await)
    }

    pub async fn write_draft(
        &self,
        analysis: &Value,
        outline: &Value,
    ) -> Result<StageResult, DomainError> {
        require_value("literature analysis", analysis)?;
        require_value("outline", outline)?;
        Ok(self
            .run(
                RoleKind::Phd,
                PromptTemplate::write_draft(analysis, outline),
                contracts::draft(),
            )
            .await)
    }

    pub async fn revise_draft(
        &self,
        draft: &str,
        suggestions: &Value,
    ) -> Result<StageResult, DomainError> {
        require_text("draft", draft)?;
        require_value("suggestions", suggestions)?;
        info!("PhD: revising draft");
        Ok(self
            .run(
                RoleKind::Phd,
                PromptTemplate::revise_draft(draft, suggestions),
                contracts::draft(),
            )
            .await)
    }

    // ==================== Reviewer ====================

    pub async fn evaluate_paper(&self, paper: &str) -> Result<StageResult, DomainError> {
        require_text("paper", paper)?;
        info!("Reviewer: evaluating paper");
        Ok(self
            .run(
                RoleKind::Reviewer,
                PromptTemplate::evaluate_paper(paper),
                contracts::evaluation(),
            )
            .await)
    }

    pub async fn provide_suggestions(&self, evaluation: &Value) -> Result<StageResult, DomainError> {
        require_value("evaluation", evaluation)?;
        Ok(self
            .run(
                RoleKind::Reviewer,
                PromptTemplate::provide_suggestions(evaluation),
                contracts::suggestions(),
            )
            .await)
    }

    pub async fn check_revision(
        &self,
        original: &str,
        revised: &str,
        suggestions: &Value,
    ) -> Result<StageResult, DomainError> {
        require_text("original draft", original)?;
        require_text("revised draft", revised)?;
        require_value("suggestions", suggestions)?;
        Ok(self
            .run(
                RoleKind::Reviewer,
                PromptTemplate::check_revision(original, revised, suggestions),
                contracts::revision_check(),
            )
            .await)
    }

    pub async fn final_review(&self, paper: &str) -> Result<StageResult, DomainError> {
        require_text("paper", paper)?;
        info!("Reviewer: final review");
        Ok(self
            .run(
                RoleKind::Reviewer,
                PromptTemplate::final_review(paper),
                contracts::final_review(),
            )
            .await)
    }
}
