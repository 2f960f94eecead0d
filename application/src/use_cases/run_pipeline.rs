//! Run Pipeline use case
//!
//! The crew: executes a validated [`Pipeline`] task by task in
//! topological order, feeding each task the results of its context tasks.
//!
//! - A failed task keeps its contract's empty default and every task that
//!   depends on it (transitively) is skipped; independent branches run on.
//! - A cancelled token, or a role running out of its iteration budget,
//!   skips everything not yet started and returns the partial run.

use crate::config::PipelineParams;
use crate::ports::agent_executor::AgentExecutor;
use crate::ports::literature_search::LiteratureSearch;
use crate::ports::progress::{NoProgress, PipelineProgress};
use crate::ports::run_journal::{NoJournal, RunEvent, RunJournal};
use crate::use_cases::shared::{StageResult, execute_decoded, is_cancelled};
use litreview_domain::workflow::contracts;
use litreview_domain::{
    AgentRole, DomainError, KnowledgeStores, Paper, Pipeline, PipelineRun, PromptTemplate,
    RoleKind, RoleRoster, TaskId, TaskKind, TaskOutcome, TaskOutput, TaskSpec, TaskStatus,
    ToolRef, ToolSet,
};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for running a pipeline of role-scoped tasks
pub struct RunPipelineUseCase<E: AgentExecutor + 'static, S: LiteratureSearch + 'static> {
    executor: Arc<E>,
    search: Arc<S>,
    roster: RoleRoster,
    params: PipelineParams,
    journal: Arc<dyn RunJournal>,
    cancellation_token: Option<CancellationToken>,
}

impl<E, S> Clone for RunPipelineUseCase<E, S>
where
    E: AgentExecutor + 'static,
    S: LiteratureSearch + 'static,
{
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            search: self.search.clone(),
            roster: self.roster.clone(),
            params: self.params.clone(),
            journal: self.journal.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<E: AgentExecutor + 'static, S: LiteratureSearch + 'static> RunPipelineUseCase<E, S> {
    pub fn new(executor: Arc<E>, search: Arc<S>) -> Self {
        Self {
            executor,
            search,
            roster: RoleRoster::default(),
            params: PipelineParams::default(),
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

    pub fn with_journal(mut self, journal: Arc<dyn RunJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Validate `tasks` into a pipeline and run it.
    ///
    /// Construction errors (cycles, unknown or forward context) are returned
    /// before any task runs.
    pub async fn run_tasks(
        &self,
        tasks: Vec<TaskSpec>,
        stores: &KnowledgeStores,
    ) -> Result<PipelineRun, DomainError> {
        let pipeline = Pipeline::new(tasks)?;
        Ok(self.execute(&pipeline, stores).await)
    }

    /// Execute the pipeline with default (no-op) progress
    pub async fn execute(&self, pipeline: &Pipeline, stores: &KnowledgeStores) -> PipelineRun {
        self.execute_with_progress(pipeline, stores, &NoProgress)
            .await
    }

    /// Execute the pipeline with progress callbacks
    pub async fn execute_with_progress(
        &self,
        pipeline: &Pipeline,
        stores: &KnowledgeStores,
        progress: &dyn PipelineProgress,
    ) -> PipelineRun {
        let mut run = PipelineRun::new(pipeline);
        let mut iterations: HashMap<RoleKind, usize> = HashMap::new();

        info!("Running pipeline with {} tasks", pipeline.len());
        progress.on_pipeline_start(pipeline.len());

        for task in pipeline.topological_order() {
            if run.status_of(&task.id) == Some(TaskStatus::Skipped) {
                continue;
            }

            if is_cancelled(&self.cancellation_token) {
                warn!("Pipeline cancelled before task '{}'", task.id);
                self.cancel_remaining(&mut run, "pipeline cancelled", progress);
                break;
            }

            let role = self.role(task.role);
            let used = iterations.entry(task.role).or_insert(0);
            if *used >= role.max_iterations {
                let reason = format!(
                    "iteration budget of {} ({}) exhausted",
                    task.role, role.max_iterations
                );
                warn!("{}", reason);
                self.cancel_remaining(&mut run, &reason, progress);
                break;
            }
            *used += 1;

            run.begin(&task.id);
            progress.on_task_start(task);
            self.journal.record(RunEvent::new(
                "task_started",
                json!({"task": task.id, "role": task.role}),
            ));
            info!("Task '{}' started ({})", task.id, task.role);

            let context: Vec<(TaskId, TaskOutput)> = task
                .context
                .iter()
                .filter_map(|id| run.output(id).map(|o| (id.clone(), o.clone())))
                .collect();
            let tools = role.effective_tools(task.tool_overrides.as_ref());

            let outcome = match task.kind {
                TaskKind::Prompt => self.run_prompt(task, &role, &tools, &context).await,
                TaskKind::Retrieval => {
                    self.run_retrieval(task, &role, &tools, &context, stores)
                        .await
                }
            };

            let failed = outcome.status == TaskStatus::Failed;
            match &outcome.error {
                Some(error) => warn!("Task '{}' {}: {}", task.id, outcome.status, error),
                None => info!("Task '{}' {}", task.id, outcome.status),
            }
            progress.on_task_complete(task, &outcome);
            self.journal.record(RunEvent::new(
                "task_finished",
                json!({
                    "task": task.id,
                    "role": task.role,
                    "status": outcome.status.as_str(),
                    "attempts": outcome.attempts,
                    "error": outcome.error,
                }),
            ));
            run.record(outcome);

            if failed {
                self.skip_dependents(pipeline, &mut run, &task.id, progress);
            }
        }

        let (succeeded, failed, skipped) = run.tally();
        info!(
            "Pipeline finished: {} ({} succeeded, {} failed, {} skipped)",
            run.status().as_str(),
            succeeded,
            failed,
            skipped
        );
        run
    }

    fn role(&self, kind: RoleKind) -> AgentRole {
        self.roster
            .get(kind)
            .cloned()
            .unwrap_or_else(|| AgentRole::preset(kind))
    }

    fn notify_skipped(&self, id: &TaskId, reason: &str, progress: &dyn PipelineProgress) {
        progress.on_task_skipped(id, reason);
        self.journal.record(RunEvent::new(
            "task_skipped",
            json!({"task": id, "reason": reason}),
        ));
    }

    fn cancel_remaining(&self, run: &mut PipelineRun, reason: &str, progress: &dyn PipelineProgress) {
        for id in run.cancel_remaining(reason) {
            self.notify_skipped(&id, reason, progress);
        }
    }

    fn skip_dependents(
        &self,
        pipeline: &Pipeline,
        run: &mut PipelineRun,
        failed: &TaskId,
        progress: &dyn PipelineProgress,
    ) {
        let reason = format!("upstream task '{}' failed", failed);
        let blocked: HashSet<TaskId> = pipeline.transitive_dependents(failed);
        // Declaration order keeps notifications deterministic.
        for task in pipeline.tasks().iter().filter(|t| blocked.contains(&t.id)) {
            if run.status_of(&task.id) == Some(TaskStatus::Pending) {
                debug!("Skipping '{}': {}", task.id, reason);
                run.record(TaskOutcome::skipped(task.id.clone(), task.role, &reason));
                self.notify_skipped(&task.id, &reason, progress);
            }
        }
    }

    fn outcome_from(task: &TaskSpec, result: StageResult) -> TaskOutcome {
        match result.failure {
            None => TaskOutcome::succeeded(task.id.clone(), task.role, result.output, result.attempts),
            Some(failure) => TaskOutcome::failed(
                task.id.clone(),
                task.role,
                result.output,
                failure.to_string(),
                result.attempts,
            ),
        }
    }

    async fn run_prompt(
        &self,
        task: &TaskSpec,
        role: &AgentRole,
        tools: &ToolSet,
        context: &[(TaskId, TaskOutput)],
    ) -> TaskOutcome {
        let context_refs: Vec<(&TaskId, &TaskOutput)> =
            context.iter().map(|(id, output)| (id, output)).collect();
        let prompt =
            PromptTemplate::task_prompt(&task.description, &context_refs, &task.expected_output);

        let result = execute_decoded(
            self.executor.as_ref(),
            role,
            &prompt,
            tools,
            &task.expected_output,
            self.params.parse_retries,
            &self.cancellation_token,
        )
        .await;
        Self::outcome_from(task, result)
    }

    /// Search every keyword from context and keep the papers the role
    /// judges relevant, storing them in the role's knowledge store.
    async fn run_retrieval(
        &self,
        task: &TaskSpec,
        role: &AgentRole,
        tools: &ToolSet,
        context: &[(TaskId, TaskOutput)],
        stores: &KnowledgeStores,
    ) -> TaskOutcome {
        let fail = |error: String| {
            TaskOutcome::failed(
                task.id.clone(),
                task.role,
                TaskOutput::empty_for(&task.expected_output),
                error,
                0,
            )
        };

        if !tools.contains(&ToolRef::literature_search()) {
            return fail(format!(
                "{} may not use the literature_search tool",
                task.role
            ));
        }

        let (keywords, requirements) = search_plan(context);
        if keywords.is_empty() {
            return fail("no search keywords in task context".to_string());
        }

        let store = stores.for_role(task.role);
        let mut seen: HashSet<String> = HashSet::new();
        let mut papers: Vec<Value> = Vec::new();
        let mut errors: Vec<Value> = Vec::new();
        let mut calls = 0;

        for keyword in &keywords {
            if is_cancelled(&self.cancellation_token) {
                return fail("cancelled".to_string());
            }

            info!("Searching literature for '{}'", keyword);
            let mut results = self
                .search
                .search(keyword, self.params.search_max_results, &self.params.filters)
                .await;
            if let Some(error) = results.take_error() {
                warn!("Search for '{}' failed: {}", keyword, error);
                self.journal.record(RunEvent::new(
                    "search_error",
                    json!({"task": task.id, "keyword": keyword, "error": error.to_string()}),
                ));
                errors.push(json!({"keyword": keyword, "error": error.to_string()}));
            }

            let mut kept = 0;
            for paper in results {
                if kept >= self.params.papers_per_keyword {
                    break;
                }
                let paper_id = paper.paper_id();
                if seen.contains(&paper_id) {
                    continue;
                }

                let verdict = execute_decoded(
                    self.executor.as_ref(),
                    role,
                    &PromptTemplate::judge_relevance(&paper, &requirements),
                    tools,
                    &contracts::relevance(),
                    self.params.parse_retries,
                    &self.cancellation_token,
                )
                .await;
                calls += verdict.attempts;

                let Some((true, reason)) = relevance(&verdict) else {
                    debug!("'{}' judged not relevant", paper.title);
                    continue;
                };

                seen.insert(paper_id.clone());
                kept += 1;
                store.put(
                    paper_id.clone(),
                    json!({"paper": paper, "keyword": keyword, "reason": reason}),
                );
                papers.push(paper_summary(&paper_id, &paper, keyword, &reason));
            }
            debug!("Kept {} paper(s) for '{}'", kept, keyword);
        }

        info!(
            "Retrieval kept {} paper(s) across {} keyword(s)",
            papers.len(),
            keywords.len()
        );
        TaskOutcome::succeeded(
            task.id.clone(),
            task.role,
            TaskOutput::Json(json!({"papers": papers, "errors": errors})),
            calls.max(1),
        )
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Keywords and requirements from the first context result carrying them.
fn search_plan(context: &[(TaskId, TaskOutput)]) -> (Vec<String>, Vec<String>) {
    for (_, output) in context {
        let Some(value) = output.as_json() else {
            continue;
        };
        let keywords = string_list(value.get("keywords"));
        if !keywords.is_empty() {
            return (keywords, string_list(value.get("requirements")));
        }
    }
    (Vec::new(), Vec::new())
}

/// `Some((relevant, reason))` for a usable verdict; degraded verdicts are `None`.
fn relevance(verdict: &StageResult) -> Option<(bool, String)> {
    if verdict.is_degraded() {
        return None;
    }
    let value = verdict.json()?;
    let relevant = match value.get("relevant")? {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes"),
        _ => false,
    };
    let reason = value
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((relevant, reason))
}

fn paper_summary(paper_id: &str, paper: &Paper, keyword: &str, reason: &str) -> Value {
    json!({
        "paper_id": paper_id,
        "title": paper.title,
        "authors": paper.authors,
        "abstract": paper.abstract_text,
        "published_date": paper.published_date,
        "url": paper.url,
        "keyword": keyword,
        "reason": reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::agent_executor::ExecutionError;
    use crate::ports::literature_search::{NoSearch, SearchError, SearchResults};
    use crate::use_cases::shared::testing::ScriptedExecutor;
    use async_trait::async_trait;
    use litreview_domain::{OutputContract, RunStatus, SearchFilters};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    struct ScriptedSearch {
        results: Mutex<VecDeque<Result<Vec<Paper>, SearchError>>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedSearch {
        fn new(results: Vec<Result<Vec<Paper>, SearchError>>) -> Self {
            Self {
                results: Mutex::new(VecDeque::from(results)),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LiteratureSearch for ScriptedSearch {
        async fn search(
            &self,
            query: &str,
            max_results: usize,
            _filters: &SearchFilters,
        ) -> SearchResults {
            self.queries.lock().unwrap().push(query.to_string());
            match self.results.lock().unwrap().pop_front() {
                Some(Ok(mut papers)) => {
                    papers.truncate(max_results);
                    SearchResults::ok(papers)
                }
                Some(Err(e)) => SearchResults::failed(e),
                None => SearchResults::ok(vec![]),
            }
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl PipelineProgress for RecordingProgress {
        fn on_task_start(&self, task: &TaskSpec) {
            self.events.lock().unwrap().push(format!("start:{}", task.id));
        }
        fn on_task_complete(&self, task: &TaskSpec, outcome: &TaskOutcome) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:{}", outcome.status, task.id));
        }
        fn on_task_skipped(&self, task_id: &TaskId, _reason: &str) {
            self.events.lock().unwrap().push(format!("skipped:{}", task_id));
        }
        fn on_revision_state(&self, _state: &litreview_domain::RevisionState, _cycle: u32) {}
    }

    #[derive(Default)]
    struct MemoryJournal {
        events: Mutex<Vec<(String, Value)>>,
    }

    impl RunJournal for MemoryJournal {
        fn record(&self, event: RunEvent) {
            self.events
                .lock()
                .unwrap()
                .push((event.event_type.to_string(), event.payload));
        }
    }

    fn paper(id: &str, title: &str) -> Paper {
        let mut paper = Paper {
            title: title.to_string(),
            abstract_text: format!("Abstract of {}", title),
            ..Default::default()
        };
        paper.identifiers.insert("arxiv".into(), id.into());
        paper
    }

    fn crew(executor: &Arc<ScriptedExecutor>) -> RunPipelineUseCase<ScriptedExecutor, NoSearch> {
        RunPipelineUseCase::new(executor.clone(), Arc::new(NoSearch))
    }

    fn chain() -> Vec<TaskSpec> {
        vec![
            TaskSpec::new("a", RoleKind::Professor, "first"),
            TaskSpec::new("b", RoleKind::Postdoc, "second").with_context("a"),
            TaskSpec::new("c", RoleKind::Postdoc, "third").with_context("b"),
        ]
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_failed_task_skips_dependents_only() {
        let executor = Arc::new(ScriptedExecutor::new(vec![
            Ok("framework".to_string()),
            Err(ExecutionError::Timeout),
        ]));
        let progress = RecordingProgress::default();
        let pipeline = Pipeline::new(chain()).unwrap();

        let run = crew(&executor)
            .execute_with_progress(&pipeline, &KnowledgeStores::new(), &progress)
            .await;

        assert_eq!(run.status_of(&"a".into()), Some(TaskStatus::Succeeded));
        assert_eq!(run.status_of(&"b".into()), Some(TaskStatus::Failed));
        assert_eq!(run.status_of(&"c".into()), Some(TaskStatus::Skipped));
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(executor.call_count(), 2);
        assert_eq!(
            run.get(&"b".into()).unwrap().output,
            Some(TaskOutput::Text(String::new()))
        );
        assert_eq!(
            *progress.events.lock().unwrap(),
            vec!["start:a", "succeeded:a", "start:b", "failed:b", "skipped:c"]
        );
    }

    #[tokio::test]
    async fn test_independent_branch_continues_after_failure() {
        let executor = Arc::new(ScriptedExecutor::new(vec![
            Err(ExecutionError::RequestFailed("500".into())),
            Ok("side result".to_string()),
        ]));
        let tasks = vec![
            TaskSpec::new("a", RoleKind::Professor, "first"),
            TaskSpec::new("side", RoleKind::Reviewer, "independent"),
            TaskSpec::new("b", RoleKind::Postdoc, "second").with_context("a"),
        ];

        let run = crew(&executor)
            .run_tasks(tasks, &KnowledgeStores::new())
            .await
            .unwrap();

        assert_eq!(run.status_of(&"a".into()), Some(TaskStatus::Failed));
        assert_eq!(run.status_of(&"side".into()), Some(TaskStatus::Succeeded));
        assert_eq!(run.status_of(&"b".into()), Some(TaskStatus::Skipped));
    }

    #[tokio::test]
    async fn test_cycle_is_rejected_without_running() {
        let executor = Arc::new(ScriptedExecutor::replies(&["x", "y"]));
        let tasks = vec![
            TaskSpec::new("a", RoleKind::Professor, "first").with_context("b"),
            TaskSpec::new("b", RoleKind::Postdoc, "second").with_context("a"),
        ];

        let err = crew(&executor)
            .run_tasks(tasks, &KnowledgeStores::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Cycle { .. }));
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_context_is_rendered_into_prompt() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            r#"{"background": "bg", "objectives": []}"#,
            "analysis text",
        ]));
        let tasks = vec![
            TaskSpec::new("framework", RoleKind::Professor, "make a framework")
                .expecting(OutputContract::json(&["background"])),
            TaskSpec::new("analysis", RoleKind::Postdoc, "analyze it").with_context("framework"),
        ];

        let run = crew(&executor)
            .run_tasks(tasks, &KnowledgeStores::new())
            .await
            .unwrap();

        assert_eq!(run.status(), RunStatus::Succeeded);
        let prompts = executor.prompts();
        assert!(prompts[1].starts_with("analyze it"));
        assert!(prompts[1].contains("### framework"));
        assert!(prompts[1].contains("\"background\": \"bg\""));
    }

    #[tokio::test]
    async fn test_parse_failure_retries_once_then_fails_task() {
        let executor = Arc::new(ScriptedExecutor::replies(&["nope", "still nope", "unused"]));
        let tasks = vec![
            TaskSpec::new("k", RoleKind::Postdoc, "keywords")
                .expecting(OutputContract::json(&["keywords"])),
        ];

        let run = crew(&executor)
            .run_tasks(tasks, &KnowledgeStores::new())
            .await
            .unwrap();

        let outcome = run.get(&"k".into()).unwrap();
        assert_eq!(outcome.status, TaskStatus::Failed);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.output, Some(TaskOutput::Json(json!({}))));
        assert_eq!(executor.call_count(), 2);
    }

    #[tokio::test]
    async fn test_iteration_budget_cancels_remaining() {
        let executor = Arc::new(ScriptedExecutor::replies(&["one", "two", "three"]));
        let roster = RoleRoster::new(vec![AgentRole::postdoc().with_max_iterations(1)]);
        let tasks = vec![
            TaskSpec::new("a", RoleKind::Postdoc, "first"),
            TaskSpec::new("b", RoleKind::Postdoc, "second"),
            TaskSpec::new("c", RoleKind::Professor, "third"),
        ];

        let run = crew(&executor)
            .with_roster(roster)
            .run_tasks(tasks, &KnowledgeStores::new())
            .await
            .unwrap();

        assert_eq!(run.status_of(&"a".into()), Some(TaskStatus::Succeeded));
        assert_eq!(run.status_of(&"b".into()), Some(TaskStatus::Skipped));
        assert_eq!(run.status_of(&"c".into()), Some(TaskStatus::Skipped));
        assert_eq!(run.status(), RunStatus::Cancelled);
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_everything() {
        let executor = Arc::new(ScriptedExecutor::replies(&["x"]));
        let token = CancellationToken::new();
        token.cancel();

        let run = crew(&executor)
            .with_cancellation(token)
            .run_tasks(chain(), &KnowledgeStores::new())
            .await
            .unwrap();

        assert!(run.is_cancelled());
        assert_eq!(run.tally(), (0, 0, 3));
        assert_eq!(executor.call_count(), 0);
    }

    fn retrieval_tasks() -> Vec<TaskSpec> {
        vec![
            TaskSpec::new("keywords", RoleKind::Postdoc, "keywords")
                .expecting(OutputContract::json(&["keywords", "requirements"])),
            TaskSpec::new("search", RoleKind::Phd, "search")
                .retrieval()
                .expecting(OutputContract::json(&["papers", "errors"]))
                .with_context("keywords"),
        ]
    }

    #[tokio::test]
    async fn test_retrieval_keeps_relevant_papers() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            r#"{"keywords": ["rag", "dense retrieval"], "requirements": ["post-2020"]}"#,
            r#"{"relevant": true, "reason": "core RAG paper"}"#,
            r#"{"relevant": false, "reason": "off topic"}"#,
            r#"{"relevant": true, "reason": "dense retriever"}"#,
        ]));
        let search = Arc::new(ScriptedSearch::new(vec![
            Ok(vec![paper("2005.11401", "RAG"), paper("1111.0000", "Cooking")]),
            Ok(vec![paper("2004.04906", "DPR")]),
        ]));
        let journal = Arc::new(MemoryJournal::default());
        let stores = KnowledgeStores::new();

        let run = RunPipelineUseCase::new(executor.clone(), search.clone())
            .with_journal(journal.clone())
            .run_tasks(retrieval_tasks(), &stores)
            .await
            .unwrap();

        assert_eq!(run.status(), RunStatus::Succeeded);
        let output = run.output(&"search".into()).unwrap().as_json().unwrap().clone();
        let titles: Vec<_> = output["papers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["RAG", "DPR"]);
        assert_eq!(output["errors"], json!([]));

        let phd = stores.for_role(RoleKind::Phd);
        assert_eq!(phd.len(), 2);
        assert_eq!(phd.get("2005.11401").unwrap().content["reason"], "core RAG paper");
        assert!(phd.get("1111.0000").is_none());
        assert!(stores.for_role(RoleKind::Postdoc).is_empty());

        assert_eq!(
            *search.queries.lock().unwrap(),
            vec!["rag".to_string(), "dense retrieval".to_string()]
        );
        assert!(executor.prompts()[1].contains("- post-2020"));
        assert_eq!(
            journal.events.lock().unwrap().iter().filter(|(t, _)| t == "task_finished").count(),
            2
        );
    }

    #[tokio::test]
    async fn test_retrieval_records_search_errors() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            r#"{"keywords": ["rag", "dpr"], "requirements": []}"#,
            "not a verdict",
            "still not a verdict",
        ]));
        let search = Arc::new(ScriptedSearch::new(vec![
            Err(SearchError::Http("503 Service Unavailable".into())),
            Ok(vec![paper("2004.04906", "DPR")]),
        ]));
        let journal = Arc::new(MemoryJournal::default());
        let stores = KnowledgeStores::new();

        let run = RunPipelineUseCase::new(executor.clone(), search)
            .with_journal(journal.clone())
            .run_tasks(retrieval_tasks(), &stores)
            .await
            .unwrap();

        let outcome = run.get(&"search".into()).unwrap();
        assert_eq!(outcome.status, TaskStatus::Succeeded);
        let output = outcome.output.as_ref().unwrap().as_json().unwrap();
        assert_eq!(output["papers"], json!([]));
        assert_eq!(output["errors"][0]["keyword"], "rag");
        assert!(stores.for_role(RoleKind::Phd).is_empty());
        assert!(
            journal
                .events
                .lock()
                .unwrap()
                .iter()
                .any(|(t, p)| t == "search_error" && p["keyword"] == "rag")
        );
    }

    #[tokio::test]
    async fn test_retrieval_requires_search_tool() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            r#"{"keywords": ["rag"], "requirements": []}"#,
        ]));
        let mut tasks = retrieval_tasks();
        tasks[1].role = RoleKind::Reviewer;

        let run = crew(&executor)
            .run_tasks(tasks, &KnowledgeStores::new())
            .await
            .unwrap();

        let outcome = run.get(&"search".into()).unwrap();
        assert_eq!(outcome.status, TaskStatus::Failed);
        assert!(outcome.error.as_ref().unwrap().contains("literature_search"));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retrieval_caps_papers_per_keyword() {
        let executor = Arc::new(ScriptedExecutor::replies(&[
            r#"{"keywords": ["rag"], "requirements": []}"#,
            r#"{"relevant": true, "reason": "a"}"#,
            r#"{"relevant": true, "reason": "b"}"#,
        ]));
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![
            paper("1", "One"),
            paper("2", "Two"),
            paper("3", "Three"),
        ])]));
        let stores = KnowledgeStores::new();

        RunPipelineUseCase::new(executor.clone(), search)
            .with_params(PipelineParams::default().with_papers_per_keyword(2))
            .run_tasks(retrieval_tasks(), &stores)
            .await
            .unwrap();

        assert_eq!(stores.for_role(RoleKind::Phd).len(), 2);
        assert_eq!(executor.call_count(), 3);
    }
}
