//! The literature-review workflow, declared in code.

pub mod contracts;

use crate::agent::role::RoleKind;
use crate::agent::tool::ToolRef;
use crate::core::error::DomainError;
use crate::core::topic::Topic;
use crate::pipeline::graph::Pipeline;
use crate::pipeline::task::TaskSpec;
use crate::prompt::PromptTemplate;

/// Task ids of the review pipeline
pub mod stage {
    pub const CREATE_FRAMEWORK: &str = "create_framework";
    pub const ANALYZE_FRAMEWORK: &str = "analyze_framework";
    pub const ASSIGN_KEYWORDS: &str = "assign_keywords";
    pub const SEARCH_LITERATURE: &str = "search_literature";
    pub const ANALYZE_LITERATURE: &str = "analyze_literature";
    pub const DRAFT_REVIEW: &str = "draft_review";
    pub const INTEGRATE_REVIEW: &str = "integrate_review";
}

/// Names of persisted stage documents (without extension)
pub mod artifact {
    pub const FRAMEWORK: &str = "framework";
    pub const ANALYSIS: &str = "analysis";
    pub const KEYWORDS: &str = "keywords";
    pub const LITERATURE: &str = "literature";
    pub const FINDINGS: &str = "findings";
    pub const DRAFT: &str = "draft";
    pub const INTEGRATED: &str = "integrated";
    pub const EVALUATION: &str = "evaluation";
    pub const SUGGESTIONS: &str = "suggestions";
    pub const REVISED: &str = "revised";
    pub const REVISION_CHECK: &str = "revision_check";
    pub const FINAL_REVIEW: &str = "final_review";
    pub const REPORT: &str = "report";
}

/// Builds the seven-stage review pipeline for a topic:
///
/// ```text
/// create_framework → analyze_framework → assign_keywords → search_literature
///        │                                                        │
///        │                                               analyze_literature
///        └──────────────────────────────▶ draft_review ◀──────────┘
///                                              │
///                                       integrate_review
/// ```
#[derive(Debug, Clone)]
pub struct LiteratureReviewWorkflow {
    topic: Topic,
}

impl LiteratureReviewWorkflow {
    pub fn new(topic: Topic) -> Self {
        Self { topic }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn tasks(&self) -> Vec<TaskSpec> {
        let topic = self.topic.content();
        vec![
            TaskSpec::new(
                stage::CREATE_FRAMEWORK,
                RoleKind::Professor,
                PromptTemplate::create_framework(topic),
            )
            .expecting(contracts::framework())
            .with_artifact(artifact::FRAMEWORK),
            TaskSpec::new(
                stage::ANALYZE_FRAMEWORK,
                RoleKind::Postdoc,
                format!(
                    "Analyze the research framework for \"{}\" given in the context. \
                     List its strengths and weaknesses and suggest improvements.",
                    topic
                ),
            )
            .expecting(contracts::framework_analysis())
            .with_context(stage::CREATE_FRAMEWORK)
            .with_artifact(artifact::ANALYSIS),
            TaskSpec::new(
                stage::ASSIGN_KEYWORDS,
                RoleKind::Postdoc,
                format!(
                    "From the research framework and its analysis, derive concrete literature \
                     search keywords and research requirements for \"{}\". Return `keywords` \
                     and `requirements` as lists of strings.",
                    topic
                ),
            )
            .expecting(contracts::keywords())
            .with_context(stage::CREATE_FRAMEWORK)
            .with_context(stage::ANALYZE_FRAMEWORK)
            .with_artifact(artifact::KEYWORDS),
            TaskSpec::new(
                stage::SEARCH_LITERATURE,
                RoleKind::Phd,
                "Search the literature for each keyword and keep the papers relevant \
                 to the research requirements.",
            )
            .retrieval()
            .expecting(contracts::literature())
            .with_context(stage::ASSIGN_KEYWORDS)
            .with_tool_override(ToolRef::literature_search())
            .with_artifact(artifact::LITERATURE),
            TaskSpec::new(
                stage::ANALYZE_LITERATURE,
                RoleKind::Phd,
                "Analyze the retrieved papers in the context. Extract key findings, \
                 methodologies and future directions.",
            )
            .expecting(contracts::findings())
            .with_context(stage::SEARCH_LITERATURE)
            .with_artifact(artifact::FINDINGS),
            TaskSpec::new(
                stage::DRAFT_REVIEW,
                RoleKind::Phd,
                format!(
                    "Write a literature review on \"{}\" following the research framework and \
                     using only the analyzed papers. Cite inline as <sup>n</sup> and end with a \
                     reference list of title, venue and year.",
                    topic
                ),
            )
            .expecting(contracts::draft())
            .with_context(stage::CREATE_FRAMEWORK)
            .with_context(stage::ANALYZE_LITERATURE)
            .with_artifact(artifact::DRAFT),
            TaskSpec::new(
                stage::INTEGRATE_REVIEW,
                RoleKind::Postdoc,
                "Integrate the drafted review so it reads as one coherent paper that meets \
                 academic conventions.",
            )
            .expecting(contracts::integrated())
            .with_context(stage::DRAFT_REVIEW)
            .with_artifact(artifact::INTEGRATED),
        ]
    }

    pub fn build(&self) -> Result<Pipeline, DomainError> {
        Pipeline::new(self.tasks())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::task::{TaskId, TaskKind};

    fn workflow() -> LiteratureReviewWorkflow {
        LiteratureReviewWorkflow::new(Topic::parse("retrieval-augmented generation").unwrap())
    }

    #[test]
    fn test_pipeline_builds_in_declared_order() {
        let pipeline = workflow().build().unwrap();
        let order: Vec<_> = pipeline
            .topological_order()
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect();
        assert_eq!(
            order,
            vec![
                stage::CREATE_FRAMEWORK,
                stage::ANALYZE_FRAMEWORK,
                stage::ASSIGN_KEYWORDS,
                stage::SEARCH_LITERATURE,
                stage::ANALYZE_LITERATURE,
                stage::DRAFT_REVIEW,
                stage::INTEGRATE_REVIEW,
            ]
        );
    }

    #[test]
    fn test_only_integration_is_terminal() {
        let pipeline = workflow().build().unwrap();
        let terminals: Vec<_> = pipeline.terminal_tasks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(terminals, vec![TaskId::from(stage::INTEGRATE_REVIEW)]);
    }

    #[test]
    fn test_search_is_retrieval_with_tool() {
        let pipeline = workflow().build().unwrap();
        let search = pipeline.get(&stage::SEARCH_LITERATURE.into()).unwrap();
        assert_eq!(search.kind, TaskKind::Retrieval);
        assert_eq!(search.role, RoleKind::Phd);
        assert!(
            search
                .tool_overrides
                .as_ref()
                .unwrap()
                .contains(&ToolRef::literature_search())
        );
    }

    #[test]
    fn test_topic_flows_into_framework_prompt() {
        let tasks = workflow().tasks();
        assert!(tasks[0].description.contains("retrieval-augmented generation"));
        assert!(tasks.iter().all(|t| t.artifact.is_some()));
    }
}
