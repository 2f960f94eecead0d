//! Prompt templates for the review workflow

use crate::literature::Paper;
use crate::pipeline::output::{OutputContract, ParseError, TaskOutput};
use crate::pipeline::task::TaskId;
use serde_json::Value;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl PromptTemplate {
    /// Prompt for a crew task: description, rendered context, contract.
    pub fn task_prompt(
        description: &str,
        context: &[(&TaskId, &TaskOutput)],
        contract: &OutputContract,
    ) -> String {
        let mut prompt = description.trim().to_string();

        if !context.is_empty() {
            prompt.push_str("\n\n## Context from previous tasks\n");
            for (id, output) in context {
                prompt.push_str(&format!("\n### {}\n{}\n", id, output.render()));
            }
        }

        prompt.push('\n');
        prompt.push('\n');
        prompt.push_str(&contract.describe());
        prompt
    }

    /// Corrective retry: the original prompt plus why the answer was rejected.
    pub fn parse_feedback(prompt: &str, error: &ParseError, contract: &OutputContract) -> String {
        let mut feedback = format!(
            "{}\n\nYour previous answer could not be used: {}.\n{}",
            prompt,
            error,
            contract.describe()
        );
        if matches!(contract, OutputContract::Json { .. }) {
            feedback.push_str(" Do not add any text outside the JSON document.");
        }
        feedback
    }

    pub fn create_framework(topic: &str) -> String {
        format!(
            r#"Create a detailed research framework for the following topic:

Topic: {}

Provide:
{{
    "background": "research background",
    "objectives": ["objective 1", "objective 2"],
    "methodology": {{
        "approach": "research approach",
        "steps": ["step 1", "step 2"]
    }},
    "expected_outcomes": ["outcome 1", "outcome 2"]
}}"#,
            topic
        )
    }

    pub fn review_paper(paper: &str) -> String {
        format!(
            r#"Review the following paper as a senior professor:

{}

Provide:
{{
    "overall_assessment": {{
        "strengths": ["strength 1", "strength 2"],
        "weaknesses": ["weakness 1", "weakness 2"]
    }},
    "detailed_review": {{
        "methodology": {{"score": 1-10, "comments": "comments"}},
        "results": {{"score": 1-10, "comments": "comments"}},
        "discussion": {{"score": 1-10, "comments": "comments"}}
    }},
    "recommendations": ["recommendation 1", "recommendation 2"]
}}"#,
            paper
        )
    }

    pub fn provide_guidance(question: &str) -> String {
        format!(
            r#"Give research guidance on the following question:

Question: {}

Provide:
{{
    "analysis": {{
        "key_points": ["point 1", "point 2"],
        "challenges": ["challenge 1", "challenge 2"]
    }},
    "suggestions": {{
        "immediate_actions": ["action 1", "action 2"],
        "long_term_plan": ["plan 1", "plan 2"]
    }},
    "references": ["reference 1", "reference 2"]
}}"#,
            question
        )
    }

    pub fn analyze_framework(framework: &Value) -> String {
        format!(
            r#"Analyze the following research framework and suggest improvements:

Framework:
{}

Provide:
{{
    "analysis": {{
        "strengths": ["strength 1", "strength 2"],
        "weaknesses": ["weakness 1", "weakness 2"],
        "suggestions": ["suggestion 1", "suggestion 2"]
    }}
}}"#,
            pretty(framework)
        )
    }

    pub fn assign_tasks(task: &str) -> String {
        format!(
            r#"Derive concrete search keywords and requirements for the following research task:

Task: {}

Provide:
{{
    "keywords": ["keyword 1", "keyword 2"],
    "requirements": ["requirement 1", "requirement 2"],
    "expected_outcomes": ["outcome 1", "outcome 2"]
}}"#,
            task
        )
    }

    pub fn integrate_paper(content: &str) -> String {
        format!(
            r#"Integrate the following paper sections so the text is coherent and meets academic conventions:

Sections:
{}

Provide:
{{
    "integrated_content": "the integrated text",
    "modifications": [
        {{"type": "kind of change", "description": "what was changed"}}
    ]
}}"#,
            content
        )
    }

    pub fn analyze_literature(papers: &Value) -> String {
        format!(
            r#"Analyze the following papers and extract the key information:

Papers:
{}

Provide:
{{
    "key_findings": ["finding 1", "finding 2"],
    "methodologies": ["method 1", "method 2"],
    "future_directions": ["direction 1", "direction 2"]
}}"#,
            pretty(papers)
        )
    }

    pub fn write_draft(analysis: &Value, outline: &Value) -> String {
        format!(
            r#"Write a first draft of the review from the following literature analysis and outline.

Literature analysis:
{}

Outline:
{}

Requirements:
1. Follow the structure of the outline
2. Cite the analyzed literature to support each claim
3. Use an academic writing style
4. Keep the text coherent and logically ordered"#,
            pretty(analysis),
            pretty(outline)
        )
    }

    pub fn revise_draft(draft: &str, suggestions: &Value) -> String {
        format!(
            r#"Revise the draft according to the reviewer's suggestions.

Draft:
{}

Suggestions:
{}

Requirements:
1. Address every suggestion
2. Keep the overall structure intact
3. Keep the revised text coherent
4. Mark the revised passages"#,
            draft,
            pretty(suggestions)
        )
    }

    pub fn evaluate_paper(paper: &str) -> String {
        format!(
            r#"Evaluate the quality of the following paper:

{}

Assess methodology, logic, novelty, experiments and writing. Provide:
{{
    "scores": {{
        "methodology": 1-10,
        "logic": 1-10,
        "innovation": 1-10,
        "experiment": 1-10,
        "writing": 1-10
    }},
    "comments": {{
        "strengths": ["strength 1", "strength 2"],
        "weaknesses": ["weakness 1", "weakness 2"]
    }},
    "overall_score": 1-10,
    "recommendation": "accept | accept with revisions | reject"
}}"#,
            paper
        )
    }

    pub fn provide_suggestions(evaluation: &Value) -> String {
        format!(
            r#"Turn the following evaluation into concrete revision suggestions:

Evaluation:
{}

Provide:
{{
    "major_revisions": [
        {{
            "aspect": "area",
            "current_issue": "the problem",
            "suggestion": "what to change",
            "expected_outcome": "expected effect"
        }}
    ],
    "minor_revisions": [
        {{"aspect": "area", "suggestion": "what to change"}}
    ],
    "priority_order": ["suggestion text, most important first"]
}}"#,
            pretty(evaluation)
        )
    }

    pub fn check_revision(original: &str, revised: &str, suggestions: &Value) -> String {
        format!(
            r#"Check how the paper was revised.

Original:
{}

Revised:
{}

Suggestions:
{}

Provide:
{{
    "addressed_suggestions": [
        {{"suggestion": "suggestion text", "implementation": "how it was done", "effectiveness": "assessment"}}
    ],
    "pending_suggestions": [
        {{"suggestion": "suggestion text", "aspect": "aspect it belongs to", "current_status": "status", "further_advice": "advice"}}
    ],
    "new_issues": [
        {{"issue": "problem introduced by the revision", "critical": false}}
    ],
    "overall_assessment": "summary",
    "next_steps": ["step 1", "step 2"]
}}"#,
            original,
            revised,
            pretty(suggestions)
        )
    }

    pub fn final_review(paper: &str) -> String {
        format!(
            r#"Give the final review of the following paper:

{}

Provide:
{{
    "final_scores": {{
        "methodology": 1-10,
        "logic": 1-10,
        "innovation": 1-10,
        "experiment": 1-10,
        "writing": 1-10,
        "overall": 1-10
    }},
    "final_assessment": {{
        "major_contributions": ["contribution 1"],
        "limitations": ["limitation 1"],
        "future_work": ["suggestion 1"]
    }},
    "publication_readiness": {{
        "status": "publishable | needs revision | not recommended",
        "confidence": 1-5,
        "additional_comments": "comments"
    }}
}}"#,
            paper
        )
    }

    /// Ask a role whether a retrieved paper serves the research requirements.
    pub fn judge_relevance(paper: &Paper, requirements: &[String]) -> String {
        let requirements = if requirements.is_empty() {
            "(none given)".to_string()
        } else {
            requirements
                .iter()
                .map(|r| format!("- {}", r))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            r#"Decide whether the following paper is relevant to the research requirements.

Requirements:
{}

Title: {}
Authors: {}
Published: {}
Abstract:
{}

Provide:
{{"relevant": true or false, "reason": "one sentence"}}"#,
            requirements,
            paper.title,
            paper.authors.join(", "),
            paper.published_date.as_deref().unwrap_or("unknown"),
            paper.abstract_text
        )
    }
}
