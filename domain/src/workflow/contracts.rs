//! Output contracts of every review stage.
//!
//! Shared by the crew tasks and the direct role operations so a stage
//! decodes the same way whichever path produced it.

use crate::pipeline::output::OutputContract;

pub fn framework() -> OutputContract {
    OutputContract::json(&["background", "objectives"])
}

pub fn paper_review() -> OutputContract {
    OutputContract::json(&["overall_assessment", "detailed_review", "recommendations"])
}

pub fn guidance() -> OutputContract {
    OutputContract::json(&["analysis", "suggestions"])
}

pub fn framework_analysis() -> OutputContract {
    OutputContract::json(&["analysis"])
}

pub fn keywords() -> OutputContract {
    OutputContract::json(&["keywords", "requirements"])
}

pub fn literature() -> OutputContract {
    OutputContract::json(&["papers", "errors"])
}

pub fn findings() -> OutputContract {
    OutputContract::json(&["key_findings"])
}

pub fn draft() -> OutputContract {
    OutputContract::Text
}

pub fn integrated() -> OutputContract {
    OutputContract::json(&["integrated_content"])
}

pub fn evaluation() -> OutputContract {
    OutputContract::json(&["scores", "overall_score"])
}

pub fn suggestions() -> OutputContract {
    OutputContract::json(&["major_revisions", "minor_revisions"])
}

pub fn revision_check() -> OutputContract {
    OutputContract::json(&["addressed_suggestions", "pending_suggestions"])
}

pub fn final_review() -> OutputContract {
    OutputContract::json(&["final_scores", "publication_readiness"])
}

pub fn relevance() -> OutputContract {
    OutputContract::json(&["relevant"])
}
