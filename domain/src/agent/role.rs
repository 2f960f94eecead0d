//! Agent roles: capability profiles bound to pipeline tasks.
//!
//! Every role shares one type, [`AgentRole`]; what differs between the
//! professor, postdoc, PhD student and reviewer is data (goal, backstory,
//! tools, budget), selected through [`RoleKind`].

use super::tool::{ToolRef, ToolSet};
use serde::{Deserialize, Serialize};

/// The four roles taking part in a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Professor,
    Postdoc,
    Phd,
    Reviewer,
}

impl RoleKind {
    pub const ALL: [RoleKind; 4] = [
        RoleKind::Professor,
        RoleKind::Postdoc,
        RoleKind::Phd,
        RoleKind::Reviewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Professor => "professor",
            RoleKind::Postdoc => "postdoc",
            RoleKind::Phd => "phd",
            RoleKind::Reviewer => "reviewer",
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RoleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "professor" => Ok(RoleKind::Professor),
            "postdoc" => Ok(RoleKind::Postdoc),
            "phd" => Ok(RoleKind::Phd),
            "reviewer" => Ok(RoleKind::Reviewer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A role-specific capability profile (Entity, immutable after construction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRole {
    pub kind: RoleKind,
    pub display_name: String,
    pub goal: String,
    pub backstory: String,
    /// Advisory only: the crew never spawns sub-tasks on its own.
    pub allow_delegation: bool,
    pub memory_enabled: bool,
    /// Maximum number of executions this role may perform in one run.
    pub max_iterations: usize,
    pub tools: ToolSet,
}

impl AgentRole {
    /// Build the preset profile for a role.
    pub fn preset(kind: RoleKind) -> Self {
        match kind {
            RoleKind::Professor => Self::professor(),
            RoleKind::Postdoc => Self::postdoc(),
            RoleKind::Phd => Self::phd(),
            RoleKind::Reviewer => Self::reviewer(),
        }
    }

    pub fn professor() -> Self {
        Self {
            kind: RoleKind::Professor,
            display_name: "Research Professor".to_string(),
            goal: "Guide and assess the research work".to_string(),
            backstory: "An experienced research professor who helps graduate students \
                        produce high-quality work. Skilled at designing research frameworks, \
                        reviewing papers and giving constructive feedback."
                .to_string(),
            allow_delegation: false,
            memory_enabled: true,
            max_iterations: 5,
            tools: ToolSet::new(),
        }
    }

    pub fn postdoc() -> Self {
        Self {
            kind: RoleKind::Postdoc,
            display_name: "Computer Science Postdoctoral Fellow".to_string(),
            goal: "Turn the research plan into concrete tasks and integrate the results"
                .to_string(),
            backstory: "A postdoctoral researcher in computer science who turns high-level \
                        research plans into concrete work items, refines research frameworks, \
                        assigns tasks and makes sure the final paper meets academic standards."
                .to_string(),
            allow_delegation: false,
            memory_enabled: true,
            max_iterations: 3,
            tools: ToolSet::new(),
        }
    }

    pub fn phd() -> Self {
        Self {
            kind: RoleKind::Phd,
            display_name: "Computer Science PhD Student".to_string(),
            goal: "Retrieve literature and write the review".to_string(),
            backstory: "A computer science PhD student who reads and understands the \
                        literature of the field, extracts what is relevant to the topic, and \
                        is responsible for retrieval, analysis and writing."
                .to_string(),
            allow_delegation: true,
            memory_enabled: true,
            max_iterations: 3,
            tools: [ToolRef::literature_search()].into_iter().collect(),
        }
    }

    pub fn reviewer() -> Self {
        Self {
            kind: RoleKind::Reviewer,
            display_name: "Rigorous Reviewer".to_string(),
            goal: "Assess the quality of the review and suggest improvements".to_string(),
            backstory: "A rigorous reviewer who cares about academic value, novelty and \
                        presentation, and gives professional, constructive revision advice."
                .to_string(),
            allow_delegation: false,
            memory_enabled: true,
            max_iterations: 3,
            tools: ToolSet::new(),
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tool(mut self, tool: ToolRef) -> Self {
        self.tools.insert(tool);
        self
    }

    /// Resolve the tools a task runs with: overrides replace the defaults.
    pub fn effective_tools(&self, overrides: Option<&ToolSet>) -> ToolSet {
        match overrides {
            Some(tools) => tools.clone(),
            None => self.tools.clone(),
        }
    }

    /// System prompt describing this role to the model.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a {}.\nGoal: {}\nBackground: {}",
            self.display_name, self.goal, self.backstory
        )
    }
}

/// The roster of roles used in one run, one instance per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRoster {
    roles: Vec<AgentRole>,
}

impl RoleRoster {
    pub fn new(roles: Vec<AgentRole>) -> Self {
        let mut roster = Self { roles: Vec::new() };
        for role in roles {
            roster.insert(role);
        }
        roster
    }

    /// Replace the profile of a role, keeping one instance per kind.
    pub fn insert(&mut self, role: AgentRole) {
        self.roles.retain(|r| r.kind != role.kind);
        self.roles.push(role);
    }

    pub fn get(&self, kind: RoleKind) -> Option<&AgentRole> {
        self.roles.iter().find(|r| r.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentRole> {
        self.roles.iter()
    }
}

impl Default for RoleRoster {
    fn default() -> Self {
        Self::new(RoleKind::ALL.iter().map(|k| AgentRole::preset(*k)).collect())
    }
}
