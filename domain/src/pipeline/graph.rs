//! Pipeline: a validated DAG of tasks.
//!
//! Construction enforces every structural invariant up front:
//!
//! 1. each description is non-blank
//! 2. ids are unique
//! 3. every context id names a declared task
//! 4. the context graph is acyclic (depth-first colouring)
//! 5. context ids only point backwards in declaration order
//!
//! Cycles are checked before forward references so that a mutual
//! reference (`a -> b -> a`) is reported as a [`DomainError::Cycle`].

use super::task::{TaskId, TaskSpec};
use crate::core::error::DomainError;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A validated, immutable set of tasks with context edges.
#[derive(Debug, Clone)]
pub struct Pipeline {
    tasks: Vec<TaskSpec>,
    index: HashMap<TaskId, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

impl Pipeline {
    pub fn new(tasks: Vec<TaskSpec>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(tasks.len());

        for (position, task) in tasks.iter().enumerate() {
            if task.description.trim().is_empty() {
                return Err(DomainError::EmptyDescription(task.id.to_string()));
            }
            if index.insert(task.id.clone(), position).is_some() {
                return Err(DomainError::DuplicateTask(task.id.to_string()));
            }
        }

        for task in &tasks {
            if let Some(missing) = task.context.iter().find(|c| !index.contains_key(*c)) {
                return Err(DomainError::UnknownContext {
                    task: task.id.to_string(),
                    missing: missing.to_string(),
                });
            }
        }

        let pipeline = Self { tasks, index };
        pipeline.detect_cycle()?;
        pipeline.check_declaration_order()?;
        Ok(pipeline)
    }

    fn detect_cycle(&self) -> Result<(), DomainError> {
        let mut colours = vec![Colour::White; self.tasks.len()];
        let mut path = Vec::new();

        for start in 0..self.tasks.len() {
            if colours[start] == Colour::White {
                self.visit(start, &mut colours, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        node: usize,
        colours: &mut [Colour],
        path: &mut Vec<usize>,
    ) -> Result<(), DomainError> {
        colours[node] = Colour::Grey;
        path.push(node);

        for dep in &self.tasks[node].context {
            let next = self.index[dep];
            match colours[next] {
                Colour::Grey => {
                    let from = path.iter().position(|n| *n == next).unwrap_or(0);
                    let mut cycle: Vec<String> = path[from..]
                        .iter()
                        .map(|n| self.tasks[*n].id.to_string())
                        .collect();
                    cycle.push(self.tasks[next].id.to_string());
                    return Err(DomainError::Cycle { path: cycle });
                }
                Colour::White => self.visit(next, colours, path)?,
                Colour::Black => {}
            }
        }

        path.pop();
        colours[node] = Colour::Black;
        Ok(())
    }

    fn check_declaration_order(&self) -> Result<(), DomainError> {
        for (position, task) in self.tasks.iter().enumerate() {
            for dep in &task.context {
                if self.index[dep] >= position {
                    return Err(DomainError::ForwardReference {
                        task: task.id.to_string(),
                        target: dep.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskSpec> {
        self.index.get(id).map(|i| &self.tasks[*i])
    }

    /// Execution order: a topological sort where ready tasks are taken
    /// in declaration order, so the same pipeline always runs the same way.
    pub fn topological_order(&self) -> Vec<&TaskSpec> {
        let mut remaining: Vec<usize> = self.tasks.iter().map(|t| t.context.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.tasks.len()];
        for (position, task) in self.tasks.iter().enumerate() {
            for dep in &task.context {
                dependents[self.index[dep]].push(position);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = remaining
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(Reverse(next)) = ready.pop() {
            order.push(&self.tasks[next]);
            for dependent in &dependents[next] {
                remaining[*dependent] -= 1;
                if remaining[*dependent] == 0 {
                    ready.push(Reverse(*dependent));
                }
            }
        }
        order
    }

    /// Tasks that list `id` directly in their context.
    pub fn dependents(&self, id: &TaskId) -> Vec<&TaskSpec> {
        self.tasks.iter().filter(|t| t.context.contains(id)).collect()
    }

    /// Every task that consumes `id`'s result directly or indirectly.
    pub fn transitive_dependents(&self, id: &TaskId) -> HashSet<TaskId> {
        let mut found = HashSet::new();
        let mut frontier = vec![id.clone()];
        while let Some(current) = frontier.pop() {
            for dependent in self.dependents(&current) {
                if found.insert(dependent.id.clone()) {
                    frontier.push(dependent.id.clone());
                }
            }
        }
        found
    }

    /// Tasks nothing depends on; their success decides the run status.
    pub fn terminal_tasks(&self) -> Vec<&TaskSpec> {
        self.tasks
            .iter()
            .filter(|t| self.dependents(&t.id).is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::role::RoleKind;

    fn task(id: &str, context: &[&str]) -> TaskSpec {
        context.iter().fold(
            TaskSpec::new(id, RoleKind::Phd, format!("do {}", id)),
            |t, c| t.with_context(*c),
        )
    }

    fn ids(order: &[&TaskSpec]) -> Vec<String> {
        order.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_linear_chain_order() {
        let pipeline =
            Pipeline::new(vec![task("a", &[]), task("b", &["a"]), task("c", &["b"])]).unwrap();
        assert_eq!(ids(&pipeline.topological_order()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_order_respects_every_edge() {
        let pipeline = Pipeline::new(vec![
            task("framework", &[]),
            task("guidance", &[]),
            task("analysis", &["framework"]),
            task("keywords", &["analysis", "guidance"]),
            task("search", &["keywords"]),
            task("draft", &["search", "framework"]),
        ])
        .unwrap();

        let order = pipeline.topological_order();
        assert_eq!(order.len(), pipeline.len());
        let position: HashMap<&TaskId, usize> =
            order.iter().enumerate().map(|(i, t)| (&t.id, i)).collect();
        for t in pipeline.tasks() {
            for dep in &t.context {
                assert!(position[dep] < position[&t.id], "{} before {}", dep, t.id);
            }
        }
    }

    #[test]
    fn test_ties_broken_by_declaration_order() {
        let pipeline = Pipeline::new(vec![
            task("x", &[]),
            task("y", &[]),
            task("z", &["x"]),
            task("w", &[]),
        ])
        .unwrap();
        assert_eq!(ids(&pipeline.topological_order()), vec!["x", "y", "z", "w"]);
    }

    #[test]
    fn test_mutual_reference_is_cycle() {
        let err = Pipeline::new(vec![task("a", &["b"]), task("b", &["a"])]).unwrap_err();
        assert_eq!(
            err,
            DomainError::Cycle {
                path: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let err = Pipeline::new(vec![task("a", &["a"])]).unwrap_err();
        assert!(matches!(err, DomainError::Cycle { .. }));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let err = Pipeline::new(vec![task("a", &["b"]), task("b", &[])]).unwrap_err();
        assert_eq!(
            err,
            DomainError::ForwardReference {
                task: "a".into(),
                target: "b".into()
            }
        );
    }

    #[test]
    fn test_unknown_context_rejected() {
        let err = Pipeline::new(vec![task("a", &["ghost"])]).unwrap_err();
        assert!(matches!(err, DomainError::UnknownContext { .. }));
    }

    #[test]
    fn test_duplicate_and_blank_rejected() {
        let err = Pipeline::new(vec![task("a", &[]), task("a", &[])]).unwrap_err();
        assert_eq!(err, DomainError::DuplicateTask("a".into()));

        let blank = TaskSpec::new("b", RoleKind::Reviewer, "  ");
        let err = Pipeline::new(vec![blank]).unwrap_err();
        assert_eq!(err, DomainError::EmptyDescription("b".into()));
    }

    #[test]
    fn test_transitive_dependents_and_terminals() {
        let pipeline = Pipeline::new(vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["b"]),
            task("d", &[]),
        ])
        .unwrap();

        let downstream = pipeline.transitive_dependents(&"a".into());
        assert_eq!(downstream.len(), 2);
        assert!(downstream.contains(&TaskId::new("b")));
        assert!(downstream.contains(&TaskId::new("c")));
        assert!(pipeline.transitive_dependents(&"d".into()).is_empty());

        assert_eq!(ids(&pipeline.terminal_tasks()), vec!["c", "d"]);
    }
}
