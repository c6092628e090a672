//! In-memory dependency graph for one project plan.
//!
//! Edges are kept twice: as a flat list for lookups by id, and in a
//! `petgraph::DiGraph` (with a `TaskId -> NodeIndex` map) for reachability.
//! Admission of a new edge is gated by [`DependencyGraph::validate_new_edge`];
//! the caller persists the edge remotely and only then mirrors it with
//! [`DependencyGraph::add_edge`].

use std::collections::HashMap;

use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::EdgeError;
use crate::model::{DependencyEdge, DependencyKind, EdgeId, ProjectId, Task, TaskId};

/// Incoming and outgoing edges of a task.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskEdges {
    /// Edges where the task is the successor.
    pub predecessors: Vec<DependencyEdge>,
    /// Edges where the task is the predecessor.
    pub successors: Vec<DependencyEdge>,
}

impl TaskEdges {
    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty() && self.successors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predecessors.len() + self.successors.len()
    }
}

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    task_projects: HashMap<TaskId, ProjectId>,
    edges: Vec<DependencyEdge>,
    /// Predecessor -> successor, weighted by kind.
    dag: DiGraph<TaskId, DependencyKind>,
    node_map: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a loaded task set and its edges. Edges are taken
    /// as-is; they were admitted by the store.
    pub fn from_parts(tasks: &[Task], edges: Vec<DependencyEdge>) -> Self {
        let mut graph = Self::new();
        for task in tasks {
            graph.insert_task(task.id, task.project_id);
        }
        for edge in &edges {
            graph.link(edge);
        }
        graph.edges = edges;
        graph
    }

    pub fn insert_task(&mut self, task_id: TaskId, project_id: ProjectId) {
        self.task_projects.insert(task_id, project_id);
        self.node(task_id);
    }

    fn node(&mut self, task_id: TaskId) -> NodeIndex {
        if let Some(idx) = self.node_map.get(&task_id) {
            return *idx;
        }
        let idx = self.dag.add_node(task_id);
        self.node_map.insert(task_id, idx);
        idx
    }

    fn link(&mut self, edge: &DependencyEdge) {
        let from = self.node(edge.predecessor_task_id);
        let to = self.node(edge.successor_task_id);
        self.dag.add_edge(from, to, edge.kind);
    }

    fn unlink(&mut self, edge: &DependencyEdge) {
        let (Some(from), Some(to)) = (
            self.node_map.get(&edge.predecessor_task_id),
            self.node_map.get(&edge.successor_task_id),
        ) else {
            return;
        };
        let found = self
            .dag
            .edges_connecting(*from, *to)
            .find(|e| *e.weight() == edge.kind)
            .map(|e| e.id());
        if let Some(idx) = found {
            self.dag.remove_edge(idx);
        }
    }

    pub fn contains_task(&self, task_id: TaskId) -> bool {
        self.task_projects.contains_key(&task_id)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn edge(&self, edge_id: EdgeId) -> Option<&DependencyEdge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    /// Check whether `predecessor -> successor` may be admitted.
    pub fn validate_new_edge(
        &self,
        predecessor: TaskId,
        successor: TaskId,
        kind: DependencyKind,
        _lag_days: i32,
    ) -> Result<(), EdgeError> {
        if predecessor == successor {
            return Err(EdgeError::SelfReference);
        }
        let pred_project = self
            .task_projects
            .get(&predecessor)
            .ok_or(EdgeError::UnknownTask(predecessor))?;
        let succ_project = self
            .task_projects
            .get(&successor)
            .ok_or(EdgeError::UnknownTask(successor))?;

        let duplicate = self.edges.iter().any(|e| {
            e.predecessor_task_id == predecessor
                && e.successor_task_id == successor
                && e.kind == kind
        });
        if duplicate {
            return Err(EdgeError::DuplicateEdge);
        }

        if pred_project != succ_project {
            return Err(EdgeError::CrossProject);
        }

        if self.reaches(successor, predecessor) {
            return Err(EdgeError::CycleDetected);
        }

        Ok(())
    }

    /// Mirror an edge that the store has accepted.
    pub fn add_edge(&mut self, edge: DependencyEdge) {
        if self.edges.iter().any(|e| e.id == edge.id) {
            return;
        }
        tracing::debug!(edge_id = %edge.id, kind = edge.kind.short_label(), "edge added");
        self.link(&edge);
        self.edges.push(edge);
    }

    /// Drop an edge by id, returning it if it was present.
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Option<DependencyEdge> {
        let idx = self.edges.iter().position(|e| e.id == edge_id)?;
        tracing::debug!(%edge_id, "edge removed");
        let edge = self.edges.remove(idx);
        self.unlink(&edge);
        Some(edge)
    }

    pub fn edges_for(&self, task_id: TaskId) -> TaskEdges {
        let mut out = TaskEdges::default();
        for edge in &self.edges {
            if edge.successor_task_id == task_id {
                out.predecessors.push(edge.clone());
            }
            if edge.predecessor_task_id == task_id {
                out.successors.push(edge.clone());
            }
        }
        out
    }

    /// Edges entering `task_id`.
    pub fn incoming(&self, task_id: TaskId) -> impl Iterator<Item = &DependencyEdge> {
        self.edges
            .iter()
            .filter(move |e| e.successor_task_id == task_id)
    }

    /// Whether a path runs along edge direction from `from` to `to`.
    fn reaches(&self, from: TaskId, to: TaskId) -> bool {
        match (self.node_map.get(&from), self.node_map.get(&to)) {
            (Some(from), Some(to)) => algo::has_path_connecting(&self.dag, *from, *to, None),
            _ => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        !algo::is_cyclic_directed(&self.dag)
    }
}
