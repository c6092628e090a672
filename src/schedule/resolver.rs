//! Dependency date constraints.
//!
//! Read-only: a violated constraint is reported so the chart can flag it,
//! dates are never shifted here.

use chrono::{Duration, NaiveDate};

use super::graph::DependencyGraph;
use crate::model::{Anchor, DependencyEdge, EdgeId, Task, TaskId};

/// Earliest date a successor anchor may take under one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub anchor: Anchor,
    pub earliest: NaiveDate,
}

/// An incoming edge a task currently violates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub edge_id: EdgeId,
    pub predecessor_task_id: TaskId,
    pub anchor: Anchor,
    pub earliest: NaiveDate,
    pub actual: NaiveDate,
}

impl Conflict {
    /// Days the successor anchor sits before its earliest date.
    pub fn slip_days(&self) -> i64 {
        (self.earliest - self.actual).num_days()
    }
}

/// Constraint imposed by `edge` given the predecessor's display dates.
pub fn constraint(edge: &DependencyEdge, pred: &Task) -> Option<Constraint> {
    let base = pred.date_at(edge.kind.predecessor_anchor())?;
    Some(Constraint {
        anchor: edge.kind.successor_anchor(),
        earliest: base + Duration::days(edge.lag_days as i64),
    })
}

/// Whether `succ` honours `edge`. Missing dates on either side count as satisfied.
pub fn is_satisfied(edge: &DependencyEdge, pred: &Task, succ: &Task) -> bool {
    check(edge, pred, succ).is_none()
}

fn check(edge: &DependencyEdge, pred: &Task, succ: &Task) -> Option<Conflict> {
    let c = constraint(edge, pred)?;
    let actual = succ.date_at(c.anchor)?;
    if actual >= c.earliest {
        return None;
    }
    Some(Conflict {
        edge_id: edge.id,
        predecessor_task_id: pred.id,
        anchor: c.anchor,
        earliest: c.earliest,
        actual,
    })
}

/// All incoming edges of `task` that its current dates violate.
pub fn conflicts(task: &Task, graph: &DependencyGraph, tasks: &[Task]) -> Vec<Conflict> {
    graph
        .incoming(task.id)
        .filter_map(|edge| {
            let pred = tasks.iter().find(|t| t.id == edge.predecessor_task_id)?;
            check(edge, pred, task)
        })
        .collect()
}
