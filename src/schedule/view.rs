//! Memoised chart projection.
//!
//! Rows, date range, bar positions and connectors are pure functions of the
//! task set, the edge list, today's date and the chart width. The projection
//! keeps the last result and recomputes only when one of those changes.
//! After the task set changes, connectors wait for a short settle delay so
//! bars are laid out before anything is drawn between them.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use super::connector::{compute_connectors, ConnectorPath};
use super::layout::{
    compute_date_range, position_registry, row_order, DateRange, Row, RowMetrics, TaskPosition,
};
use crate::model::{DependencyEdge, Task, TaskId};

/// What a call to [`GanttProjection::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Inputs unchanged.
    Cached,
    /// Layout and connectors recomputed.
    Recomputed,
    /// Layout recomputed, connectors held back until the delay elapses.
    Settling(Duration),
}

pub struct GanttProjection {
    settle_delay: Duration,
    tasks_key: Option<u64>,
    edges_key: Option<u64>,
    frame_key: Option<(NaiveDate, u32)>,
    tasks_changed_at: Option<Instant>,
    pub rows: Vec<Row>,
    pub range: Option<DateRange>,
    pub positions: HashMap<TaskId, TaskPosition>,
    pub connectors: Vec<ConnectorPath>,
}

fn fingerprint<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl GanttProjection {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            tasks_key: None,
            edges_key: None,
            frame_key: None,
            tasks_changed_at: None,
            rows: Vec::new(),
            range: None,
            positions: HashMap::new(),
            connectors: Vec::new(),
        }
    }

    pub fn set_settle_delay(&mut self, delay: Duration) {
        self.settle_delay = delay;
    }

    /// Drop everything; the next refresh recomputes from scratch.
    pub fn invalidate(&mut self) {
        self.tasks_key = None;
        self.edges_key = None;
        self.frame_key = None;
    }

    /// Bring the projection up to date with the given inputs.
    #[allow(clippy::too_many_arguments)]
    pub fn refresh(
        &mut self,
        tasks: &[Task],
        edges: &[DependencyEdge],
        today: NaiveDate,
        chart_width: f32,
        metrics: &RowMetrics,
        now: Instant,
    ) -> Refresh {
        let tasks_key = fingerprint(tasks);
        let edges_key = fingerprint(edges);
        let frame_key = (today, chart_width.to_bits());

        let tasks_changed = self.tasks_key != Some(tasks_key);
        let layout_stale = tasks_changed || self.frame_key != Some(frame_key);
        let edges_changed = self.edges_key != Some(edges_key);

        if tasks_changed {
            self.tasks_changed_at = Some(now);
            self.connectors.clear();
        }

        if layout_stale {
            let range = compute_date_range(tasks, today);
            self.rows = row_order(tasks);
            self.positions = position_registry(&self.rows, tasks, &range, chart_width, metrics);
            self.range = Some(range);
            self.tasks_key = Some(tasks_key);
            self.frame_key = Some(frame_key);
        }

        if let Some(changed_at) = self.tasks_changed_at {
            let waited = now.saturating_duration_since(changed_at);
            if waited < self.settle_delay {
                return Refresh::Settling(self.settle_delay - waited);
            }
            self.tasks_changed_at = None;
            self.connectors = compute_connectors(&self.positions, edges);
            self.edges_key = Some(edges_key);
            tracing::trace!(connectors = self.connectors.len(), "connectors settled");
            return Refresh::Recomputed;
        }

        if layout_stale || edges_changed {
            self.connectors = compute_connectors(&self.positions, edges);
            self.edges_key = Some(edges_key);
            return Refresh::Recomputed;
        }

        Refresh::Cached
    }

    /// Whether `compute_connectors` output is current.
    pub fn connectors_ready(&self) -> bool {
        self.tasks_changed_at.is_none()
    }

    pub fn chart_height(&self, metrics: &RowMetrics) -> f32 {
        metrics.row_top(self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DependencyKind;
    use uuid::Uuid;

    const METRICS: RowMetrics = RowMetrics {
        header_height: 40.0,
        row_height: 30.0,
        row_gap: 2.0,
        bar_inset: 3.0,
    };

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn fixture() -> (Vec<Task>, Vec<DependencyEdge>) {
        let project = Uuid::new_v4();
        let a = Task::new(project, "a").planned(date(1, 2), date(1, 5));
        let b = Task::new(project, "b")
            .planned(date(1, 10), date(1, 12))
            .with_sort_order(1);
        let edge = DependencyEdge {
            id: Uuid::new_v4(),
            predecessor_task_id: a.id,
            successor_task_id: b.id,
            kind: DependencyKind::FinishToStart,
            lag_days: 0,
        };
        (vec![a, b], vec![edge])
    }

    #[test]
    fn task_change_waits_for_settle_delay() {
        let (tasks, edges) = fixture();
        let mut view = GanttProjection::new(Duration::from_millis(100));
        let t0 = Instant::now();

        let r = view.refresh(&tasks, &edges, date(1, 1), 800.0, &METRICS, t0);
        assert_eq!(r, Refresh::Settling(Duration::from_millis(100)));
        assert_eq!(view.positions.len(), 2);
        assert!(view.connectors.is_empty());
        assert!(!view.connectors_ready());

        let r = view.refresh(&tasks, &edges, date(1, 1), 800.0, &METRICS, t0 + Duration::from_millis(100));
        assert_eq!(r, Refresh::Recomputed);
        assert_eq!(view.connectors.len(), 1);

        let r = view.refresh(&tasks, &edges, date(1, 1), 800.0, &METRICS, t0 + Duration::from_millis(200));
        assert_eq!(r, Refresh::Cached);
    }

    #[test]
    fn edge_and_width_changes_recompute_immediately() {
        let (tasks, mut edges) = fixture();
        let mut view = GanttProjection::new(Duration::ZERO);
        let now = Instant::now();
        assert_eq!(view.refresh(&tasks, &edges, date(1, 1), 800.0, &METRICS, now), Refresh::Recomputed);

        edges[0].lag_days = 2;
        assert_eq!(view.refresh(&tasks, &edges, date(1, 1), 800.0, &METRICS, now), Refresh::Recomputed);
        assert_eq!(view.connectors[0].label.as_deref(), Some("+2g"));

        let before = view.positions[&tasks[0].id];
        assert_eq!(view.refresh(&tasks, &edges, date(1, 1), 1600.0, &METRICS, now), Refresh::Recomputed);
        let after = view.positions[&tasks[0].id];
        assert!((after.left - before.left * 2.0).abs() < 1e-3);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let (tasks, edges) = fixture();
        let mut view = GanttProjection::new(Duration::ZERO);
        let now = Instant::now();
        view.refresh(&tasks, &edges, date(1, 1), 800.0, &METRICS, now);
        view.invalidate();
        assert_eq!(view.refresh(&tasks, &edges, date(1, 1), 800.0, &METRICS, now), Refresh::Recomputed);
        assert_eq!(view.chart_height(&METRICS), 40.0 + 2.0 * 32.0);
    }
}
