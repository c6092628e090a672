//! Date axis, bar geometry and row order for the Gantt chart.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::model::{Task, TaskId};

/// Padding added on both sides of the task span.
pub const RANGE_PADDING_DAYS: i64 = 7;
/// The axis always reaches at least this far past today.
pub const RANGE_LOOKAHEAD_DAYS: i64 = 30;
const WEEK_START: Weekday = Weekday::Mon;
/// Narrowest bar drawn, in pixels. Connectors anchor to the widened edge.
pub const MIN_BAR_WIDTH: f32 = 6.0;

/// Shared date axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Every calendar day in `[start, end]`.
    pub days: Vec<NaiveDate>,
}

/// A run of consecutive days sharing one header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekSpan {
    pub first_day: NaiveDate,
    /// Index of `first_day` in [`DateRange::days`].
    pub offset: usize,
    pub len: usize,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let end = end.max(start);
        let days = start.iter_days().take_while(|d| *d <= end).collect();
        Self { start, end, days }
    }

    /// Span in days between the two ends (`end - start`).
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Header groups: the first day of the range, then every week start.
    pub fn weeks(&self) -> Vec<WeekSpan> {
        let mut weeks: Vec<WeekSpan> = Vec::new();
        for (i, day) in self.days.iter().enumerate() {
            match weeks.last_mut() {
                Some(week) if day.weekday() != WEEK_START => week.len += 1,
                _ => weeks.push(WeekSpan {
                    first_day: *day,
                    offset: i,
                    len: 1,
                }),
            }
        }
        weeks
    }

    /// Horizontal position of `date` as a percentage of the range.
    pub fn percent_of(&self, date: NaiveDate) -> f32 {
        let total = self.total_days().max(1) as f32;
        (date - self.start).num_days() as f32 / total * 100.0
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    let back = (date.weekday().num_days_from_monday() + 7
        - WEEK_START.num_days_from_monday())
        % 7;
    date - Duration::days(back as i64)
}

/// Axis covering today and every task with dates, padded on both sides.
pub fn compute_date_range(tasks: &[Task], today: NaiveDate) -> DateRange {
    let earliest = tasks
        .iter()
        .filter_map(Task::display_start)
        .chain(std::iter::once(today))
        .min()
        .unwrap_or(today);
    let latest = tasks
        .iter()
        .filter_map(Task::display_end)
        .chain(std::iter::once(today + Duration::days(RANGE_LOOKAHEAD_DAYS)))
        .max()
        .unwrap_or(today);

    let start = week_start(earliest) - Duration::days(RANGE_PADDING_DAYS);
    let end = latest + Duration::days(RANGE_PADDING_DAYS);
    DateRange::new(start, end)
}

/// Horizontal bar placement in percent of the range width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub left_percent: f32,
    pub width_percent: f32,
}

/// `None` when the task has no resolvable start and end.
pub fn compute_bar(task: &Task, range: &DateRange) -> Option<Bar> {
    let (start, end) = task.display_span()?;
    let total_days = range.total_days().max(1) as f32;
    let start_offset = (start - range.start).num_days() as f32;
    let duration = ((end - start).num_days() + 1) as f32;
    Some(Bar {
        left_percent: start_offset / total_days * 100.0,
        width_percent: duration / total_days * 100.0,
    })
}

/// One chart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub task_id: TaskId,
    /// Nesting level, 0 for top-level tasks.
    pub depth: usize,
}

fn sibling_cmp(a: &Task, b: &Task) -> std::cmp::Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Tree order: roots by `sort_order`, each followed by its children.
/// A task whose parent is not in the set is treated as a root.
pub fn row_order(tasks: &[Task]) -> Vec<Row> {
    let known: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    let mut children: HashMap<Option<TaskId>, Vec<&Task>> = HashMap::new();
    for task in tasks {
        let parent = task.parent_task_id.filter(|p| known.contains_key(p) && *p != task.id);
        children.entry(parent).or_default().push(task);
    }
    for group in children.values_mut() {
        group.sort_by(|a, b| sibling_cmp(a, b));
    }

    let mut rows = Vec::with_capacity(tasks.len());
    let mut visited = std::collections::HashSet::new();
    let mut stack: Vec<(&Task, usize)> = children
        .get(&None)
        .map(|roots| roots.iter().rev().map(|t| (*t, 0)).collect())
        .unwrap_or_default();
    while let Some((task, depth)) = stack.pop() {
        if !visited.insert(task.id) {
            continue;
        }
        rows.push(Row { task_id: task.id, depth });
        if let Some(kids) = children.get(&Some(task.id)) {
            stack.extend(kids.iter().rev().map(|t| (*t, depth + 1)));
        }
    }
    if rows.len() < tasks.len() {
        // Parent links that loop back on themselves never reach a root.
        tracing::warn!(
            missing = tasks.len() - rows.len(),
            "tasks with cyclic parent links omitted from the chart"
        );
    }
    rows
}

/// New `sort_order` values after dropping `dragged` onto `target`.
///
/// Returns `None` (no-op) for a drop onto itself, onto an unknown task, or
/// onto a task with a different parent. Otherwise every sibling of the group
/// gets its position `0..n-1` in the new order.
pub fn plan_reorder(tasks: &[Task], dragged: TaskId, target: TaskId) -> Option<Vec<(TaskId, i32)>> {
    if dragged == target {
        return None;
    }
    let dragged_task = tasks.iter().find(|t| t.id == dragged)?;
    let target_task = tasks.iter().find(|t| t.id == target)?;
    if dragged_task.parent_task_id != target_task.parent_task_id {
        return None;
    }

    let mut siblings: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.parent_task_id == dragged_task.parent_task_id)
        .collect();
    siblings.sort_by(|a, b| sibling_cmp(a, b));

    let from = siblings.iter().position(|t| t.id == dragged)?;
    let to = siblings.iter().position(|t| t.id == target)?;
    let moved = siblings.remove(from);
    siblings.insert(to, moved);

    Some(
        siblings
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id, i as i32))
            .collect(),
    )
}

/// Vertical metrics of chart rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub header_height: f32,
    pub row_height: f32,
    pub row_gap: f32,
    /// Vertical inset so bars don't touch row edges.
    pub bar_inset: f32,
}

impl RowMetrics {
    pub fn row_top(&self, index: usize) -> f32 {
        self.header_height + index as f32 * (self.row_height + self.row_gap)
    }
}

/// Bar rectangle in chart-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskPosition {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub height: f32,
}

impl TaskPosition {
    pub fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// Positions of every drawable task, keyed by id.
pub fn position_registry(
    rows: &[Row],
    tasks: &[Task],
    range: &DateRange,
    chart_width: f32,
    metrics: &RowMetrics,
) -> HashMap<TaskId, TaskPosition> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let bar = compute_bar(by_id.get(&row.task_id)?, range)?;
            let left = bar.left_percent / 100.0 * chart_width;
            let width = (bar.width_percent / 100.0 * chart_width).max(MIN_BAR_WIDTH);
            Some((
                row.task_id,
                TaskPosition {
                    top: metrics.row_top(index) + metrics.bar_inset,
                    left,
                    right: left + width,
                    height: metrics.row_height - metrics.bar_inset * 2.0,
                },
            ))
        })
        .collect()
}
