use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;
pub type EdgeId = Uuid;
pub type ProjectId = Uuid;

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Completed,
            TaskStatus::Cancelled,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Todo => "To do",
            Self::InProgress => "In progress",
            Self::Review => "Review",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Which end of a task a dependency reads or gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Start,
    Finish,
}

/// Represents the type of dependency between two tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyKind {
    pub fn all() -> &'static [DependencyKind] {
        &[
            DependencyKind::FinishToStart,
            DependencyKind::StartToStart,
            DependencyKind::FinishToFinish,
            DependencyKind::StartToFinish,
        ]
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FinishToStart => "Finish-to-Start: successor starts after predecessor finishes",
            Self::StartToStart => "Start-to-Start: successor starts after predecessor starts",
            Self::FinishToFinish => "Finish-to-Finish: successor finishes after predecessor finishes",
            Self::StartToFinish => "Start-to-Finish: successor finishes after predecessor starts",
        }
    }

    /// The predecessor date this kind reads.
    pub fn predecessor_anchor(&self) -> Anchor {
        match self {
            Self::FinishToStart | Self::FinishToFinish => Anchor::Finish,
            Self::StartToStart | Self::StartToFinish => Anchor::Start,
        }
    }

    /// The successor date this kind gates.
    pub fn successor_anchor(&self) -> Anchor {
        match self {
            Self::FinishToStart | Self::StartToStart => Anchor::Start,
            Self::FinishToFinish | Self::StartToFinish => Anchor::Finish,
        }
    }
}

/// A directed dependency edge between two tasks of the same project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub id: EdgeId,
    pub predecessor_task_id: TaskId,
    pub successor_task_id: TaskId,
    pub kind: DependencyKind,
    /// Positive delays the successor, negative lets it overlap (lead).
    pub lag_days: i32,
}

impl DependencyEdge {
    /// Text used for the lag badge, e.g. `+2g` or `-1g`. `None` for zero lag.
    pub fn lag_label(&self) -> Option<String> {
        lag_label(self.lag_days)
    }
}

pub fn lag_label(lag_days: i32) -> Option<String> {
    match lag_days {
        0 => None,
        n if n > 0 => Some(format!("+{}g", n)),
        n => Some(format!("{}g", n)),
    }
}

/// Payload for creating a dependency through the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDependency {
    pub predecessor_task_id: TaskId,
    pub successor_task_id: TaskId,
    pub kind: DependencyKind,
    pub lag_days: i32,
}

/// A single task of a project plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Grouping parent. Independent of the dependency graph.
    #[serde(default)]
    pub parent_task_id: Option<TaskId>,
    #[serde(default)]
    pub planned_start: Option<NaiveDate>,
    #[serde(default)]
    pub planned_end: Option<NaiveDate>,
    #[serde(default)]
    pub actual_start: Option<NaiveDate>,
    #[serde(default)]
    pub actual_end: Option<NaiveDate>,
    /// 0 to 100.
    #[serde(default)]
    pub progress_percentage: u8,
    #[serde(default)]
    pub sort_order: i32,
}

impl Task {
    /// Create a new task with sensible defaults.
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            status: TaskStatus::Todo,
            parent_task_id: None,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            progress_percentage: 0,
            sort_order: 0,
        }
    }

    /// Builder-style helper for planned dates.
    pub fn planned(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self
    }

    pub fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent_task_id = Some(parent);
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Start used for display: actual if recorded, planned otherwise.
    pub fn display_start(&self) -> Option<NaiveDate> {
        self.actual_start.or(self.planned_start)
    }

    /// End used for display: actual if recorded, planned otherwise.
    pub fn display_end(&self) -> Option<NaiveDate> {
        self.actual_end.or(self.planned_end)
    }

    /// Both display dates, or `None` when the task cannot be drawn.
    /// An end before the start collapses onto the start.
    pub fn display_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.display_start()?;
        let end = self.display_end()?;
        Some((start, end.max(start)))
    }

    pub fn date_at(&self, anchor: Anchor) -> Option<NaiveDate> {
        match anchor {
            Anchor::Start => self.display_start(),
            Anchor::Finish => self.display_end(),
        }
    }

    /// Returns true if any other task names this one as its parent.
    pub fn has_children(&self, all_tasks: &[Task]) -> bool {
        all_tasks
            .iter()
            .any(|t| t.parent_task_id == Some(self.id))
    }
}

/// Payload for creating a task through the data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: ProjectId,
    pub name: String,
    pub parent_task_id: Option<TaskId>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn display_dates_prefer_actual() {
        let mut task = Task::new(Uuid::new_v4(), "Posa").planned(date(2024, 3, 1), date(2024, 3, 5));
        task.actual_start = Some(date(2024, 3, 2));
        assert_eq!(task.display_span(), Some((date(2024, 3, 2), date(2024, 3, 5))));

        task.actual_end = Some(date(2024, 3, 9));
        assert_eq!(task.display_span(), Some((date(2024, 3, 2), date(2024, 3, 9))));
    }

    #[test]
    fn span_requires_both_ends() {
        let mut task = Task::new(Uuid::new_v4(), "Sopralluogo");
        assert_eq!(task.display_span(), None);
        task.planned_start = Some(date(2024, 3, 1));
        assert_eq!(task.display_span(), None);
    }

    #[test]
    fn inverted_span_collapses_to_start() {
        let task = Task::new(Uuid::new_v4(), "x").planned(date(2024, 3, 5), date(2024, 3, 1));
        assert_eq!(task.display_span(), Some((date(2024, 3, 5), date(2024, 3, 5))));
    }

    #[test]
    fn kind_anchors() {
        use DependencyKind::*;
        assert_eq!(FinishToStart.predecessor_anchor(), Anchor::Finish);
        assert_eq!(FinishToStart.successor_anchor(), Anchor::Start);
        assert_eq!(StartToFinish.predecessor_anchor(), Anchor::Start);
        assert_eq!(StartToFinish.successor_anchor(), Anchor::Finish);
    }

    #[test]
    fn kind_serializes_as_short_code() {
        let json = serde_json::to_string(&DependencyKind::StartToStart).unwrap();
        assert_eq!(json, "\"SS\"");
    }

    #[test]
    fn lag_labels() {
        assert_eq!(lag_label(0), None);
        assert_eq!(lag_label(3).as_deref(), Some("+3g"));
        assert_eq!(lag_label(-2).as_deref(), Some("-2g"));
    }
}
