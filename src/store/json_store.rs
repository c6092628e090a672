use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DataService, RemoteError, RemoteResult};
use crate::error::EdgeError;
use crate::model::{
    DependencyEdge, DependencyKind, EdgeId, NewDependency, NewTask, Project, ProjectId, Task,
    TaskId, TaskStatus,
};
use crate::schedule::DependencyGraph;

/// On-disk layout of the data file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
}

/// Data service backed by a JSON file, or by memory alone when no path is set.
///
/// Dependency writes are checked here as well as in the client, so a stale
/// client cannot slip a duplicate, cross-project or cyclic edge in.
#[derive(Debug)]
pub struct JsonFileStore {
    path: Option<PathBuf>,
    data: StoreData,
}

impl JsonFileStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: StoreData::default(),
        }
    }

    /// In-memory store seeded with the sample work order.
    pub fn with_sample(today: NaiveDate) -> Self {
        Self {
            path: None,
            data: sample_data(today),
        }
    }

    /// Open the data file, seeding it with the sample work order if missing.
    pub fn open(path: impl Into<PathBuf>, today: NaiveDate) -> RemoteResult<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::info!(path = %path.display(), "data file missing, seeding sample work order");
            let data = sample_data(today);
            write_file(&path, &data)?;
            return Ok(Self {
                path: Some(path),
                data,
            });
        }

        let json = fs::read_to_string(&path)?;
        let data: StoreData = serde_json::from_str(&json)?;
        let graph = DependencyGraph::from_parts(&data.tasks, data.dependencies.clone());
        if !graph.is_acyclic() {
            tracing::warn!(path = %path.display(), "data file contains a dependency cycle");
        }
        tracing::info!(
            path = %path.display(),
            projects = data.projects.len(),
            tasks = data.tasks.len(),
            dependencies = data.dependencies.len(),
            "data file loaded"
        );
        Ok(Self {
            path: Some(path),
            data,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    pub fn insert_project(&mut self, project: Project) -> RemoteResult<()> {
        let mut next = self.data.clone();
        next.projects.push(project);
        self.commit(next)
    }

    pub fn insert_task(&mut self, task: Task) -> RemoteResult<()> {
        let mut next = self.data.clone();
        next.tasks.push(task);
        self.commit(next)
    }

    /// Write `next` to disk, then make it the live copy. Memory is left
    /// untouched when the write fails.
    fn commit(&mut self, next: StoreData) -> RemoteResult<()> {
        if let Some(path) = &self.path {
            write_file(path, &next)?;
        }
        self.data = next;
        Ok(())
    }

    fn task(&self, id: TaskId) -> RemoteResult<&Task> {
        self.data
            .tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("task {}", id)))
    }
}

impl DataService for JsonFileStore {
    fn list_projects(&self) -> RemoteResult<Vec<Project>> {
        Ok(self.data.projects.clone())
    }

    fn list_tasks(&self, project_id: ProjectId) -> RemoteResult<Vec<Task>> {
        Ok(self
            .data
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    fn list_dependencies(&self, task_ids: &[TaskId]) -> RemoteResult<Vec<DependencyEdge>> {
        Ok(self
            .data
            .dependencies
            .iter()
            .filter(|d| {
                task_ids.contains(&d.predecessor_task_id) || task_ids.contains(&d.successor_task_id)
            })
            .cloned()
            .collect())
    }

    fn create_dependency(&mut self, new: NewDependency) -> RemoteResult<DependencyEdge> {
        let pred = self.task(new.predecessor_task_id)?.clone();
        let succ = self.task(new.successor_task_id)?.clone();

        let graph = DependencyGraph::from_parts(&[pred, succ], self.data.dependencies.clone());
        graph
            .validate_new_edge(
                new.predecessor_task_id,
                new.successor_task_id,
                new.kind,
                new.lag_days,
            )
            .map_err(|err| match err {
                EdgeError::DuplicateEdge => RemoteError::UniqueViolation(err.to_string()),
                EdgeError::CrossProject => RemoteError::SameProjectViolation(err.to_string()),
                EdgeError::CycleDetected | EdgeError::SelfReference => {
                    RemoteError::CycleRejected(err.to_string())
                }
                EdgeError::UnknownTask(id) => RemoteError::NotFound(format!("task {}", id)),
            })?;

        let edge = DependencyEdge {
            id: Uuid::new_v4(),
            predecessor_task_id: new.predecessor_task_id,
            successor_task_id: new.successor_task_id,
            kind: new.kind,
            lag_days: new.lag_days,
        };
        let mut next = self.data.clone();
        next.dependencies.push(edge.clone());
        self.commit(next)?;
        tracing::debug!(edge_id = %edge.id, "dependency stored");
        Ok(edge)
    }

    fn delete_dependency(&mut self, edge_id: EdgeId) -> RemoteResult<()> {
        let mut next = self.data.clone();
        next.dependencies.retain(|d| d.id != edge_id);
        if next.dependencies.len() == self.data.dependencies.len() {
            return Err(RemoteError::NotFound(format!("dependency {}", edge_id)));
        }
        self.commit(next)
    }

    fn update_task_sort_order(&mut self, task_id: TaskId, sort_order: i32) -> RemoteResult<()> {
        let mut next = self.data.clone();
        let task = next
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| RemoteError::NotFound(format!("task {}", task_id)))?;
        task.sort_order = sort_order;
        self.commit(next)
    }

    fn create_task(&mut self, new: NewTask) -> RemoteResult<Task> {
        if !self.data.projects.iter().any(|p| p.id == new.project_id) {
            return Err(RemoteError::NotFound(format!("project {}", new.project_id)));
        }
        let sort_order = self
            .data
            .tasks
            .iter()
            .filter(|t| t.project_id == new.project_id && t.parent_task_id == new.parent_task_id)
            .map(|t| t.sort_order + 1)
            .max()
            .unwrap_or(0);
        let mut task = Task::new(new.project_id, new.name).with_sort_order(sort_order);
        task.parent_task_id = new.parent_task_id;
        task.planned_start = new.planned_start;
        task.planned_end = new.planned_end;
        let mut next = self.data.clone();
        next.tasks.push(task.clone());
        self.commit(next)?;
        Ok(task)
    }

    fn update_task(&mut self, task: &Task) -> RemoteResult<()> {
        let mut next = self.data.clone();
        let slot = next
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| RemoteError::NotFound(format!("task {}", task.id)))?;
        if slot.project_id != task.project_id {
            return Err(RemoteError::SameProjectViolation(
                "a task cannot move to another project".to_string(),
            ));
        }
        let mut updated = task.clone();
        updated.progress_percentage = updated.progress_percentage.min(100);
        *slot = updated;
        self.commit(next)
    }
}

/// Atomic-ish write via temp file + rename.
fn write_file(path: &Path, data: &StoreData) -> RemoteResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// A sample work order with two phases, subtasks and dependencies.
pub fn sample_data(today: NaiveDate) -> StoreData {
    let days = Duration::days;
    let project = Project::new("C-2024-017", "Office refurbishment");
    let pid = project.id;

    // ── Phase 1: Planning ───────────────────────────────────────
    let phase1 = Task::new(pid, "Planning")
        .planned(today - days(5), today + days(8))
        .with_sort_order(0);

    let mut kickoff = Task::new(pid, "Kickoff with customer")
        .planned(today - days(5), today - days(2))
        .with_parent(phase1.id)
        .with_sort_order(0);
    kickoff.status = TaskStatus::Completed;
    kickoff.progress_percentage = 100;
    kickoff.actual_start = Some(today - days(5));
    kickoff.actual_end = Some(today - days(3));

    let mut survey = Task::new(pid, "Site survey")
        .planned(today - days(2), today + days(5))
        .with_parent(phase1.id)
        .with_sort_order(1);
    survey.status = TaskStatus::InProgress;
    survey.progress_percentage = 60;
    survey.actual_start = Some(today - days(2));

    let quote = Task::new(pid, "Quote approval")
        .planned(today + days(8), today + days(8))
        .with_parent(phase1.id)
        .with_sort_order(2);

    // ── Phase 2: Execution ──────────────────────────────────────
    let phase2 = Task::new(pid, "Execution")
        .planned(today + days(6), today + days(30))
        .with_sort_order(1);

    let demolition = Task::new(pid, "Demolition")
        .planned(today + days(6), today + days(12))
        .with_parent(phase2.id)
        .with_sort_order(0);
    let wiring = Task::new(pid, "Electrical wiring")
        .planned(today + days(10), today + days(22))
        .with_parent(phase2.id)
        .with_sort_order(1);
    let finishing = Task::new(pid, "Finishing")
        .planned(today + days(20), today + days(30))
        .with_parent(phase2.id)
        .with_sort_order(2);

    let handover = Task::new(pid, "Handover")
        .planned(today + days(32), today + days(32))
        .with_sort_order(2);

    let link = |pred: &Task, succ: &Task, kind: DependencyKind, lag_days: i32| DependencyEdge {
        id: Uuid::new_v4(),
        predecessor_task_id: pred.id,
        successor_task_id: succ.id,
        kind,
        lag_days,
    };
    let dependencies = vec![
        link(&kickoff, &survey, DependencyKind::FinishToStart, 0),
        link(&survey, &quote, DependencyKind::FinishToStart, 2),
        link(&quote, &demolition, DependencyKind::FinishToStart, -2),
        link(&demolition, &wiring, DependencyKind::StartToStart, 4),
        link(&wiring, &finishing, DependencyKind::FinishToFinish, 8),
        link(&finishing, &handover, DependencyKind::FinishToStart, 0),
    ];

    StoreData {
        projects: vec![project],
        tasks: vec![
            phase1, kickoff, survey, quote, phase2, demolition, wiring, finishing, handover,
        ],
        dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn new_dep(pred: TaskId, succ: TaskId, kind: DependencyKind) -> NewDependency {
        NewDependency {
            predecessor_task_id: pred,
            successor_task_id: succ,
            kind,
            lag_days: 0,
        }
    }

    fn two_tasks(store: &mut JsonFileStore) -> (Task, Task) {
        let project = Project::new("C-1", "Test");
        let pid = project.id;
        store.insert_project(project).unwrap();
        let a = Task::new(pid, "a");
        let b = Task::new(pid, "b");
        store.insert_task(a.clone()).unwrap();
        store.insert_task(b.clone()).unwrap();
        (a, b)
    }

    #[test]
    fn sample_is_consistent() {
        let data = sample_data(today());
        let graph = DependencyGraph::from_parts(&data.tasks, data.dependencies.clone());
        assert!(graph.is_acyclic());
        assert!(data.tasks.iter().all(|t| t.project_id == data.projects[0].id));
    }

    #[test]
    fn server_side_rejections_use_distinct_codes() {
        let mut store = JsonFileStore::in_memory();
        let (a, b) = two_tasks(&mut store);

        store.create_dependency(new_dep(a.id, b.id, DependencyKind::FinishToStart)).unwrap();
        assert!(matches!(
            store.create_dependency(new_dep(a.id, b.id, DependencyKind::FinishToStart)),
            Err(RemoteError::UniqueViolation(_))
        ));
        assert!(matches!(
            store.create_dependency(new_dep(b.id, a.id, DependencyKind::StartToStart)),
            Err(RemoteError::CycleRejected(_))
        ));

        let other = Project::new("C-2", "Other");
        let foreign = Task::new(other.id, "foreign");
        store.insert_project(other).unwrap();
        store.insert_task(foreign.clone()).unwrap();
        assert!(matches!(
            store.create_dependency(new_dep(a.id, foreign.id, DependencyKind::FinishToStart)),
            Err(RemoteError::SameProjectViolation(_))
        ));
        assert!(matches!(
            store.create_dependency(new_dep(a.id, Uuid::new_v4(), DependencyKind::FinishToStart)),
            Err(RemoteError::NotFound(_))
        ));
    }

    #[test]
    fn list_dependencies_matches_either_endpoint() {
        let mut store = JsonFileStore::in_memory();
        let (a, b) = two_tasks(&mut store);
        let edge = store
            .create_dependency(new_dep(a.id, b.id, DependencyKind::FinishToStart))
            .unwrap();
        assert_eq!(store.list_dependencies(&[b.id]).unwrap(), vec![edge.clone()]);
        assert_eq!(store.list_dependencies(&[a.id]).unwrap(), vec![edge]);
        assert!(store.list_dependencies(&[Uuid::new_v4()]).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_dependency_is_not_found() {
        let mut store = JsonFileStore::in_memory();
        assert!(matches!(
            store.delete_dependency(Uuid::new_v4()),
            Err(RemoteError::NotFound(_))
        ));
    }

    #[test]
    fn file_round_trip_persists_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("planner.json");

        let mut store = JsonFileStore::open(&path, today()).unwrap();
        assert!(path.exists());
        let project_id = store.list_projects().unwrap()[0].id;
        let tasks = store.list_tasks(project_id).unwrap();
        assert_eq!(tasks.len(), 9);

        let first = tasks[1].id;
        store.update_task_sort_order(first, 7).unwrap();

        let reopened = JsonFileStore::open(&path, today()).unwrap();
        let task = reopened.data().tasks.iter().find(|t| t.id == first).unwrap();
        assert_eq!(task.sort_order, 7);
        assert_eq!(reopened.data().dependencies.len(), 6);
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.json");
        let mut store = JsonFileStore::open(&path, today()).unwrap();

        // A directory in place of the temp file makes every write fail.
        fs::create_dir(dir.path().join("planner.json.tmp")).unwrap();

        let by_name = |name: &str| {
            store.data().tasks.iter().find(|t| t.name == name).unwrap().id
        };
        let survey = by_name("Site survey");
        let wiring = by_name("Electrical wiring");

        let result = store.create_dependency(new_dep(survey, wiring, DependencyKind::FinishToStart));
        assert!(matches!(result, Err(RemoteError::Io(_))));
        assert_eq!(store.data().dependencies.len(), 6);

        assert!(store.update_task_sort_order(survey, 42).is_err());
        let task = store.data().tasks.iter().find(|t| t.id == survey).unwrap();
        assert_eq!(task.sort_order, 1);

        let edge_id = store.data().dependencies[0].id;
        assert!(store.delete_dependency(edge_id).is_err());
        assert_eq!(store.data().dependencies.len(), 6);
    }

    #[test]
    fn created_tasks_append_to_their_group() {
        let mut store = JsonFileStore::with_sample(today());
        let project_id = store.data().projects[0].id;
        let created = store
            .create_task(NewTask {
                project_id,
                name: "Snagging".into(),
                parent_task_id: None,
                planned_start: None,
                planned_end: None,
            })
            .unwrap();
        assert_eq!(created.sort_order, 3);

        let missing = store.create_task(NewTask {
            project_id: Uuid::new_v4(),
            name: "x".into(),
            parent_task_id: None,
            planned_start: None,
            planned_end: None,
        });
        assert!(matches!(missing, Err(RemoteError::NotFound(_))));
    }
}
