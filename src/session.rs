//! One open project plan: loaded tasks, the dependency graph, and the
//! mutating actions the UI triggers.
//!
//! Every mutation goes to the data service first and the affected slice is
//! reloaded afterwards, so local state never drifts from what the store
//! accepted.

use crate::error::{ActionError, EdgeError};
use crate::model::{
    DependencyEdge, DependencyKind, EdgeId, NewDependency, NewTask, ProjectId, Task, TaskId,
};
use crate::schedule::{self, plan_reorder, Conflict, DependencyGraph, TaskEdges};
use crate::store::DataService;

pub struct GanttSession<S: DataService> {
    service: S,
    project_id: ProjectId,
    tasks: Vec<Task>,
    graph: DependencyGraph,
    loading: bool,
}

impl<S: DataService> GanttSession<S> {
    /// Open `project_id` and perform the initial load.
    pub fn open(service: S, project_id: ProjectId) -> Result<Self, ActionError> {
        let mut session = Self {
            service,
            project_id,
            tasks: Vec::new(),
            graph: DependencyGraph::new(),
            loading: true,
        };
        session.reload()?;
        Ok(session)
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Close the session and hand the service back, e.g. to open another project.
    pub fn into_service(self) -> S {
        self.service
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        self.graph.edges()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn edges_for(&self, task_id: TaskId) -> TaskEdges {
        self.graph.edges_for(task_id)
    }

    pub fn conflicts_for(&self, task_id: TaskId) -> Vec<Conflict> {
        match self.task(task_id) {
            Some(task) => schedule::conflicts(task, &self.graph, &self.tasks),
            None => Vec::new(),
        }
    }

    /// Replace local state with the store's view of the project.
    pub fn reload(&mut self) -> Result<(), ActionError> {
        self.loading = true;
        let loaded = self.fetch();
        self.loading = false;
        let (tasks, edges) = loaded?;
        tracing::debug!(
            project = %self.project_id,
            tasks = tasks.len(),
            edges = edges.len(),
            "project reloaded"
        );
        self.graph = DependencyGraph::from_parts(&tasks, edges);
        self.tasks = tasks;
        Ok(())
    }

    fn fetch(&self) -> Result<(Vec<Task>, Vec<DependencyEdge>), ActionError> {
        let tasks = self.service.list_tasks(self.project_id)?;
        let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        let edges = self.service.list_dependencies(&ids)?;
        Ok((tasks, edges))
    }

    /// Validate, persist, then reload. Nothing changes locally on failure.
    pub fn add_dependency(
        &mut self,
        predecessor: TaskId,
        successor: TaskId,
        kind: DependencyKind,
        lag_days: i32,
    ) -> Result<DependencyEdge, ActionError> {
        if let Err(err) = self.graph.validate_new_edge(predecessor, successor, kind, lag_days) {
            tracing::info!(%predecessor, %successor, "dependency refused: {}", err);
            return Err(err.into());
        }

        let edge = self
            .service
            .create_dependency(NewDependency {
                predecessor_task_id: predecessor,
                successor_task_id: successor,
                kind,
                lag_days,
            })
            .map_err(|err| {
                tracing::warn!("create dependency failed: {}", err);
                ActionError::from(err)
            })?;

        self.graph.add_edge(edge.clone());
        self.reload()?;
        Ok(edge)
    }

    pub fn remove_dependency(&mut self, edge_id: EdgeId) -> Result<(), ActionError> {
        self.service.delete_dependency(edge_id).map_err(|err| {
            tracing::warn!(%edge_id, "delete dependency failed: {}", err);
            ActionError::from(err)
        })?;
        self.graph.remove_edge(edge_id);
        self.reload()
    }

    /// Drop `dragged` onto `target`. Returns `Ok(false)` when the drop is a
    /// no-op (different parent, same task). A failed write reloads from the
    /// store before the error is returned.
    pub fn reorder(&mut self, dragged: TaskId, target: TaskId) -> Result<bool, ActionError> {
        let Some(plan) = plan_reorder(&self.tasks, dragged, target) else {
            return Ok(false);
        };

        for (task_id, sort_order) in &plan {
            if let Err(err) = self.service.update_task_sort_order(*task_id, *sort_order) {
                tracing::warn!(%task_id, "reorder failed, reloading: {}", err);
                if let Err(reload_err) = self.reload() {
                    tracing::error!("reload after failed reorder also failed: {}", reload_err);
                }
                return Err(err.into());
            }
        }

        self.reload()?;
        Ok(true)
    }

    pub fn update_task(&mut self, task: &Task) -> Result<(), ActionError> {
        self.service.update_task(task)?;
        self.reload()
    }

    pub fn create_task(&mut self, new: NewTask) -> Result<Task, ActionError> {
        if new.project_id != self.project_id {
            return Err(EdgeError::CrossProject.into());
        }
        let task = self.service.create_task(new)?;
        self.reload()?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;
    use crate::store::{JsonFileStore, RemoteError, RemoteResult};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    /// Wraps the file store and fails chosen writes.
    struct FlakyStore {
        inner: JsonFileStore,
        fail_sort_order_after: Option<usize>,
        sort_order_writes: usize,
        reject_create: Option<fn() -> RemoteError>,
        list_calls: std::cell::Cell<usize>,
        fail_list: bool,
    }

    impl FlakyStore {
        fn new(inner: JsonFileStore) -> Self {
            Self {
                inner,
                fail_sort_order_after: None,
                sort_order_writes: 0,
                reject_create: None,
                list_calls: std::cell::Cell::new(0),
                fail_list: false,
            }
        }
    }

    impl DataService for FlakyStore {
        fn list_projects(&self) -> RemoteResult<Vec<Project>> {
            self.inner.list_projects()
        }
        fn list_tasks(&self, project_id: ProjectId) -> RemoteResult<Vec<Task>> {
            self.list_calls.set(self.list_calls.get() + 1);
            if self.fail_list {
                return Err(RemoteError::Unavailable("timeout".into()));
            }
            self.inner.list_tasks(project_id)
        }
        fn list_dependencies(&self, task_ids: &[TaskId]) -> RemoteResult<Vec<DependencyEdge>> {
            self.inner.list_dependencies(task_ids)
        }
        fn create_dependency(&mut self, new: NewDependency) -> RemoteResult<DependencyEdge> {
            match self.reject_create {
                Some(make) => Err(make()),
                None => self.inner.create_dependency(new),
            }
        }
        fn delete_dependency(&mut self, edge_id: EdgeId) -> RemoteResult<()> {
            self.inner.delete_dependency(edge_id)
        }
        fn update_task_sort_order(&mut self, task_id: TaskId, sort_order: i32) -> RemoteResult<()> {
            if let Some(limit) = self.fail_sort_order_after {
                if self.sort_order_writes >= limit {
                    return Err(RemoteError::Unavailable("connection reset".into()));
                }
            }
            self.sort_order_writes += 1;
            self.inner.update_task_sort_order(task_id, sort_order)
        }
        fn create_task(&mut self, new: NewTask) -> RemoteResult<Task> {
            self.inner.create_task(new)
        }
        fn update_task(&mut self, task: &Task) -> RemoteResult<()> {
            self.inner.update_task(task)
        }
    }

    fn open(store: FlakyStore) -> GanttSession<FlakyStore> {
        let project_id = store.inner.data().projects[0].id;
        GanttSession::open(store, project_id).unwrap()
    }

    fn by_name(session: &GanttSession<FlakyStore>, name: &str) -> TaskId {
        session.tasks().iter().find(|t| t.name == name).unwrap().id
    }

    #[test]
    fn add_dependency_persists_and_reloads() {
        let mut session = open(FlakyStore::new(JsonFileStore::with_sample(today())));
        assert!(!session.is_loading());
        let survey = by_name(&session, "Site survey");
        let wiring = by_name(&session, "Electrical wiring");
        let before = session.edges().len();

        let edge = session
            .add_dependency(survey, wiring, DependencyKind::FinishToStart, 3)
            .unwrap();
        assert_eq!(session.edges().len(), before + 1);
        assert!(session.edges_for(wiring).predecessors.contains(&edge));
        assert_eq!(session.service().inner.data().dependencies.len(), before + 1);
    }

    #[test]
    fn local_rejection_never_reaches_the_store() {
        let mut store = FlakyStore::new(JsonFileStore::with_sample(today()));
        store.reject_create = Some(|| RemoteError::Unavailable("should not be called".into()));
        let mut session = open(store);
        let kickoff = by_name(&session, "Kickoff with customer");
        let handover = by_name(&session, "Handover");

        assert_eq!(
            session.add_dependency(handover, kickoff, DependencyKind::FinishToStart, 0),
            Err(ActionError::Rejected(EdgeError::CycleDetected))
        );
        assert_eq!(
            session.add_dependency(kickoff, kickoff, DependencyKind::FinishToStart, 0),
            Err(ActionError::Rejected(EdgeError::SelfReference))
        );
    }

    #[test]
    fn remote_rejection_leaves_state_untouched() {
        let mut store = FlakyStore::new(JsonFileStore::with_sample(today()));
        store.reject_create = Some(|| RemoteError::CycleRejected("trigger".into()));
        let mut session = open(store);
        let survey = by_name(&session, "Site survey");
        let wiring = by_name(&session, "Electrical wiring");
        let before = session.edges().to_vec();

        let err = session
            .add_dependency(survey, wiring, DependencyKind::FinishToStart, 0)
            .unwrap_err();
        assert_eq!(err, ActionError::Rejected(EdgeError::CycleDetected));
        assert_eq!(session.edges(), before.as_slice());
    }

    #[test]
    fn remove_dependency_round_trip() {
        let mut session = open(FlakyStore::new(JsonFileStore::with_sample(today())));
        let edge_id = session.edges()[0].id;
        session.remove_dependency(edge_id).unwrap();
        assert!(session.graph().edge(edge_id).is_none());
        assert!(matches!(
            session.remove_dependency(edge_id),
            Err(ActionError::RemoteFailure(Some(_)))
        ));
    }

    #[test]
    fn reorder_within_parent_is_persisted() {
        let mut session = open(FlakyStore::new(JsonFileStore::with_sample(today())));
        let demolition = by_name(&session, "Demolition");
        let finishing = by_name(&session, "Finishing");

        assert_eq!(session.reorder(finishing, demolition), Ok(true));
        let order = |name: &str| session.task(by_name(&session, name)).unwrap().sort_order;
        assert_eq!(order("Finishing"), 0);
        assert_eq!(order("Demolition"), 1);
        assert_eq!(order("Electrical wiring"), 2);
    }

    #[test]
    fn reorder_across_parents_is_a_noop() {
        let mut session = open(FlakyStore::new(JsonFileStore::with_sample(today())));
        let survey = by_name(&session, "Site survey");
        let wiring = by_name(&session, "Electrical wiring");
        let before: Vec<i32> = session.tasks().iter().map(|t| t.sort_order).collect();

        assert_eq!(session.reorder(survey, wiring), Ok(false));
        let after: Vec<i32> = session.tasks().iter().map(|t| t.sort_order).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn failed_reorder_reloads_persisted_state() {
        let mut store = FlakyStore::new(JsonFileStore::with_sample(today()));
        store.fail_sort_order_after = Some(1);
        let mut session = open(store);
        let demolition = by_name(&session, "Demolition");
        let finishing = by_name(&session, "Finishing");
        let loads_before = session.service().list_calls.get();

        let err = session.reorder(finishing, demolition).unwrap_err();
        assert_eq!(err, ActionError::RemoteFailure(Some("service unavailable: connection reset".into())));
        assert_eq!(session.service().list_calls.get(), loads_before + 1);
        // Only the first write landed; local state mirrors the store.
        let stored: Vec<(TaskId, i32)> = session
            .service()
            .inner
            .data()
            .tasks
            .iter()
            .map(|t| (t.id, t.sort_order))
            .collect();
        for task in session.tasks() {
            assert!(stored.contains(&(task.id, task.sort_order)));
        }
    }

    #[test]
    fn failed_reload_clears_loading_and_keeps_tasks() {
        let mut store = FlakyStore::new(JsonFileStore::with_sample(today()));
        store.fail_list = true;
        let project_id = store.inner.data().projects[0].id;
        assert!(GanttSession::open(store, project_id).is_err());

        let mut session = open(FlakyStore::new(JsonFileStore::with_sample(today())));
        let before = session.tasks().to_vec();
        session.service.fail_list = true;
        assert_eq!(
            session.reload(),
            Err(ActionError::RemoteFailure(Some("service unavailable: timeout".into())))
        );
        assert!(!session.is_loading());
        assert_eq!(session.tasks(), before.as_slice());
    }

    #[test]
    fn create_task_rejects_foreign_project() {
        let mut session = open(FlakyStore::new(JsonFileStore::with_sample(today())));
        let err = session
            .create_task(NewTask {
                project_id: Uuid::new_v4(),
                name: "x".into(),
                parent_task_id: None,
                planned_start: None,
                planned_end: None,
            })
            .unwrap_err();
        assert_eq!(err, ActionError::Rejected(EdgeError::CrossProject));
    }

    #[test]
    fn edited_dates_surface_conflicts() {
        let mut session = open(FlakyStore::new(JsonFileStore::with_sample(today())));
        let survey = by_name(&session, "Site survey");
        let mut task = session.task(survey).unwrap().clone();
        // Start before the kickoff finished.
        task.actual_start = Some(today() - chrono::Duration::days(10));
        session.update_task(&task).unwrap();
        let conflicts = session.conflicts_for(survey);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].slip_days() > 0);
    }

    #[test]
    fn service_survives_switching_projects() {
        let mut store = JsonFileStore::with_sample(today());
        let other = Project::new("C-2024-018", "Warehouse racking");
        let other_id = other.id;
        store.insert_project(other).unwrap();

        let session = open(FlakyStore::new(store));
        assert!(!session.tasks().is_empty());

        let session = GanttSession::open(session.into_service(), other_id).unwrap();
        assert_eq!(session.project_id(), other_id);
        assert!(session.tasks().is_empty());
        assert!(session.edges().is_empty());
    }
}
