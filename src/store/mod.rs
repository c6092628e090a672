//! Data service boundary.
//!
//! Business records live in an external store. The planner only needs the
//! handful of operations below; [`JsonFileStore`] is the bundled
//! implementation.

mod json_store;

pub use json_store::{sample_data, JsonFileStore, StoreData};

use thiserror::Error;

use crate::model::{
    DependencyEdge, EdgeId, NewDependency, NewTask, Project, ProjectId, Task, TaskId,
};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors reported by a data service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A unique constraint was violated (same predecessor, successor and kind).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The store refused an edge that would close a cycle.
    #[error("circular dependency rejected: {0}")]
    CycleRejected(String),

    /// The store refused an edge between tasks of different projects.
    #[error("tasks belong to different projects: {0}")]
    SameProjectViolation(String),

    #[error("record not found: {0}")]
    NotFound(String),

    /// Network, permission or unexpected server failure.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Operations the planner needs from the external store.
pub trait DataService {
    fn list_projects(&self) -> RemoteResult<Vec<Project>>;

    fn list_tasks(&self, project_id: ProjectId) -> RemoteResult<Vec<Task>>;

    /// Every edge whose predecessor or successor is in `task_ids`.
    fn list_dependencies(&self, task_ids: &[TaskId]) -> RemoteResult<Vec<DependencyEdge>>;

    fn create_dependency(&mut self, new: NewDependency) -> RemoteResult<DependencyEdge>;

    fn delete_dependency(&mut self, edge_id: EdgeId) -> RemoteResult<()>;

    fn update_task_sort_order(&mut self, task_id: TaskId, sort_order: i32) -> RemoteResult<()>;

    fn create_task(&mut self, new: NewTask) -> RemoteResult<Task>;

    fn update_task(&mut self, task: &Task) -> RemoteResult<()>;
}
