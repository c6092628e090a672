pub mod project;
pub mod task;
pub mod timeline;

pub use project::Project;
pub use task::{
    Anchor, DependencyEdge, DependencyKind, EdgeId, NewDependency, NewTask, ProjectId, Task,
    TaskId, TaskStatus,
};
pub use timeline::TimelineViewport;
