//! Scheduling core: dependency graph, date constraints, chart layout and
//! connector routing. Nothing here touches the UI or the data service.

pub mod connector;
pub mod graph;
pub mod layout;
pub mod resolver;
pub mod view;

pub use connector::{compute_connectors, ConnectorPath, ConnectorStyle, PathGeometry, Point};
pub use graph::{DependencyGraph, TaskEdges};
pub use layout::{
    compute_bar, compute_date_range, plan_reorder, position_registry, row_order, Bar, DateRange,
    Row, RowMetrics, TaskPosition, WeekSpan, MIN_BAR_WIDTH,
};
pub use resolver::{conflicts, constraint, is_satisfied, Conflict, Constraint};
pub use view::{GanttProjection, Refresh};
