//! Project planning core for work orders (commesse).
//!
//! Tasks and their dependency edges come from an external data service.
//! This crate validates new edges (self-reference, duplicates, cross-project
//! links, cycles), checks dependency dates, lays task bars out on a shared
//! date axis and routes the connector lines drawn between them.
//!
//! # Usage
//!
//! ```no_run
//! use commesse_gantt::model::DependencyKind;
//! use commesse_gantt::session::GanttSession;
//! use commesse_gantt::store::{DataService, JsonFileStore};
//!
//! let today = chrono::Local::now().date_naive();
//! let store = JsonFileStore::with_sample(today);
//! let project = store.list_projects()?[0].id;
//! let mut session = GanttSession::open(store, project)?;
//!
//! let (a, b) = (session.tasks()[1].id, session.tasks()[2].id);
//! if let Err(err) = session.add_dependency(a, b, DependencyKind::StartToStart, 1) {
//!     eprintln!("{}", err.user_message());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod schedule;
pub mod session;
pub mod store;

pub use error::{ActionError, EdgeError};
pub use session::GanttSession;
