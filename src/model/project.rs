use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::ProjectId;

/// A project plan attached to a work order (commessa).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Work order code, e.g. `C-2024-017`.
    pub code: String,
    pub name: String,
}

impl Project {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
        }
    }

    /// Label used in the toolbar and window title.
    pub fn title(&self) -> String {
        if self.code.is_empty() {
            self.name.clone()
        } else {
            format!("{} · {}", self.code, self.name)
        }
    }
}
