use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::model::{DependencyEdge, Task, TaskId};
use crate::schedule::row_order;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// Predecessor summary for one task, e.g. `Site survey FS+2; Demolition SS`.
fn predecessors_cell(task_id: TaskId, edges: &[DependencyEdge], names: &HashMap<TaskId, &str>) -> String {
    edges
        .iter()
        .filter(|e| e.successor_task_id == task_id)
        .map(|e| {
            let name = names.get(&e.predecessor_task_id).copied().unwrap_or("?");
            let lag = match e.lag_days {
                0 => String::new(),
                n if n > 0 => format!("+{}", n),
                n => n.to_string(),
            };
            format!("{} {}{}", name, e.kind.short_label(), lag)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Write the schedule in chart row order, semicolon-delimited.
///
/// Columns: Task ; Parent ; Start ; End ; Status ; Progress ; Predecessors
/// Dates are display dates formatted as DD/MM/YYYY, blank when unset.
/// Returns the number of tasks written.
pub fn write_schedule<W: Write>(
    tasks: &[Task],
    edges: &[DependencyEdge],
    writer: W,
) -> Result<usize, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record([
        "Task",
        "Parent",
        "Start",
        "End",
        "Status",
        "Progress",
        "Predecessors",
    ])?;

    let names: HashMap<TaskId, &str> = tasks.iter().map(|t| (t.id, t.name.as_str())).collect();
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    let fmt = |d: Option<chrono::NaiveDate>| d.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default();

    let rows = row_order(tasks);
    for row in &rows {
        let Some(task) = by_id.get(&row.task_id) else {
            continue;
        };
        let parent = task
            .parent_task_id
            .and_then(|p| names.get(&p).copied())
            .unwrap_or("");
        wtr.write_record([
            task.name.as_str(),
            parent,
            &fmt(task.display_start()),
            &fmt(task.display_end()),
            task.status.label(),
            &format!("{}%", task.progress_percentage),
            &predecessors_cell(task.id, edges, &names),
        ])?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

/// Export the schedule to a CSV file at `path`.
pub fn export_csv(tasks: &[Task], edges: &[DependencyEdge], path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path)?;
    let count = write_schedule(tasks, edges, file)?;
    tracing::info!(path = %path.display(), count, "schedule exported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DependencyKind;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn rows_follow_chart_order_with_predecessors() {
        let pid = Uuid::new_v4();
        let d = |day| NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        let phase = Task::new(pid, "Phase");
        let a = Task::new(pid, "Survey").planned(d(1), d(3)).with_parent(phase.id);
        let b = Task::new(pid, "Demolition")
            .planned(d(6), d(9))
            .with_parent(phase.id)
            .with_sort_order(1);
        let edges = vec![DependencyEdge {
            id: Uuid::new_v4(),
            predecessor_task_id: a.id,
            successor_task_id: b.id,
            kind: DependencyKind::FinishToStart,
            lag_days: 2,
        }];

        let mut out = Vec::new();
        let count = write_schedule(&[b, phase, a], &edges, &mut out).unwrap();
        assert_eq!(count, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Task;Parent;Start;End;Status;Progress;Predecessors");
        assert_eq!(lines[1], "Phase;;;;To do;0%;");
        assert_eq!(lines[2], "Survey;Phase;01/02/2024;03/02/2024;To do;0%;");
        assert_eq!(lines[3], "Demolition;Phase;06/02/2024;09/02/2024;To do;0%;Survey FS+2");
    }
}
