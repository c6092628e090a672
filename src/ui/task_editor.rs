use chrono::NaiveDate;
use commesse_gantt::model::{Anchor, DependencyEdge, DependencyKind, EdgeId, Task, TaskId, TaskStatus};
use commesse_gantt::schedule::{Conflict, TaskEdges};
use egui::{Color32, RichText, Ui};

use crate::ui::theme;

/// Actions the editor can request.
pub enum EditorAction {
    None,
    /// The draft was committed and should be written back.
    Save,
    RemoveDependency(EdgeId),
    AddSubtask(TaskId),
    AddDependency {
        predecessor: TaskId,
        successor: TaskId,
        kind: DependencyKind,
        lag_days: i32,
    },
}

/// Which side of the new edge the selected task takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Selected task is the successor.
    DependsOn,
    /// Selected task is the predecessor.
    Blocks,
}

/// Input of the "add dependency" form. Owned by the app so it survives a
/// rejected submission.
#[derive(Debug, Clone)]
pub struct DependencyForm {
    pub direction: LinkDirection,
    pub other: Option<TaskId>,
    pub kind: DependencyKind,
    pub lag_days: i32,
}

impl Default for DependencyForm {
    fn default() -> Self {
        Self {
            direction: LinkDirection::DependsOn,
            other: None,
            kind: DependencyKind::FinishToStart,
            lag_days: 0,
        }
    }
}

impl DependencyForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn section_label(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(10.0).color(theme::TEXT_DIM).strong());
}

fn task_name(tasks: &[Task], id: TaskId) -> String {
    tasks
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "?".to_string())
}

/// Checkbox plus date picker for an optional date. Returns true when changed.
fn optional_date(
    ui: &mut Ui,
    label: &str,
    value: &mut Option<NaiveDate>,
    fallback: NaiveDate,
    salt: &str,
) -> bool {
    let mut changed = false;
    ui.vertical(|ui| {
        ui.horizontal(|ui| {
            let mut set = value.is_some();
            if ui.checkbox(&mut set, "").changed() {
                *value = set.then_some(value.unwrap_or(fallback));
                changed = true;
            }
            section_label(ui, label);
        });
        if let Some(date) = value.as_mut() {
            if ui
                .add(egui_extras::DatePickerButton::new(date).id_salt(salt))
                .changed()
            {
                changed = true;
            }
        } else {
            ui.label(RichText::new("not set").size(10.0).color(theme::TEXT_DIM));
        }
    });
    changed
}

fn edge_row(
    ui: &mut Ui,
    edge: &DependencyEdge,
    other_name: &str,
    is_outgoing: bool,
    action: &mut EditorAction,
) {
    let arrow = if is_outgoing {
        egui_phosphor::regular::ARROW_RIGHT
    } else {
        egui_phosphor::regular::ARROW_LEFT
    };
    let lag = edge.lag_label().map(|l| format!(" {}", l)).unwrap_or_default();
    let label = format!("[{}{}] {} {}", edge.kind.short_label(), lag, arrow, other_name);

    ui.horizontal(|ui| {
        let color = if edge.lag_days < 0 {
            theme::CONNECTOR_WARNING
        } else {
            theme::TEXT_SECONDARY
        };
        ui.label(RichText::new(&label).size(11.0).color(color))
            .on_hover_text(edge.kind.description());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let del = ui.add(
                egui::Button::new(
                    RichText::new(egui_phosphor::regular::X)
                        .size(9.0)
                        .color(theme::TEXT_DIM),
                )
                .frame(false),
            );
            if del.on_hover_text("Remove dependency").clicked() {
                *action = EditorAction::RemoveDependency(edge.id);
            }
        });
    });
}

/// Render the editor for the selected task: fields, its dependencies, date
/// conflicts and the add-dependency form.
pub fn show_task_editor(
    draft: &mut Task,
    all_tasks: &[Task],
    edges: &TaskEdges,
    conflicts: &[Conflict],
    form: &mut DependencyForm,
    today: NaiveDate,
    ui: &mut Ui,
) -> EditorAction {
    let mut action = EditorAction::None;
    let task_id = draft.id;

    ui.add_space(6.0);
    ui.label(
        RichText::new("Edit Task")
            .strong()
            .size(13.0)
            .color(theme::TEXT_PRIMARY),
    );
    ui.add_space(4.0);

    let frame = egui::Frame {
        fill: theme::BG_DARK,
        rounding: egui::Rounding::same(6.0),
        inner_margin: egui::Margin::same(8.0),
        outer_margin: egui::Margin::ZERO,
        stroke: egui::Stroke::new(1.0, theme::BORDER_SUBTLE),
        shadow: egui::epaint::Shadow::NONE,
    };

    frame.show(ui, |ui| {
        ui.spacing_mut().item_spacing.y = 6.0;

        // ── Name ─────────────────────────────────────────────────────
        section_label(ui, "Name");
        let name_edit = ui.add_sized(
            [ui.available_width(), 24.0],
            egui::TextEdit::singleline(&mut draft.name)
                .font(egui::FontId::proportional(12.0))
                .text_color(theme::TEXT_PRIMARY),
        );
        if name_edit.lost_focus() && !draft.name.trim().is_empty() {
            action = EditorAction::Save;
        }

        // ── Status ───────────────────────────────────────────────────
        section_label(ui, "Status");
        egui::ComboBox::from_id_salt("status_combo")
            .selected_text(RichText::new(draft.status.label()).size(11.0))
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for s in TaskStatus::all() {
                    if ui.selectable_value(&mut draft.status, *s, s.label()).changed() {
                        action = EditorAction::Save;
                    }
                }
            });

        // ── Dates ────────────────────────────────────────────────────
        ui.horizontal(|ui| {
            if optional_date(ui, "Planned start", &mut draft.planned_start, today, "dp_planned_start") {
                action = EditorAction::Save;
            }
            ui.add_space(8.0);
            let fallback = draft.planned_start.unwrap_or(today);
            if optional_date(ui, "Planned end", &mut draft.planned_end, fallback, "dp_planned_end") {
                action = EditorAction::Save;
            }
        });
        ui.horizontal(|ui| {
            if optional_date(ui, "Actual start", &mut draft.actual_start, today, "dp_actual_start") {
                action = EditorAction::Save;
            }
            ui.add_space(8.0);
            let fallback = draft.actual_start.unwrap_or(today);
            if optional_date(ui, "Actual end", &mut draft.actual_end, fallback, "dp_actual_end") {
                action = EditorAction::Save;
            }
        });

        // ── Progress ─────────────────────────────────────────────────
        section_label(ui, "Progress");
        let slider = egui::Slider::new(&mut draft.progress_percentage, 0..=100).suffix("%");
        let resp = ui.add_sized([ui.available_width(), 20.0], slider);
        if resp.drag_stopped() || (resp.changed() && !resp.dragged()) {
            action = EditorAction::Save;
        }

        let btn = egui::Button::new(
            RichText::new(egui_phosphor::regular::PLUS.to_string() + "  Add Subtask")
                .color(Color32::WHITE)
                .size(12.0),
        )
        .fill(theme::ACCENT)
        .rounding(egui::Rounding::same(4.0));
        if ui.add_sized([ui.available_width(), 26.0], btn).clicked() {
            action = EditorAction::AddSubtask(task_id);
        }

        ui.add_space(4.0);
        ui.separator();

        // ── Dependencies ─────────────────────────────────────────────
        section_label(ui, "Dependencies");
        if edges.predecessors.is_empty() && edges.successors.is_empty() {
            ui.label(
                RichText::new("No dependencies yet")
                    .size(9.5)
                    .color(theme::TEXT_DIM),
            );
        }
        for edge in &edges.predecessors {
            let name = task_name(all_tasks, edge.predecessor_task_id);
            edge_row(ui, edge, &name, false, &mut action);
        }
        for edge in &edges.successors {
            let name = task_name(all_tasks, edge.successor_task_id);
            edge_row(ui, edge, &name, true, &mut action);
        }

        if !conflicts.is_empty() {
            ui.add_space(2.0);
            for conflict in conflicts {
                let name = task_name(all_tasks, conflict.predecessor_task_id);
                ui.label(
                    RichText::new(format!(
                        "{} Earliest {} is {} (because of {}), {} day(s) late",
                        egui_phosphor::regular::WARNING,
                        match conflict.anchor {
                            Anchor::Start => "start",
                            Anchor::Finish => "end",
                        },
                        conflict.earliest.format("%d/%m/%Y"),
                        name,
                        conflict.slip_days(),
                    ))
                    .size(10.5)
                    .color(theme::CONFLICT_BADGE),
                );
            }
        }

        ui.add_space(4.0);

        // ── Add dependency ───────────────────────────────────────────
        let candidates: Vec<(TaskId, String)> = all_tasks
            .iter()
            .filter(|t| t.id != task_id)
            .map(|t| (t.id, t.name.clone()))
            .collect();

        if candidates.is_empty() {
            return;
        }

        section_label(ui, "Add dependency");
        ui.horizontal(|ui| {
            ui.selectable_value(&mut form.direction, LinkDirection::DependsOn, "Depends on");
            ui.selectable_value(&mut form.direction, LinkDirection::Blocks, "Blocks");
        });

        let target_label = form
            .other
            .and_then(|id| candidates.iter().find(|(cid, _)| *cid == id))
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| "Pick a task…".to_string());

        ui.horizontal(|ui| {
            let kind_resp = egui::ComboBox::from_id_salt("new-dep-kind")
                .selected_text(RichText::new(form.kind.short_label()).size(11.0))
                .width(46.0)
                .show_ui(ui, |ui| {
                    for k in DependencyKind::all() {
                        let row = ui.selectable_label(form.kind == *k, k.short_label());
                        if row.on_hover_text(k.description()).clicked() {
                            form.kind = *k;
                        }
                    }
                });
            kind_resp.response.on_hover_text(form.kind.description());

            let combo_w = (ui.available_width() - 30.0).clamp(60.0, 220.0);
            egui::ComboBox::from_id_salt("new-dep-target")
                .selected_text(RichText::new(&target_label).size(11.0))
                .width(combo_w)
                .show_ui(ui, |ui| {
                    for (cid, cname) in &candidates {
                        if ui
                            .selectable_label(form.other == Some(*cid), cname.as_str())
                            .clicked()
                        {
                            form.other = Some(*cid);
                        }
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label(RichText::new("Lag").size(11.0).color(theme::TEXT_SECONDARY));
            ui.add(
                egui::DragValue::new(&mut form.lag_days)
                    .range(-365..=365)
                    .suffix(" d"),
            )
            .on_hover_text("Working offset in days; negative values are a lead");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let can_add = form.other.is_some();
                let btn = egui::Button::new(RichText::new("＋").size(13.0).color(Color32::WHITE))
                    .fill(if can_add { theme::ACCENT } else { theme::BG_HEADER })
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_enabled(can_add, btn).clicked() {
                    if let Some(other) = form.other {
                        let (predecessor, successor) = match form.direction {
                            LinkDirection::DependsOn => (other, task_id),
                            LinkDirection::Blocks => (task_id, other),
                        };
                        action = EditorAction::AddDependency {
                            predecessor,
                            successor,
                            kind: form.kind,
                            lag_days: form.lag_days,
                        };
                    }
                }
            });
        });
    });

    action
}
