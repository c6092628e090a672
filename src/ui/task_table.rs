use std::collections::{HashMap, HashSet};

use commesse_gantt::model::{Task, TaskId};
use commesse_gantt::schedule::Row;
use egui::{Color32, RichText, Ui};

use crate::ui::theme;

/// Actions that the task table can request.
pub enum TaskTableAction {
    None,
    Select(TaskId),
    /// `dragged` was dropped onto `target`.
    Reorder { dragged: TaskId, target: TaskId },
    Add,
}

/// Render the left-side task tree, in chart row order.
pub fn show_task_table(
    tasks: &[Task],
    rows: &[Row],
    link_counts: &HashMap<TaskId, (usize, usize)>,
    conflicted: &HashSet<TaskId>,
    selected_task: Option<TaskId>,
    ui: &mut Ui,
) -> TaskTableAction {
    let mut action = TaskTableAction::None;
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Tasks")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", tasks.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);

    let btn = egui::Button::new(
        RichText::new("＋  Add Task").color(Color32::WHITE).size(12.0),
    )
    .fill(theme::ACCENT)
    .rounding(egui::Rounding::same(5.0));
    if ui.add_sized([ui.available_width(), 30.0], btn).clicked() {
        action = TaskTableAction::Add;
    }

    ui.add_space(6.0);
    ui.separator();
    ui.label(
        RichText::new("Drag ⠿ onto a sibling to reorder")
            .size(9.0)
            .color(theme::TEXT_DIM),
    );
    ui.add_space(2.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, row) in rows.iter().enumerate() {
                let Some(task) = by_id.get(&row.task_id) else {
                    continue;
                };
                let is_selected = selected_task == Some(task.id);

                let row_bg = if is_selected {
                    theme::BG_SELECTED
                } else if i % 2 == 0 {
                    theme::BG_PANEL
                } else {
                    theme::BG_DARK
                };

                let frame = egui::Frame {
                    fill: row_bg,
                    rounding: egui::Rounding::same(4.0),
                    inner_margin: egui::Margin::symmetric(6.0, 4.0),
                    outer_margin: egui::Margin::ZERO,
                    stroke: egui::Stroke::NONE,
                    shadow: egui::epaint::Shadow::NONE,
                };

                let frame_resp = frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 6.0;

                        ui.dnd_drag_source(egui::Id::new(("task-drag", task.id)), task.id, |ui| {
                            ui.label(RichText::new("⠿").size(12.0).color(theme::TEXT_DIM));
                        });

                        ui.add_space(row.depth as f32 * theme::INDENT_WIDTH);

                        let (dot_rect, _) =
                            ui.allocate_exact_size(egui::vec2(6.0, 6.0), egui::Sense::hover());
                        ui.painter()
                            .circle_filled(dot_rect.center(), 3.0, theme::status_color(task.status));

                        let is_summary = task.has_children(tasks);
                        let mut name_text = RichText::new(&task.name).size(12.0).color(if is_selected {
                            Color32::WHITE
                        } else {
                            theme::TEXT_PRIMARY
                        });
                        if is_summary {
                            name_text = name_text.strong();
                        }
                        ui.add(egui::Label::new(name_text).truncate());

                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                ui.spacing_mut().item_spacing.x = 4.0;

                                if conflicted.contains(&task.id) {
                                    ui.label(RichText::new("!").strong().color(theme::CONFLICT_BADGE))
                                        .on_hover_text("Dependency dates not met");
                                }

                                if let Some(&(preds, succs)) = link_counts.get(&task.id) {
                                    if preds + succs > 0 {
                                        ui.label(
                                            RichText::new(format!(
                                                "{} {}",
                                                egui_phosphor::regular::LINK,
                                                preds + succs
                                            ))
                                            .size(10.0)
                                            .color(theme::TEXT_DIM),
                                        )
                                        .on_hover_text(format!(
                                            "{} predecessor(s), {} successor(s)",
                                            preds, succs
                                        ));
                                    }
                                }

                                ui.label(
                                    RichText::new(format!("{}%", task.progress_percentage))
                                        .size(10.0)
                                        .color(theme::TEXT_SECONDARY),
                                );

                                if let Some(start) = task.display_start() {
                                    ui.label(
                                        RichText::new(start.format("%d/%m").to_string())
                                            .size(10.0)
                                            .color(theme::TEXT_SECONDARY),
                                    );
                                }
                            },
                        );
                    });
                });

                let row_rect = frame_resp.response.rect;
                let row_click = ui.interact(
                    row_rect,
                    egui::Id::new(("task-row", task.id)),
                    egui::Sense::click(),
                );
                if row_click.clicked() {
                    action = TaskTableAction::Select(task.id);
                }

                if row_click.dnd_hover_payload::<TaskId>().is_some() {
                    ui.painter().rect_stroke(
                        row_rect,
                        egui::Rounding::same(4.0),
                        egui::Stroke::new(1.0, theme::BORDER_ACCENT),
                    );
                }
                if let Some(dragged) = row_click.dnd_release_payload::<TaskId>() {
                    action = TaskTableAction::Reorder {
                        dragged: *dragged,
                        target: task.id,
                    };
                }

                ui.add_space(1.0);
            }
        });

    action
}
