use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use commesse_gantt::config::{AppPaths, Settings};
use commesse_gantt::model::{NewTask, Project, ProjectId, Task, TaskId, TimelineViewport};
use commesse_gantt::schedule::{GanttProjection, Refresh};
use commesse_gantt::store::{DataService, JsonFileStore};
use commesse_gantt::{ActionError, GanttSession};

use crate::ui;
use crate::ui::task_editor::{DependencyForm, EditorAction};
use crate::ui::task_table::TaskTableAction;

/// Main application state.
pub struct GanttApp {
    pub session: Option<GanttSession<JsonFileStore>>,
    pub projects: Vec<Project>,
    pub projection: GanttProjection,
    pub viewport: TimelineViewport,
    pub selected_task: Option<TaskId>,
    /// Editable copy of the selected task.
    draft: Option<Task>,
    pub dependency_form: DependencyForm,

    // Dialog state
    pub show_add_task: bool,
    pub show_about: bool,
    pub new_task_name: String,
    pub new_task_parent: Option<TaskId>,
    pub new_task_start_date: NaiveDate,
    pub new_task_end_date: NaiveDate,

    // Status message
    pub status_message: String,
    pub status_is_error: bool,

    pub settings: Settings,
    pub paths: AppPaths,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings, paths: AppPaths) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let today = chrono::Local::now().date_naive();
        let data_file = settings.resolved_data_file();
        let (store, status_message, status_is_error) = match JsonFileStore::open(&data_file, today) {
            Ok(store) => (store, format!("Loaded {}", data_file.display()), false),
            Err(e) => {
                tracing::error!(path = %data_file.display(), "cannot open data file: {}", e);
                (
                    JsonFileStore::with_sample(today),
                    format!("Could not open data file ({}); showing sample data", e),
                    true,
                )
            }
        };

        let mut app = Self {
            session: None,
            projects: Vec::new(),
            projection: GanttProjection::new(settings.settle_delay()),
            viewport: TimelineViewport::new(settings.pixels_per_day),
            selected_task: None,
            draft: None,
            dependency_form: DependencyForm::default(),
            show_add_task: false,
            show_about: false,
            new_task_name: String::new(),
            new_task_parent: None,
            new_task_start_date: today,
            new_task_end_date: today + chrono::Duration::days(7),
            status_message,
            status_is_error,
            settings,
            paths,
        };
        app.attach(store, None);
        app
    }

    /// Open `project` (or the first one) on `store`.
    fn attach(&mut self, store: JsonFileStore, project: Option<ProjectId>) {
        self.projects = match store.list_projects() {
            Ok(projects) => projects,
            Err(e) => {
                self.set_error(format!("Could not list projects: {}", e));
                Vec::new()
            }
        };
        let Some(project_id) = project.or_else(|| self.projects.first().map(|p| p.id)) else {
            self.set_status("No projects in the data file");
            return;
        };

        self.selected_task = None;
        self.draft = None;
        self.dependency_form.reset();
        self.projection.invalidate();
        match GanttSession::open(store, project_id) {
            Ok(session) => self.session = Some(session),
            Err(e) => self.set_error(e.user_message()),
        }
    }

    pub fn current_project(&self) -> Option<&Project> {
        let id = self.session.as_ref()?.project_id();
        self.projects.iter().find(|p| p.id == id)
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.status_is_error = false;
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.status_is_error = true;
    }

    fn report(&mut self, result: Result<(), ActionError>, success: impl Into<String>) {
        settle_draft(&mut self.draft, &result);
        match result {
            Ok(()) => self.set_status(success),
            Err(e) => self.set_error(e.user_message()),
        }
    }

    // --- Project operations ---

    pub fn switch_project(&mut self, project_id: ProjectId) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.attach(session.into_service(), Some(project_id));
        if let Some(project) = self.current_project() {
            let title = project.title();
            self.set_status(format!("Opened {}", title));
        }
    }

    pub fn reload(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = session.reload();
        self.report(result, "Reloaded");
    }

    pub fn export_csv(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.tasks().is_empty() {
            self.set_status("Nothing to export, the project has no tasks");
            return;
        }

        let default_name = self
            .current_project()
            .map(|p| format!("{}.csv", p.code))
            .unwrap_or_else(|| "schedule.csv".to_string());
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        {
            match commesse_gantt::io::export_csv(session.tasks(), session.edges(), &path) {
                Ok(count) => self.set_status(format!("Exported {} tasks to CSV", count)),
                Err(e) => self.set_error(format!("CSV export failed: {}", e)),
            }
        }
    }

    pub fn open_data_folder(&mut self) {
        let dir = self
            .session
            .as_ref()
            .and_then(|s| s.service().path())
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.paths.data_dir.clone());
        if let Err(e) = open::that(&dir) {
            self.set_error(format!("Could not open {}: {}", dir.display(), e));
        }
    }

    fn persist_zoom(&mut self) {
        if (self.settings.pixels_per_day - self.viewport.pixels_per_day).abs() < f32::EPSILON {
            return;
        }
        self.settings.pixels_per_day = self.viewport.pixels_per_day;
        if let Err(e) = self.settings.save_to(&self.paths.settings_file()) {
            tracing::warn!("could not save settings: {}", e);
        }
    }

    // --- Task operations ---

    pub fn open_add_task(&mut self, parent: Option<TaskId>) {
        let today = chrono::Local::now().date_naive();
        self.new_task_name.clear();
        self.new_task_parent = parent;
        self.new_task_start_date = today;
        self.new_task_end_date = today + chrono::Duration::days(7);
        self.show_add_task = true;
    }

    pub fn create_task_from_dialog(&mut self) {
        let name = self.new_task_name.trim().to_string();
        if name.is_empty() {
            self.set_error("Task name is required");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let project_id = session.project_id();
        let result = session.create_task(NewTask {
            project_id,
            name,
            parent_task_id: self.new_task_parent,
            planned_start: Some(self.new_task_start_date),
            planned_end: Some(self.new_task_end_date.max(self.new_task_start_date)),
        });
        match result {
            Ok(task) => {
                self.selected_task = Some(task.id);
                self.draft = None;
                self.show_add_task = false;
                self.set_status(format!("Added '{}'", task.name));
            }
            Err(e) => self.set_error(e.user_message()),
        }
    }

    fn handle_editor_action(&mut self, action: EditorAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match action {
            EditorAction::None => {}
            EditorAction::Save => {
                if let Some(draft) = self.draft.clone() {
                    let result = session.update_task(&draft);
                    self.report(result, format!("Updated '{}'", draft.name));
                }
            }
            EditorAction::RemoveDependency(edge_id) => {
                let result = session.remove_dependency(edge_id);
                self.report(result, "Dependency removed");
            }
            EditorAction::AddSubtask(parent) => self.open_add_task(Some(parent)),
            EditorAction::AddDependency {
                predecessor,
                successor,
                kind,
                lag_days,
            } => match session.add_dependency(predecessor, successor, kind, lag_days) {
                Ok(edge) => {
                    self.dependency_form.reset();
                    let label = edge.lag_label().unwrap_or_default();
                    self.set_status(format!("Linked [{}{}]", edge.kind.short_label(), label));
                }
                // Form keeps its input so the user can correct and resubmit.
                Err(e) => self.set_error(e.user_message()),
            },
        }
    }

    fn handle_table_action(&mut self, action: TaskTableAction) {
        match action {
            TaskTableAction::None => {}
            TaskTableAction::Select(id) => self.selected_task = Some(id),
            TaskTableAction::Add => self.open_add_task(None),
            TaskTableAction::Reorder { dragged, target } => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match session.reorder(dragged, target) {
                    Ok(true) => self.set_status("Order updated"),
                    Ok(false) => {}
                    Err(e) => self.set_error(e.user_message()),
                }
            }
        }
    }

    /// Keep the draft in step with the selection and the loaded tasks.
    fn sync_draft(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.draft = None;
            return;
        };
        let Some(selected) = self.selected_task else {
            self.draft = None;
            return;
        };
        match session.task(selected) {
            Some(task) => {
                if self.draft.as_ref().map(|d| d.id) != Some(selected) {
                    self.draft = Some(task.clone());
                    self.dependency_form.reset();
                }
            }
            None => {
                self.selected_task = None;
                self.draft = None;
            }
        }
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let today = chrono::Local::now().date_naive();

        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.reload();
        }
        if !ctx.input(|i| i.modifiers.ctrl || i.pointer.any_down()) {
            self.persist_zoom();
        }
        self.sync_draft();

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let color = if self.status_is_error {
                        ui::theme::TODAY_LINE
                    } else {
                        ui::theme::TEXT_SECONDARY
                    };
                    ui.label(egui::RichText::new(&self.status_message).size(11.0).color(color));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let (tasks, edges) = self
                            .session
                            .as_ref()
                            .map(|s| (s.tasks().len(), s.edges().len()))
                            .unwrap_or((0, 0));
                        ui.label(
                            egui::RichText::new(format!(
                                "Tasks: {} · Links: {} · {:.0} px/day",
                                tasks, edges, self.viewport.pixels_per_day
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        let Some(session) = self.session.as_ref() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("No project loaded")
                            .size(14.0)
                            .color(ui::theme::TEXT_DIM),
                    );
                });
            });
            return;
        };

        let conflicted: HashSet<TaskId> = session
            .tasks()
            .iter()
            .filter(|t| !session.conflicts_for(t.id).is_empty())
            .map(|t| t.id)
            .collect();
        let link_counts: HashMap<TaskId, (usize, usize)> = session
            .tasks()
            .iter()
            .map(|t| {
                let edges = session.edges_for(t.id);
                (t.id, (edges.predecessors.len(), edges.successors.len()))
            })
            .collect();

        // Left panel: editor + task tree
        let mut table_action = TaskTableAction::None;
        let mut editor_action = EditorAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(340.0)
            .min_width(260.0)
            .max_width(680.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                if let Some(draft) = self.draft.as_mut() {
                    let edges = session.edges_for(draft.id);
                    let conflicts = session.conflicts_for(draft.id);
                    egui::ScrollArea::vertical()
                        .id_salt("editor_scroll")
                        .max_height(ui.available_height() * 0.6)
                        .show(ui, |ui| {
                            editor_action = ui::task_editor::show_task_editor(
                                draft,
                                session.tasks(),
                                &edges,
                                &conflicts,
                                &mut self.dependency_form,
                                today,
                                ui,
                            );
                        });
                    ui.add_space(4.0);
                    ui.separator();
                }

                table_action = ui::task_table::show_task_table(
                    session.tasks(),
                    &self.projection.rows,
                    &link_counts,
                    &conflicted,
                    self.selected_task,
                    ui,
                );
            });

        // Central panel: Gantt chart
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let mut refresh = Refresh::Cached;
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            refresh = ui::gantt_chart::show_gantt_chart(
                session.tasks(),
                session.edges(),
                &conflicted,
                &mut self.projection,
                &mut self.viewport,
                &mut self.selected_task,
                today,
                ui,
            )
            .refresh;
        });

        match refresh {
            Refresh::Settling(wait) => ctx.request_repaint_after(wait),
            Refresh::Recomputed => ctx.request_repaint(),
            Refresh::Cached => {}
        }

        self.handle_editor_action(editor_action);
        self.handle_table_action(table_action);

        // Dialogs
        if self.show_add_task {
            ui::dialogs::show_add_task_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
    }
}

/// Drop the draft once a write lands. A failed write keeps the user's edits.
fn settle_draft(draft: &mut Option<Task>, result: &Result<(), ActionError>) {
    if result.is_ok() {
        *draft = None;
    }
}
