use egui::{menu, RichText, Ui};

use crate::app::GanttApp;

fn menu_title(text: &str) -> RichText {
    RichText::new(format!("  {}  ", text)).size(13.0)
}

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(menu_title("File"), |ui| {
            if ui.button("  Reload          F5").clicked() {
                app.reload();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Export CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
            if ui.button("  Open Data Folder").clicked() {
                app.open_data_folder();
                ui.close_menu();
            }
        });

        ui.menu_button(menu_title("Project"), |ui| {
            let current = app.session.as_ref().map(|s| s.project_id());
            let projects: Vec<_> = app.projects.iter().map(|p| (p.id, p.title())).collect();
            if projects.is_empty() {
                ui.label(RichText::new("No projects").small().weak());
            }
            for (id, title) in projects {
                if ui.radio(current == Some(id), title).clicked() {
                    if current != Some(id) {
                        app.switch_project(id);
                    }
                    ui.close_menu();
                }
            }
        });

        ui.menu_button(menu_title("View"), |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                app.viewport.zoom_in();
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                app.viewport.zoom_out();
                ui.close_menu();
            }
        });

        ui.menu_button(menu_title("Help"), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        // Right-aligned project name
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let title = app
                .current_project()
                .map(|p| p.title())
                .unwrap_or_default();
            let loading = app.session.as_ref().is_some_and(|s| s.is_loading());
            let suffix = if loading { " (loading…)" } else { "" };
            ui.label(RichText::new(format!("{}{}", title, suffix)).size(11.0).weak());
        });
    });
}
