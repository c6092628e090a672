use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use commesse_gantt::model::{DependencyEdge, Task, TaskId, TimelineViewport};
use commesse_gantt::schedule::{
    ConnectorPath, DateRange, GanttProjection, PathGeometry, Point, Refresh, TaskPosition,
};
use egui::epaint::CubicBezierShape;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2};

use crate::ui::theme;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_PADDING: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const ARROW_SIZE: f32 = 5.0;

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Clone)]
pub struct ChartInteraction {
    /// What the projection did this frame.
    pub refresh: Refresh,
}

/// Render the Gantt chart area (right panel).
#[allow(clippy::too_many_arguments)]
pub fn show_gantt_chart(
    tasks: &[Task],
    edges: &[DependencyEdge],
    conflicted: &HashSet<TaskId>,
    projection: &mut GanttProjection,
    viewport: &mut TimelineViewport,
    selected_task: &mut Option<TaskId>,
    today: NaiveDate,
    ui: &mut Ui,
) -> ChartInteraction {
    let available = ui.available_size();

    // Handle zoom with scroll wheel
    let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
    if ui.rect_contains_pointer(ui.max_rect()) && ui.input(|i| i.modifiers.ctrl) {
        if scroll_delta.y > 0.0 {
            viewport.zoom_in();
        } else if scroll_delta.y < 0.0 {
            viewport.zoom_out();
        }
    }

    // Width follows the last computed range; a range change settles on the next frame.
    let total_days = projection
        .range
        .as_ref()
        .map(DateRange::total_days)
        .unwrap_or(0);
    let chart_width = viewport.chart_width(total_days, available.x);
    let refresh = projection.refresh(
        tasks,
        edges,
        today,
        chart_width,
        &theme::ROW_METRICS,
        Instant::now(),
    );
    let chart_height = projection.chart_height(&theme::ROW_METRICS) + 40.0;

    let Some(range) = projection.range.clone() else {
        return ChartInteraction { refresh };
    };
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(chart_width, chart_height.max(available.y)),
                Sense::click(),
            );
            let origin = response.rect.min;
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            draw_timeline_header(&painter, origin, &range, chart_width, chart_height);

            // Alternating row backgrounds
            for i in 0..projection.rows.len() {
                let y = origin.y + theme::ROW_METRICS.row_top(i);
                let row_bg = if i % 2 == 0 { theme::BG_PANEL } else { theme::BG_DARK };
                painter.rect_filled(
                    Rect::from_min_size(
                        Pos2::new(origin.x, y),
                        Vec2::new(chart_width, ROW_HEIGHT + ROW_PADDING),
                    ),
                    0.0,
                    row_bg,
                );
                painter.line_segment(
                    [
                        Pos2::new(origin.x, y + ROW_HEIGHT + ROW_PADDING),
                        Pos2::new(origin.x + chart_width, y + ROW_HEIGHT + ROW_PADDING),
                    ],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );
            }

            draw_today_line(&painter, origin, &range, today, chart_width, chart_height);

            // Connectors sit under the bars.
            for connector in &projection.connectors {
                draw_connector(&painter, origin, connector);
            }

            for row in &projection.rows {
                let (Some(task), Some(pos)) =
                    (by_id.get(&row.task_id), projection.positions.get(&row.task_id))
                else {
                    continue;
                };
                let is_selected = *selected_task == Some(task.id);
                let is_summary = task.has_children(tasks);
                let bar_rect = draw_task_bar(&painter, origin, task, pos, is_summary, is_selected);

                if conflicted.contains(&task.id) {
                    draw_conflict_badge(&painter, bar_rect);
                }

                let bar_response = ui.interact(
                    bar_rect.expand(2.0),
                    ui.make_persistent_id(("task-bar", task.id)),
                    Sense::click(),
                );
                if bar_response.clicked() {
                    *selected_task = Some(task.id);
                    consumed_click = true;
                }
                if bar_response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    egui::show_tooltip_at_pointer(
                        ui.ctx(),
                        ui.layer_id(),
                        egui::Id::new(("task-tip", task.id)),
                        |ui| {
                            ui.strong(&task.name);
                            if let (Some(start), Some(end)) = (task.display_start(), task.display_end()) {
                                ui.label(format!(
                                    "{} → {}",
                                    start.format("%d/%m/%Y"),
                                    end.format("%d/%m/%Y"),
                                ));
                            }
                            ui.label(format!("{} · {}%", task.status.label(), task.progress_percentage));
                            if conflicted.contains(&task.id) {
                                ui.colored_label(theme::CONFLICT_BADGE, "Starts before its predecessors allow");
                            }
                        },
                    );
                }
            }

            // Empty click on background clears selection
            if response.clicked() && !consumed_click {
                *selected_task = None;
            }
        });

    ChartInteraction { refresh }
}

fn to_screen(origin: Pos2, p: Point) -> Pos2 {
    Pos2::new(origin.x + p.x, origin.y + p.y)
}

fn draw_timeline_header(
    painter: &egui::Painter,
    origin: Pos2,
    range: &DateRange,
    width: f32,
    height: f32,
) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let mut last_month = None;
    for week in range.weeks() {
        let x = origin.x + range.percent_of(week.first_day) / 100.0 * width;
        painter.line_segment(
            [
                Pos2::new(x, origin.y + HEADER_HEIGHT),
                Pos2::new(x, origin.y + height),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        painter.text(
            Pos2::new(x + 3.0, origin.y + 28.0),
            egui::Align2::LEFT_CENTER,
            week.first_day.format("%d").to_string(),
            theme::font_sub(),
            theme::TEXT_SECONDARY,
        );

        let month = (week.first_day.year(), week.first_day.month());
        if last_month != Some(month) {
            last_month = Some(month);
            painter.text(
                Pos2::new(x + 3.0, origin.y + 12.0),
                egui::Align2::LEFT_CENTER,
                week.first_day.format("%b %Y").to_string(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }
    }
}

fn draw_today_line(
    painter: &egui::Painter,
    origin: Pos2,
    range: &DateRange,
    today: NaiveDate,
    width: f32,
    height: f32,
) {
    let x = origin.x + range.percent_of(today) / 100.0 * width;
    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, origin.y + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_task_bar(
    painter: &egui::Painter,
    origin: Pos2,
    task: &Task,
    pos: &TaskPosition,
    is_summary: bool,
    is_selected: bool,
) -> Rect {
    let bar_width = pos.right - pos.left;
    let (top, height) = if is_summary {
        (pos.top + pos.height * 0.3, pos.height * 0.4)
    } else {
        (pos.top, pos.height)
    };
    let bar_rect = Rect::from_min_size(
        Pos2::new(origin.x + pos.left, origin.y + top),
        Vec2::new(bar_width, height),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING.min(height / 2.0));
    let color = if is_summary {
        theme::SUMMARY_BAR
    } else {
        theme::status_color(task.status)
    };

    // Soft shadow
    painter.rect_filled(
        bar_rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(bar_rect, rounding, color);

    if task.progress_percentage > 0 {
        let progress_width = bar_width * f32::from(task.progress_percentage.min(100)) / 100.0;
        let progress_rect =
            Rect::from_min_size(bar_rect.min, Vec2::new(progress_width, bar_rect.height()));
        painter.rect_filled(progress_rect, rounding, theme::PROGRESS_OVERLAY);
    }

    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Name on the bar when it fits, otherwise right of it.
    let galley = painter.layout_no_wrap(task.name.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
    if !is_summary && galley.size().x + 12.0 < bar_width {
        painter.galley(
            Pos2::new(bar_rect.left() + 6.0, bar_rect.center().y - galley.size().y / 2.0),
            galley,
            theme::TEXT_ON_BAR,
        );
    } else {
        painter.text(
            Pos2::new(bar_rect.right() + 6.0, bar_rect.center().y),
            egui::Align2::LEFT_CENTER,
            &task.name,
            theme::font_bar(),
            theme::TEXT_SECONDARY,
        );
    }

    bar_rect
}

fn draw_conflict_badge(painter: &egui::Painter, bar_rect: Rect) {
    let center = Pos2::new(bar_rect.left() - 7.0, bar_rect.center().y);
    painter.circle_filled(center, 5.5, theme::CONFLICT_BADGE);
    painter.text(
        center,
        egui::Align2::CENTER_CENTER,
        "!",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_connector(painter: &egui::Painter, origin: Pos2, connector: &ConnectorPath) {
    let color = if connector.style.is_warning() {
        theme::CONNECTOR_WARNING
    } else {
        theme::CONNECTOR_NEUTRAL
    };
    let stroke = Stroke::new(1.2, color);

    let (points, approach) = match &connector.geometry {
        PathGeometry::Straight { from, to } => {
            let pts = vec![to_screen(origin, *from), to_screen(origin, *to)];
            (pts, to_screen(origin, *from))
        }
        PathGeometry::Curve {
            from,
            ctrl1,
            ctrl2,
            to,
        } => {
            let bezier = CubicBezierShape::from_points_stroke(
                [
                    to_screen(origin, *from),
                    to_screen(origin, *ctrl1),
                    to_screen(origin, *ctrl2),
                    to_screen(origin, *to),
                ],
                false,
                Color32::TRANSPARENT,
                stroke,
            );
            (bezier.flatten(Some(0.5)), to_screen(origin, *ctrl2))
        }
        PathGeometry::Routed { points } => {
            let pts: Vec<Pos2> = points.iter().map(|p| to_screen(origin, *p)).collect();
            let approach = pts.len().checked_sub(2).map(|i| pts[i]).unwrap_or(origin);
            (pts, approach)
        }
    };

    if connector.style.is_dashed() {
        painter.extend(Shape::dashed_line(&points, stroke, 4.0, 3.0));
    } else {
        painter.add(Shape::line(points, stroke));
    }

    let tip = Pos2::new(origin.x + connector.end_x, origin.y + connector.end_y);
    draw_arrowhead(painter, approach, tip, color);

    if let Some(label) = &connector.label {
        painter.text(
            Pos2::new(tip.x + 3.0, tip.y - 4.0),
            egui::Align2::LEFT_BOTTOM,
            label,
            theme::font_small(),
            color,
        );
    }
}

fn draw_arrowhead(painter: &egui::Painter, from: Pos2, tip: Pos2, color: Color32) {
    let dir = (tip - from).normalized();
    if dir == Vec2::ZERO || !dir.x.is_finite() || !dir.y.is_finite() {
        return;
    }
    let back = tip - dir * ARROW_SIZE * 1.6;
    let side = dir.rot90() * ARROW_SIZE;
    painter.add(Shape::convex_polygon(
        vec![tip, back + side, back - side],
        color,
        Stroke::NONE,
    ));
}
