//! Connector lines between dependent task bars.
//!
//! Anchors follow the dependency kind: finish reads the right edge of a bar,
//! start the left edge, both at the vertical centre. A successor anchor well
//! ahead of the predecessor gets a direct line or curve; anything at, behind
//! or overlapping it is routed around the bars with right-angle segments.

use std::collections::HashMap;

use super::layout::TaskPosition;
use crate::model::{Anchor, DependencyEdge, DependencyKind, EdgeId, TaskId};

/// Minimum horizontal lead for a direct connector.
pub const DIRECT_THRESHOLD: f32 = 20.0;
/// Vertical tolerance under which a direct connector is a straight line.
pub const STRAIGHT_TOLERANCE: f32 = 5.0;
/// Horizontal stub of a routed connector outside each bar.
pub const ROUTE_OFFSET: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathGeometry {
    /// One horizontal segment.
    Straight { from: Point, to: Point },
    /// Cubic bezier with horizontal tangents at both ends.
    Curve {
        from: Point,
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    },
    /// Orthogonal polyline around the bars.
    Routed { points: Vec<Point> },
}

impl PathGeometry {
    pub fn segment_count(&self) -> usize {
        match self {
            Self::Straight { .. } | Self::Curve { .. } => 1,
            Self::Routed { points } => points.len().saturating_sub(1),
        }
    }

    pub fn start(&self) -> Point {
        match self {
            Self::Straight { from, .. } | Self::Curve { from, .. } => *from,
            Self::Routed { points } => points[0],
        }
    }

    /// SVG path data, handy for debugging and export.
    pub fn to_svg(&self) -> String {
        match self {
            Self::Straight { from, to } => {
                format!("M {} {} L {} {}", from.x, from.y, to.x, to.y)
            }
            Self::Curve {
                from,
                ctrl1,
                ctrl2,
                to,
            } => format!(
                "M {} {} C {} {}, {} {}, {} {}",
                from.x, from.y, ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y
            ),
            Self::Routed { points } => {
                let mut d = String::new();
                for (i, p) in points.iter().enumerate() {
                    let cmd = if i == 0 { "M" } else { " L" };
                    d.push_str(&format!("{} {} {}", cmd, p.x, p.y));
                }
                d
            }
        }
    }
}

/// Stroke treatment of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorStyle {
    /// No lag: neutral colour, solid line.
    Neutral,
    /// Positive lag: warning colour, solid line.
    Lag,
    /// Negative lag: warning colour, dashed line.
    Lead,
}

impl ConnectorStyle {
    pub fn for_lag(lag_days: i32) -> Self {
        match lag_days {
            0 => Self::Neutral,
            n if n > 0 => Self::Lag,
            _ => Self::Lead,
        }
    }

    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::Neutral)
    }

    pub fn is_dashed(&self) -> bool {
        matches!(self, Self::Lead)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPath {
    pub edge_id: EdgeId,
    pub geometry: PathGeometry,
    pub end_x: f32,
    pub end_y: f32,
    pub kind: DependencyKind,
    pub lag_days: i32,
    pub style: ConnectorStyle,
    /// `+Ng` / `-Ng`, drawn next to the successor anchor.
    pub label: Option<String>,
}

/// Edge of a bar a connector attaches to.
fn anchor_point(pos: &TaskPosition, anchor: Anchor) -> Point {
    let x = match anchor {
        Anchor::Start => pos.left,
        Anchor::Finish => pos.right,
    };
    Point::new(x, pos.center_y())
}

/// Horizontal direction pointing away from the bar at `anchor`.
fn outward(anchor: Anchor) -> f32 {
    match anchor {
        Anchor::Start => -1.0,
        Anchor::Finish => 1.0,
    }
}

/// Start and end anchor points for `kind`.
pub fn anchors(kind: DependencyKind, pred: &TaskPosition, succ: &TaskPosition) -> (Point, Point) {
    (
        anchor_point(pred, kind.predecessor_anchor()),
        anchor_point(succ, kind.successor_anchor()),
    )
}

/// Geometry of one connector between two placed bars.
pub fn route(kind: DependencyKind, pred: &TaskPosition, succ: &TaskPosition) -> PathGeometry {
    let (from, to) = anchors(kind, pred, succ);

    if to.x > from.x + DIRECT_THRESHOLD {
        if (to.y - from.y).abs() <= STRAIGHT_TOLERANCE {
            return PathGeometry::Straight { from, to };
        }
        let mid_x = from.x + (to.x - from.x) / 2.0;
        return PathGeometry::Curve {
            from,
            ctrl1: Point::new(mid_x, from.y),
            ctrl2: Point::new(mid_x, to.y),
            to,
        };
    }

    let exit_x = from.x + outward(kind.predecessor_anchor()) * ROUTE_OFFSET;
    let entry_x = to.x + outward(kind.successor_anchor()) * ROUTE_OFFSET;
    let going_down = to.y >= from.y;
    // Lane in the gap between the bars, on the successor's side.
    let lane_y = if going_down {
        let pred_bottom = pred.top + pred.height;
        if (to.y - from.y).abs() <= STRAIGHT_TOLERANCE {
            pred_bottom + pred.height / 2.0
        } else {
            pred_bottom + (succ.top - pred_bottom).max(0.0) / 2.0
        }
    } else {
        let succ_bottom = succ.top + succ.height;
        succ_bottom + (pred.top - succ_bottom).max(0.0) / 2.0
    };

    PathGeometry::Routed {
        points: vec![
            from,
            Point::new(exit_x, from.y),
            Point::new(exit_x, lane_y),
            Point::new(entry_x, lane_y),
            Point::new(entry_x, to.y),
            to,
        ],
    }
}

/// Connectors for every edge whose two tasks both have a position.
pub fn compute_connectors(
    positions: &HashMap<TaskId, TaskPosition>,
    edges: &[DependencyEdge],
) -> Vec<ConnectorPath> {
    edges
        .iter()
        .filter_map(|edge| {
            let pred = positions.get(&edge.predecessor_task_id)?;
            let succ = positions.get(&edge.successor_task_id)?;
            let geometry = route(edge.kind, pred, succ);
            let (_, end) = anchors(edge.kind, pred, succ);
            Some(ConnectorPath {
                edge_id: edge.id,
                geometry,
                end_x: end.x,
                end_y: end.y,
                kind: edge.kind,
                lag_days: edge.lag_days,
                style: ConnectorStyle::for_lag(edge.lag_days),
                label: edge.lag_label(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use DependencyKind::*;

    fn pos(left: f32, right: f32, top: f32, height: f32) -> TaskPosition {
        TaskPosition {
            top,
            left,
            right,
            height,
        }
    }

    fn pred_bar() -> TaskPosition {
        pos(10.0, 50.0, 0.0, 20.0)
    }

    fn succ_bar() -> TaskPosition {
        pos(80.0, 120.0, 40.0, 20.0)
    }

    #[test]
    fn anchor_table() {
        let cases = [
            (FinishToStart, (50.0, 10.0), (80.0, 50.0)),
            (StartToStart, (10.0, 10.0), (80.0, 50.0)),
            (FinishToFinish, (50.0, 10.0), (120.0, 50.0)),
            (StartToFinish, (10.0, 10.0), (120.0, 50.0)),
        ];
        for (kind, start, end) in cases {
            let (from, to) = anchors(kind, &pred_bar(), &succ_bar());
            assert_eq!((from.x, from.y), start, "{:?} start", kind);
            assert_eq!((to.x, to.y), end, "{:?} end", kind);
        }
    }

    #[test]
    fn ahead_and_offset_rows_use_a_curve() {
        let geom = route(FinishToStart, &pred_bar(), &succ_bar());
        assert!(matches!(geom, PathGeometry::Curve { .. }));
        assert_eq!(geom.segment_count(), 1);
    }

    #[test]
    fn same_row_ahead_is_straight() {
        let succ = pos(80.0, 120.0, 2.0, 20.0);
        let geom = route(FinishToStart, &pred_bar(), &succ);
        assert_eq!(
            geom,
            PathGeometry::Straight {
                from: Point::new(50.0, 10.0),
                to: Point::new(80.0, 12.0),
            }
        );
    }

    #[test]
    fn threshold_switches_to_routed() {
        // 50 -> 70 is exactly the threshold: not strictly ahead.
        let succ = pos(70.0, 120.0, 40.0, 20.0);
        let routed = route(FinishToStart, &pred_bar(), &succ);
        assert!(matches!(routed, PathGeometry::Routed { .. }));
        assert_eq!(routed.segment_count(), 5);

        let succ = pos(71.0, 120.0, 40.0, 20.0);
        let direct = route(FinishToStart, &pred_bar(), &succ);
        assert_eq!(direct.segment_count(), 1);
        assert_ne!(routed.segment_count(), direct.segment_count());
    }

    #[test]
    fn routed_path_exits_and_enters_on_anchor_sides() {
        // Successor lies behind the predecessor, one row below.
        let succ = pos(0.0, 30.0, 40.0, 20.0);
        let PathGeometry::Routed { points } = route(FinishToStart, &pred_bar(), &succ) else {
            panic!("expected routed path");
        };
        assert_eq!(points[0], Point::new(50.0, 10.0));
        assert_eq!(points[1], Point::new(62.0, 10.0));
        // Lane halfway through the gap between the bars.
        assert_eq!(points[2], Point::new(62.0, 30.0));
        assert_eq!(points[3], Point::new(-12.0, 30.0));
        assert_eq!(points[4], Point::new(-12.0, 50.0));
        assert_eq!(points[5], Point::new(0.0, 50.0));
        // Orthogonal: every segment is horizontal or vertical.
        for w in points.windows(2) {
            assert!(w[0].x == w[1].x || w[0].y == w[1].y);
        }
    }

    fn routed_points(kind: DependencyKind, succ: &TaskPosition) -> Vec<Point> {
        match route(kind, &pred_bar(), succ) {
            PathGeometry::Routed { points } => points,
            other => panic!("expected routed path, got {:?}", other),
        }
    }

    #[test]
    fn start_to_start_exits_left_and_enters_left() {
        // 10 -> 20 is within the threshold.
        let succ = pos(20.0, 60.0, 40.0, 20.0);
        assert_eq!(
            routed_points(StartToStart, &succ),
            vec![
                Point::new(10.0, 10.0),
                Point::new(-2.0, 10.0),
                Point::new(-2.0, 30.0),
                Point::new(8.0, 30.0),
                Point::new(8.0, 50.0),
                Point::new(20.0, 50.0),
            ]
        );
    }

    #[test]
    fn start_to_finish_exits_left_and_enters_right() {
        let succ = pos(0.0, 25.0, 40.0, 20.0);
        assert_eq!(
            routed_points(StartToFinish, &succ),
            vec![
                Point::new(10.0, 10.0),
                Point::new(-2.0, 10.0),
                Point::new(-2.0, 30.0),
                Point::new(37.0, 30.0),
                Point::new(37.0, 50.0),
                Point::new(25.0, 50.0),
            ]
        );
    }

    #[test]
    fn same_row_behind_runs_below_the_predecessor() {
        let succ = pos(0.0, 30.0, 0.0, 20.0);
        let points = routed_points(FinishToStart, &succ);
        // Lane half a bar height under the predecessor's bottom edge.
        assert_eq!(
            points,
            vec![
                Point::new(50.0, 10.0),
                Point::new(62.0, 10.0),
                Point::new(62.0, 30.0),
                Point::new(-12.0, 30.0),
                Point::new(-12.0, 10.0),
                Point::new(0.0, 10.0),
            ]
        );
        let lane_y = points[2].y;
        assert!(lane_y > succ.top + succ.height);
    }

    #[test]
    fn routed_path_heads_up_when_successor_is_above() {
        let pred = pos(100.0, 150.0, 40.0, 20.0);
        let succ = pos(0.0, 60.0, 0.0, 20.0);
        let PathGeometry::Routed { points } = route(FinishToFinish, &pred, &succ) else {
            panic!("expected routed path");
        };
        // FF enters the successor from its right side.
        assert_eq!(points[4].x, 72.0);
        assert!(points[2].y < points[1].y);
        assert_eq!(points[2].y, 30.0);
    }

    #[test]
    fn connectors_skip_unplaced_tasks_and_style_lag() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let mut positions = HashMap::new();
        positions.insert(a, pred_bar());
        positions.insert(b, succ_bar());
        let edge = |succ, lag_days| DependencyEdge {
            id: Uuid::new_v4(),
            predecessor_task_id: a,
            successor_task_id: succ,
            kind: FinishToStart,
            lag_days,
        };
        let edges = vec![edge(b, 0), edge(b, 3), edge(b, -2), edge(c, 0)];

        let paths = compute_connectors(&positions, &edges);
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0].style, ConnectorStyle::Neutral);
        assert_eq!(paths[0].label, None);
        assert_eq!((paths[0].end_x, paths[0].end_y), (80.0, 50.0));
        assert_eq!(paths[1].style, ConnectorStyle::Lag);
        assert!(!paths[1].style.is_dashed());
        assert_eq!(paths[1].label.as_deref(), Some("+3g"));
        assert_eq!(paths[2].style, ConnectorStyle::Lead);
        assert!(paths[2].style.is_dashed() && paths[2].style.is_warning());
        assert_eq!(paths[2].label.as_deref(), Some("-2g"));
    }

    #[test]
    fn svg_output() {
        let geom = PathGeometry::Straight {
            from: Point::new(1.0, 2.0),
            to: Point::new(3.0, 2.0),
        };
        assert_eq!(geom.to_svg(), "M 1 2 L 3 2");
    }
}
