/// Horizontal zoom of the Gantt chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineViewport {
    /// Pixels per day (controls zoom level).
    pub pixels_per_day: f32,
}

pub const MIN_PIXELS_PER_DAY: f32 = 4.0;
pub const MAX_PIXELS_PER_DAY: f32 = 80.0;

impl Default for TimelineViewport {
    fn default() -> Self {
        Self::new(18.0)
    }
}

impl TimelineViewport {
    pub fn new(pixels_per_day: f32) -> Self {
        Self {
            pixels_per_day: pixels_per_day.clamp(MIN_PIXELS_PER_DAY, MAX_PIXELS_PER_DAY),
        }
    }

    /// Width of a chart spanning `total_days`, never narrower than `available`.
    pub fn chart_width(&self, total_days: i64, available: f32) -> f32 {
        (total_days.max(1) as f32 * self.pixels_per_day).max(available)
    }

    /// Zoom in (increase pixels per day).
    pub fn zoom_in(&mut self) {
        self.pixels_per_day = (self.pixels_per_day * 1.2).min(MAX_PIXELS_PER_DAY);
    }

    /// Zoom out (decrease pixels per day).
    pub fn zoom_out(&mut self) {
        self.pixels_per_day = (self.pixels_per_day / 1.2).max(MIN_PIXELS_PER_DAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut vp = TimelineViewport::new(70.0);
        vp.zoom_in();
        vp.zoom_in();
        assert_eq!(vp.pixels_per_day, MAX_PIXELS_PER_DAY);

        let mut vp = TimelineViewport::new(1.0);
        assert_eq!(vp.pixels_per_day, MIN_PIXELS_PER_DAY);
        vp.zoom_out();
        assert_eq!(vp.pixels_per_day, MIN_PIXELS_PER_DAY);
    }

    #[test]
    fn chart_fills_available_width() {
        let vp = TimelineViewport::new(10.0);
        assert_eq!(vp.chart_width(30, 100.0), 300.0);
        assert_eq!(vp.chart_width(30, 900.0), 900.0);
    }
}
