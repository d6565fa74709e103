//! Viewport fitting and interactive zoom.

use serde::Serialize;

use super::types::{LayoutConfig, Position, TableBox, Viewport};

/// Zoom and scroll offsets that bring the whole diagram into view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportFit {
    pub zoom: f64,
    pub zoom_percent: u32,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// Bounding box over all boxes as (min_x, min_y, max_x, max_y).
pub fn bounds(boxes: &[TableBox]) -> Option<(f64, f64, f64, f64)> {
    if boxes.is_empty() {
        return None;
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for b in boxes {
        min_x = min_x.min(b.x);
        min_y = min_y.min(b.y);
        max_x = max_x.max(b.right());
        max_y = max_y.max(b.bottom());
    }

    Some((min_x, min_y, max_x, max_y))
}

/// Round a zoom factor to the nearest step, clamped to the configured percent bounds.
pub fn round_zoom_percent(zoom: f64, config: &LayoutConfig) -> u32 {
    let step = f64::from(config.zoom_step_percent);
    let min = f64::from(config.min_zoom_percent);
    let max = f64::from(config.max_zoom_percent);

    if !zoom.is_finite() {
        return if zoom > 0.0 {
            config.max_zoom_percent
        } else {
            config.min_zoom_percent
        };
    }

    let rounded = (zoom * 100.0 / step).round() * step;
    rounded.clamp(min, max) as u32
}

/// Compute the zoom that fits every box, and the scroll offsets that centre them.
///
/// Returns `None` when there is nothing to fit.
pub fn fit_viewport(boxes: &[TableBox], viewport: Viewport, config: &LayoutConfig) -> Option<ViewportFit> {
    let (min_x, min_y, max_x, max_y) = bounds(boxes)?;
    let content_width = max_x - min_x;
    let content_height = max_y - min_y;
    let padding = config.fit_padding;

    let ratio = |available: f64, extent: f64| {
        if extent > 0.0 {
            available / extent
        } else {
            f64::INFINITY
        }
    };
    let zoom_x = ratio(viewport.width - padding * 2.0, content_width);
    let zoom_y = ratio(viewport.height - padding * 2.0, content_height);

    let min_zoom = f64::from(config.min_zoom_percent) / 100.0;
    let max_zoom = f64::from(config.max_zoom_percent) / 100.0;
    let target = zoom_x.min(zoom_y).clamp(min_zoom, max_zoom);

    let zoom_percent = round_zoom_percent(target, config);
    let zoom = f64::from(zoom_percent) / 100.0;

    let scroll_x = (min_x * zoom - (viewport.width - content_width * zoom) / 2.0).max(0.0);
    let scroll_y = (min_y * zoom - (viewport.height - content_height * zoom) / 2.0).max(0.0);

    Some(ViewportFit {
        zoom,
        zoom_percent,
        scroll_x,
        scroll_y,
    })
}

/// Current zoom of an interactive view, kept on the configured percent grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomState {
    percent: u32,
    min_percent: u32,
    max_percent: u32,
    step_percent: u32,
}

impl ZoomState {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            percent: 100u32.clamp(config.min_zoom_percent, config.max_zoom_percent),
            min_percent: config.min_zoom_percent,
            max_percent: config.max_zoom_percent,
            step_percent: config.zoom_step_percent,
        }
    }

    pub fn percent(&self) -> u32 {
        self.percent
    }

    pub fn zoom(&self) -> f64 {
        f64::from(self.percent) / 100.0
    }

    pub fn can_zoom_in(&self) -> bool {
        self.percent < self.max_percent
    }

    pub fn can_zoom_out(&self) -> bool {
        self.percent > self.min_percent
    }

    fn snap(&self, percent: i64) -> u32 {
        let step = i64::from(self.step_percent);
        let snapped = ((percent as f64 / step as f64).round() as i64) * step;
        snapped.clamp(i64::from(self.min_percent), i64::from(self.max_percent)) as u32
    }

    pub fn zoom_in(&mut self) -> u32 {
        if self.can_zoom_in() {
            self.percent = self.snap(i64::from(self.percent) + i64::from(self.step_percent));
        }
        self.percent
    }

    pub fn zoom_out(&mut self) -> u32 {
        if self.can_zoom_out() {
            self.percent = self.snap(i64::from(self.percent) - i64::from(self.step_percent));
        }
        self.percent
    }

    pub fn reset(&mut self) -> u32 {
        self.percent = 100u32.clamp(self.min_percent, self.max_percent);
        self.percent
    }

    /// Set from a slider value; clamped but not snapped.
    pub fn set_percent(&mut self, percent: u32) -> u32 {
        self.percent = percent.clamp(self.min_percent, self.max_percent);
        self.percent
    }

    /// Two-finger pinch. `scale` is the current finger distance over the distance at the start
    /// of the gesture; the result is clamped but not snapped to the step.
    pub fn pinch(&mut self, initial_percent: u32, scale: f64) -> u32 {
        if !scale.is_finite() || scale <= 0.0 {
            return self.percent;
        }
        let target = (f64::from(initial_percent) * scale).round();
        self.percent =
            target.clamp(f64::from(self.min_percent), f64::from(self.max_percent)) as u32;
        self.percent
    }

    pub fn apply_fit(&mut self, fit: &ViewportFit) {
        self.percent = fit.zoom_percent;
    }

    /// Ctrl+wheel zoom around the cursor. Returns the scroll offset that keeps the point under
    /// `mouse` (viewport coordinates) fixed, or `None` when the zoom did not change.
    pub fn wheel(&mut self, delta_y: f64, mouse: Position, scroll: Position) -> Option<Position> {
        let step = i64::from(self.step_percent);
        let delta = if delta_y > 0.0 { -step } else { step };
        let next = self.snap(i64::from(self.percent) + delta);
        if next == self.percent {
            return None;
        }

        let ratio = f64::from(next) / f64::from(self.percent);
        self.percent = next;
        Some(Position {
            x: scroll.x * ratio + mouse.x * (ratio - 1.0),
            y: scroll.y * ratio + mouse.y * (ratio - 1.0),
        })
    }
}
