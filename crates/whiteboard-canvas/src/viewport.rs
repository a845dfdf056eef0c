use serde::{Deserialize, Serialize};
use whiteboard_graph::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub zoom_min: f32,
    pub zoom_max: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_min: 0.5,
            zoom_max: 2.0,
        }
    }
}

/// Pan (screen pixels) and zoom factor, read by the controller and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub zoom: f32,
    pub pan: Point,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::ORIGIN,
        }
    }
}

impl ViewportState {
    pub fn screen_to_graph(&self, screen: Point) -> Point {
        (screen - self.pan) / self.zoom
    }

    pub fn graph_to_screen(&self, graph: Point) -> Point {
        graph * self.zoom + self.pan
    }
}

/// Screen/graph transform. Zoom always stays inside the configured bounds;
/// requests outside them are clamped, never reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    state: ViewportState,
    zoom_min: f32,
    zoom_max: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        let zoom_min = config.zoom_min.min(config.zoom_max);
        let zoom_max = config.zoom_min.max(config.zoom_max);
        Self {
            state: ViewportState {
                zoom: 1.0f32.clamp(zoom_min, zoom_max),
                pan: Point::ORIGIN,
            },
            zoom_min,
            zoom_max,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn zoom(&self) -> f32 {
        self.state.zoom
    }

    pub fn pan(&self) -> Point {
        self.state.pan
    }

    pub fn screen_to_graph(&self, screen: Point) -> Point {
        self.state.screen_to_graph(screen)
    }

    pub fn graph_to_screen(&self, graph: Point) -> Point {
        self.state.graph_to_screen(graph)
    }

    /// Multiplies the zoom by `factor` while keeping the graph point under
    /// `anchor` fixed on screen. Returns whether anything changed. Factors
    /// that overflow to infinity clamp like any other out-of-range request.
    pub fn zoom_by(&mut self, factor: f32, anchor: Point) -> bool {
        if factor.is_nan() || factor <= 0.0 {
            return false;
        }
        self.zoom_to(self.state.zoom * factor, anchor)
    }

    pub fn zoom_to(&mut self, zoom: f32, anchor: Point) -> bool {
        if zoom.is_nan() {
            return false;
        }
        let next = zoom.clamp(self.zoom_min, self.zoom_max);
        if next == self.state.zoom {
            return false;
        }
        let fixed = self.screen_to_graph(anchor);
        self.state.zoom = next;
        self.state.pan = anchor - fixed * next;
        true
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.state.pan = self.state.pan + delta;
    }

    /// Centres `bounds` in a `screen` of the given size, zooming as far as
    /// the limits allow.
    pub fn zoom_to_fit(&mut self, bounds: Rect, screen: Size, padding: f32) {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return;
        }
        let available_w = (screen.width - padding * 2.0).max(1.0);
        let available_h = (screen.height - padding * 2.0).max(1.0);
        let scale = (available_w / bounds.width)
            .min(available_h / bounds.height)
            .clamp(self.zoom_min, self.zoom_max);
        let screen_center = Point::new(screen.width / 2.0, screen.height / 2.0);
        self.state.zoom = scale;
        self.state.pan = screen_center - bounds.center() * scale;
    }

    pub fn reset(&mut self) {
        self.state = ViewportState {
            zoom: 1.0f32.clamp(self.zoom_min, self.zoom_max),
            pan: Point::ORIGIN,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_deltas_are_idempotent() {
        let mut viewport = Viewport::default();
        viewport.pan_by(Point::new(30.0, -10.0));
        let before = viewport.state();
        assert!(!viewport.zoom_by(1.0, Point::new(5.0, 5.0)));
        viewport.pan_by(Point::ORIGIN);
        assert_eq!(viewport.state(), before);
    }

    #[test]
    fn nonsense_factors_are_ignored() {
        let mut viewport = Viewport::default();
        assert!(!viewport.zoom_by(0.0, Point::ORIGIN));
        assert!(!viewport.zoom_by(-2.0, Point::ORIGIN));
        assert!(!viewport.zoom_by(f32::NAN, Point::ORIGIN));
        assert_eq!(viewport.zoom(), 1.0);
    }

    #[test]
    fn inverted_bounds_are_normalised() {
        let viewport = Viewport::new(ViewportConfig {
            zoom_min: 3.0,
            zoom_max: 1.5,
        });
        assert_eq!(viewport.zoom(), 1.5);
    }
}
