use glam::DVec2;
use std::f64::consts::{FRAC_PI_2, PI};

/// Logical map canvas the projection targets; the viewport scales it to the terminal
pub const MAP_WIDTH: f64 = 800.0;
pub const MAP_HEIGHT: f64 = 600.0;

const EPSILON: f64 = 1e-6;

/// Geographic bounding box in degrees: [[min_lon, min_lat], [max_lon, max_lat]]
pub type GeoBounds = [[f64; 2]; 2];

/// Parameters for the conic conformal projection of the map
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionState {
    /// Geographic center [lon, lat] in degrees
    pub center: [f64; 2],
    pub scale: f64,
    /// Map-space position of the center
    pub translate: [f64; 2],
    /// Standard parallels in degrees
    pub parallels: [f64; 2],
}

impl ProjectionState {
    /// The whole-of-Europe view
    pub fn original() -> Self {
        Self {
            center: [5.0, 50.0],
            scale: 1500.0,
            translate: [MAP_WIDTH / 2.0, MAP_HEIGHT / 2.0 - 50.0],
            parallels: [43.0, 62.0],
        }
    }

    /// Frame a country's bounding box, keeping the original parallels
    pub fn fit_bounds(bounds: GeoBounds) -> Self {
        let original = Self::original();
        let [[x0, y0], [x1, y1]] = bounds;
        let span_lon = (x1 - x0).max(EPSILON);
        let span_lat = (y1 - y0).max(EPSILON);
        let scale = (original.scale * (360.0 / span_lon) * 0.1)
            .min(original.scale * (180.0 / span_lat) * 0.125);

        Self {
            center: [(x0 + x1) / 2.0, (y0 + y1) / 2.0],
            scale,
            translate: [MAP_WIDTH / 2.0, MAP_HEIGHT / 2.0],
            parallels: original.parallels,
        }
    }
}

impl Default for ProjectionState {
    fn default() -> Self {
        Self::original()
    }
}

/// Lambert conformal conic in raw (unit-sphere, radians) form
#[derive(Clone, Copy, Debug)]
enum ConicRaw {
    Conic { n: f64, f: f64 },
    /// Parallels symmetric about the equator degenerate to Mercator
    Mercator,
}

fn tany(phi: f64) -> f64 {
    ((FRAC_PI_2 + phi) / 2.0).tan()
}

impl ConicRaw {
    fn new(phi0: f64, phi1: f64) -> Self {
        let cy0 = phi0.cos();
        let n = if (phi0 - phi1).abs() < EPSILON {
            phi0.sin()
        } else {
            (cy0 / phi1.cos()).ln() / (tany(phi1) / tany(phi0)).ln()
        };
        if n.abs() < EPSILON {
            return ConicRaw::Mercator;
        }
        let f = cy0 * tany(phi0).powf(n) / n;
        ConicRaw::Conic { n, f }
    }

    fn forward(self, lambda: f64, phi: f64) -> (f64, f64) {
        match self {
            ConicRaw::Mercator => (lambda, tany(phi.clamp(-FRAC_PI_2 + EPSILON, FRAC_PI_2 - EPSILON)).ln()),
            ConicRaw::Conic { n, f } => {
                let phi = if f > 0.0 {
                    phi.max(-FRAC_PI_2 + EPSILON)
                } else {
                    phi.min(FRAC_PI_2 - EPSILON)
                };
                let r = f / tany(phi).powf(n);
                (r * (n * lambda).sin(), f - r * (n * lambda).cos())
            }
        }
    }

    fn invert(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            ConicRaw::Mercator => (x, 2.0 * y.exp().atan() - FRAC_PI_2),
            ConicRaw::Conic { n, f } => {
                let fy = f - y;
                let r = n.signum() * (x * x + fy * fy).sqrt();
                let mut lambda = x.atan2(fy.abs()) * fy.signum();
                if fy * n < 0.0 {
                    lambda -= PI * x.signum() * fy.signum();
                }
                (lambda / n, 2.0 * (f / r).powf(1.0 / n).atan() - FRAC_PI_2)
            }
        }
    }
}

/// A ready-to-use projection from (lon, lat) degrees to map space
#[derive(Clone, Debug)]
pub struct Projection {
    state: ProjectionState,
    raw: ConicRaw,
    /// Raw projected center
    origin: (f64, f64),
}

impl Projection {
    pub fn new(state: ProjectionState) -> Self {
        let raw = ConicRaw::new(state.parallels[0].to_radians(), state.parallels[1].to_radians());
        let origin = raw.forward(state.center[0].to_radians(), state.center[1].to_radians());
        Self { state, raw, origin }
    }

    /// Project a geographic coordinate (lon, lat) to map space
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let (x, y) = self.raw.forward(lon.to_radians(), lat.to_radians());
        let k = self.state.scale;
        DVec2::new(
            self.state.translate[0] + k * (x - self.origin.0),
            self.state.translate[1] - k * (y - self.origin.1),
        )
    }

    /// Map-space point back to (lon, lat) degrees
    pub fn invert(&self, point: DVec2) -> (f64, f64) {
        let k = self.state.scale;
        let x = (point.x - self.state.translate[0]) / k + self.origin.0;
        let y = self.origin.1 - (point.y - self.state.translate[1]) / k;
        let (lambda, phi) = self.raw.invert(x, y);
        (lambda.to_degrees(), phi.to_degrees())
    }
}

/// Maps the logical map canvas onto a Braille pixel canvas, preserving aspect
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Braille pixels per map unit
    pub fn scale(&self) -> f64 {
        (self.width as f64 / MAP_WIDTH).min(self.height as f64 / MAP_HEIGHT)
    }

    fn offset(&self) -> DVec2 {
        let s = self.scale();
        DVec2::new(
            (self.width as f64 - MAP_WIDTH * s) / 2.0,
            (self.height as f64 - MAP_HEIGHT * s) / 2.0,
        )
    }

    /// Map-space point to pixel coordinates
    pub fn to_pixel(&self, point: DVec2) -> (i32, i32) {
        let p = point * self.scale() + self.offset();
        (p.x.round() as i32, p.y.round() as i32)
    }

    /// Pixel coordinates back to map space
    pub fn to_map(&self, px: i32, py: i32) -> DVec2 {
        let s = self.scale();
        if s <= 0.0 {
            return DVec2::ZERO;
        }
        (DVec2::new(px as f64, py as f64) - self.offset()) / s
    }

    /// Map units covered by one pixel
    pub fn map_units_per_pixel(&self) -> f64 {
        let s = self.scale();
        if s > 0.0 {
            1.0 / s
        } else {
            0.0
        }
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_translate() {
        let projection = Projection::new(ProjectionState::original());
        let p = projection.project(5.0, 50.0);
        assert!((p.x - 400.0).abs() < 1e-9);
        assert!((p.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_north_is_up_east_is_right() {
        let projection = Projection::new(ProjectionState::original());
        let center = projection.project(5.0, 50.0);
        assert!(projection.project(5.0, 55.0).y < center.y);
        assert!(projection.project(10.0, 50.0).x > center.x);
    }

    #[test]
    fn test_invert_round_trips() {
        let projection = Projection::new(ProjectionState::original());
        let (lon, lat) = projection.invert(projection.project(2.35, 48.86));
        assert!((lon - 2.35).abs() < 1e-6);
        assert!((lat - 48.86).abs() < 1e-6);
    }

    #[test]
    fn test_fit_bounds_centers_box() {
        let state = ProjectionState::fit_bounds([[0.0, 40.0], [10.0, 50.0]]);
        assert_eq!(state.center, [5.0, 45.0]);
        assert_eq!(state.translate, [400.0, 300.0]);
        // min(1500 * 36 * 0.1, 1500 * 18 * 0.125) = min(5400, 3375)
        assert!((state.scale - 3375.0).abs() < 1e-9);
        assert_eq!(state.parallels, [43.0, 62.0]);
    }

    #[test]
    fn test_viewport_letterboxes() {
        let vp = Viewport::new(160, 60);
        // height-limited: 60 / 600 = 0.1
        assert!((vp.scale() - 0.1).abs() < 1e-12);
        assert_eq!(vp.to_pixel(DVec2::new(400.0, 300.0)), (80, 30));
        let back = vp.to_map(80, 30);
        assert!((back - DVec2::new(400.0, 300.0)).length() < 1e-9);
    }
}
