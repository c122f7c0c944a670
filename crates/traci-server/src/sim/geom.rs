//! Planar polyline helpers used by lane shapes.

/// Point in network coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn distance_2d(&self, o: &Position) -> f64 {
        (self.x - o.x).hypot(self.y - o.y)
    }

    pub fn distance(&self, o: &Position) -> f64 {
        let d2 = self.distance_2d(o);
        d2.hypot(self.z - o.z)
    }
}

/// Projection parameter of `p` onto segment `a`-`b`, unclamped.
fn project(a: &Position, b: &Position, p: &Position) -> Option<f64> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 <= f64::EPSILON {
        return None;
    }
    Some(((p.x - a.x) * dx + (p.y - a.y) * dy) / len2)
}

fn lerp(a: &Position, b: &Position, t: f64) -> Position {
    Position {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
        z: a.z + (b.z - a.z) * t,
    }
}

/// Ordered polyline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape(pub Vec<Position>);

impl Shape {
    pub fn points(&self) -> &[Position] {
        &self.0
    }

    pub fn length_2d(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance_2d(&w[1])).sum()
    }

    /// Point at `offset` along the shape (clamped to both ends).
    pub fn position_at_offset(&self, offset: f64) -> Position {
        let mut seen = 0.0;
        for w in self.0.windows(2) {
            let seg = w[0].distance_2d(&w[1]);
            if seen + seg >= offset && seg > 0.0 {
                return lerp(&w[0], &w[1], ((offset - seen) / seg).max(0.0));
            }
            seen += seg;
        }
        self.0.last().copied().unwrap_or_default()
    }

    /// Heading in degrees of the segment containing `offset`, measured
    /// counter-clockwise from the x axis.
    pub fn rotation_degree_at_offset(&self, offset: f64) -> f64 {
        let mut seen = 0.0;
        let mut last = None;
        for w in self.0.windows(2) {
            let seg = w[0].distance_2d(&w[1]);
            last = Some((w[0], w[1]));
            if seen + seg >= offset {
                break;
            }
            seen += seg;
        }
        match last {
            Some((a, b)) => (b.y - a.y).atan2(b.x - a.x).to_degrees(),
            None => 0.0,
        }
    }

    /// Offset of the nearest perpendicular foot point, or of the nearest inner
    /// corner. `None` if `p` projects onto no segment and there is no corner.
    pub fn nearest_offset_to_point_2d(&self, p: &Position) -> Option<f64> {
        let mut best: Option<(f64, f64)> = None; // (distance, offset)
        let mut seen = 0.0;
        for (i, w) in self.0.windows(2).enumerate() {
            let seg = w[0].distance_2d(&w[1]);
            if let Some(t) = project(&w[0], &w[1], p) {
                if (0.0..=1.0).contains(&t) {
                    let d = p.distance_2d(&lerp(&w[0], &w[1], t));
                    if best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, seen + t * seg));
                    }
                }
            }
            if i > 0 {
                let d = p.distance_2d(&w[0]);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, seen));
                }
            }
            seen += seg;
        }
        best.map(|(_, off)| off)
    }

    /// Minimum distance from `p` to any point of the shape.
    pub fn distance_2d(&self, p: &Position) -> f64 {
        match self.0.as_slice() {
            [] => f64::MAX,
            [only] => only.distance_2d(p),
            pts => pts
                .windows(2)
                .map(|w| {
                    let t = project(&w[0], &w[1], p).unwrap_or(0.0).clamp(0.0, 1.0);
                    p.distance_2d(&lerp(&w[0], &w[1], t))
                })
                .fold(f64::MAX, f64::min),
        }
    }
}

/// Smallest absolute difference between two headings in degrees (0..=180).
pub fn min_angle_diff(a: f64, b: f64) -> f64 {
    let ccw = (b - a).rem_euclid(360.0);
    let cw = (a - b).rem_euclid(360.0);
    ccw.min(cw)
}
