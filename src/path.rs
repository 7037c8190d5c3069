use crate::config::CableStyle;
use crate::transform::Point;

/// cos(45°), the share of the approach distance applied to each axis.
const DIAGONAL: f32 = 0.707;
/// Droop of a long horizontal span as a fraction of its width.
const DROOP_SPAN_RATIO: f32 = 0.3;
/// Share of the droop added to the control points.
const DROOP_WEIGHT: f32 = 0.3;
/// Bend of a vertical or short span as a fraction of its length.
const BEND_SPAN_RATIO: f32 = 0.4;
/// Share of the bend added to the control points.
const BEND_WEIGHT: f32 = 0.4;

/// Generate SVG path command for a cable between two pin centres
///
/// # Returns
/// SVG path command string (e.g., "M 10 20 C 60 80 90 80 140 20")
pub fn generate_cable_path(from: Point, to: Point, style: &CableStyle) -> String {
    CubicBezier::cable(from, to, style).to_svg_path()
}

/// Cubic bezier curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Point, // Start point
    pub p1: Point, // Control point 1
    pub p2: Point, // Control point 2
    pub p3: Point, // End point
}

impl CubicBezier {
    /// The hanging-cable curve between two pins.
    ///
    /// Both ends leave at roughly 45°, pointing towards each other and
    /// downwards. Long near-horizontal spans droop in proportion to their
    /// width (between `droop_floor` and `droop_cap`); everything else bends by
    /// a share of the distance with `bend_floor` as minimum.
    pub fn cable(from: Point, to: Point, style: &CableStyle) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let distance = (dx * dx + dy * dy).sqrt();

        let approach = (distance * style.approach_ratio).min(style.approach_cap);
        let off45 = approach * DIAGONAL;
        let dir = if dx >= 0.0 { 1.0 } else { -1.0 };

        let horizontal = dy.abs() < dx.abs() * style.horizontal_ratio && dx.abs() > style.horizontal_min_span;
        let sag = if horizontal {
            let droop = (dx.abs() * DROOP_SPAN_RATIO).max(style.droop_floor).min(style.droop_cap);
            droop * DROOP_WEIGHT
        } else {
            (distance * BEND_SPAN_RATIO).max(style.bend_floor) * BEND_WEIGHT
        };

        CubicBezier {
            p0: from,
            p1: Point::new(from.x + dir * off45, from.y + off45 + sag),
            p2: Point::new(to.x - dir * off45, to.y + off45 + sag),
            p3: to,
        }
    }

    /// Evaluate the bezier curve at parameter t (0.0 to 1.0)
    pub fn eval(&self, t: f32) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * self.p0.x + 3.0 * mt2 * t * self.p1.x + 3.0 * mt * t2 * self.p2.x + t3 * self.p3.x;
        let y = mt3 * self.p0.y + 3.0 * mt2 * t * self.p1.y + 3.0 * mt * t2 * self.p2.y + t3 * self.p3.y;

        Point::new(x, y)
    }

    /// Derivative at parameter t.
    pub fn tangent(&self, t: f32) -> Point {
        let mt = 1.0 - t;
        let a = 3.0 * mt * mt;
        let b = 6.0 * mt * t;
        let c = 3.0 * t * t;
        Point::new(
            a * (self.p1.x - self.p0.x) + b * (self.p2.x - self.p1.x) + c * (self.p3.x - self.p2.x),
            a * (self.p1.y - self.p0.y) + b * (self.p2.y - self.p1.y) + c * (self.p3.y - self.p2.y),
        )
    }

    pub fn to_svg_path(&self) -> String {
        // M (move to), C (cubic bezier)
        format!(
            "M {} {} C {} {} {} {} {} {}",
            self.p0.x, self.p0.y, self.p1.x, self.p1.y, self.p2.x, self.p2.y, self.p3.x, self.p3.y
        )
    }
}
