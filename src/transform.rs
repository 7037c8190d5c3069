//! Coordinate spaces and the conversions between them.
//!
//! Three spaces are involved:
//!
//! * **screen** - pointer event coordinates,
//! * **board-local** - a board surface's own user space (grid, modules, pins),
//! * **container** - the shared ancestor all board surfaces are stacked in;
//!   cables between boards are drawn here.
//!
//! Geometry is never scraped from a render tree. The host supplies it through
//! [`SurfaceMeasure`]; every conversion returns `None` when a measurement is
//! missing so that callers show nothing instead of a stale or zero position.

use std::collections::HashMap;

use crate::config::EditorConfig;
use crate::model::BoardId;
use crate::placement::centered_column;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

/// 2D affine transform `[a c e; b d f; 0 0 1]`, mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn scale_translate(scale: f32, tx: f32, ty: f32) -> Self {
        Self { a: scale, b: 0.0, c: 0.0, d: scale, e: tx, f: ty }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        let inv = 1.0 / det;
        if !det.is_finite() || !inv.is_finite() {
            return None;
        }
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Live geometry of the mounted board surfaces.
///
/// Implemented by the host; all methods return `None` when the measurement
/// is currently unavailable (surface not mounted, matrix not obtainable).
pub trait SurfaceMeasure {
    /// Transform from a board's local space to screen space.
    fn screen_ctm(&self, board: &BoardId) -> Option<Affine>;
    /// Screen rectangle of a board surface.
    fn surface_rect(&self, board: &BoardId) -> Option<Rect>;
    /// Screen rectangle of the container all boards are stacked in.
    fn container_rect(&self) -> Option<Rect>;
    /// Board surface under a screen point.
    fn surface_at(&self, screen: Point) -> Option<BoardId>;
}

/// Fixed measurements, for hosts that lay boards out themselves and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSurfaces {
    container: Option<Rect>,
    order: Vec<BoardId>,
    surfaces: HashMap<BoardId, (Rect, Affine)>,
}

impl StaticSurfaces {
    pub fn new(container: Rect) -> Self {
        Self {
            container: Some(container),
            ..Self::default()
        }
    }

    /// A board surface at `rect`, drawn at `scale`.
    pub fn with_board(mut self, board: BoardId, rect: Rect, scale: f32) -> Self {
        self.set_board(board, rect, Affine::scale_translate(scale, rect.x, rect.y));
        self
    }

    pub fn set_board(&mut self, board: BoardId, rect: Rect, ctm: Affine) {
        if !self.surfaces.contains_key(&board) {
            self.order.push(board.clone());
        }
        self.surfaces.insert(board, (rect, ctm));
    }

    pub fn unmount(&mut self, board: &BoardId) {
        self.surfaces.remove(board);
        self.order.retain(|b| b != board);
    }

    pub fn set_container(&mut self, container: Option<Rect>) {
        self.container = container;
    }
}

impl SurfaceMeasure for StaticSurfaces {
    fn screen_ctm(&self, board: &BoardId) -> Option<Affine> {
        self.surfaces.get(board).map(|(_, ctm)| *ctm)
    }

    fn surface_rect(&self, board: &BoardId) -> Option<Rect> {
        self.surfaces.get(board).map(|(rect, _)| *rect)
    }

    fn container_rect(&self) -> Option<Rect> {
        self.container
    }

    fn surface_at(&self, screen: Point) -> Option<BoardId> {
        self.order
            .iter()
            .find(|b| self.surfaces.get(*b).is_some_and(|(rect, _)| rect.contains(screen)))
            .cloned()
    }
}

/// Screen point to a board's local space via the inverse of its screen CTM.
pub fn pointer_to_local<M: SurfaceMeasure + ?Sized>(measure: &M, board: &BoardId, screen: Point) -> Option<Point> {
    Some(measure.screen_ctm(board)?.inverse()?.apply(screen))
}

/// Board-local x to the column a `width`-wide module centred there starts at.
pub fn local_to_column(local_x: f32, width: u32, columns: usize, config: &EditorConfig) -> i32 {
    centered_column(local_x - config.grid_padding, width, columns, config.column_pitch())
}

/// Offset of a board surface inside the container.
pub fn surface_offset<M: SurfaceMeasure + ?Sized>(measure: &M, board: &BoardId) -> Option<Point> {
    let surface = measure.surface_rect(board)?;
    let container = measure.container_rect()?;
    Some(Point::new(surface.x - container.x, surface.y - container.y))
}

/// Board-local pin position to container coordinates.
pub fn local_to_global(local: Point, offset: Point, display_scale: f32) -> Point {
    Point::new(local.x * display_scale + offset.x, local.y * display_scale + offset.y)
}

/// Board-local pin position to container coordinates, measuring the board.
pub fn pin_to_global<M: SurfaceMeasure + ?Sized>(
    measure: &M,
    board: &BoardId,
    local: Point,
    display_scale: f32,
) -> Option<Point> {
    Some(local_to_global(local, surface_offset(measure, board)?, display_scale))
}

/// Screen point to container coordinates.
pub fn pointer_to_container<M: SurfaceMeasure + ?Sized>(measure: &M, screen: Point) -> Option<Point> {
    let container = measure.container_rect()?;
    Some(Point::new(screen.x - container.x, screen.y - container.y))
}
