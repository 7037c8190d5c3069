//! Placement validation for modules dragged over a breadboard.

use crate::config::EditorConfig;
use crate::grid::{Cell, Layout};
use crate::model::{BoardId, ModuleId, ModuleInstance};

/// Column offsets (within a module's footprint) that carry a leg.
///
/// Without a pattern, or with a pattern containing no marker, the module has
/// legs at its first and last column only.
pub fn leg_offsets(pattern: Option<&str>, width: u32, marker: char) -> Vec<u32> {
    let from_pattern: Vec<u32> = pattern
        .map(|p| {
            p.chars()
                .enumerate()
                .filter(|&(_, ch)| ch == marker)
                .map(|(i, _)| i as u32)
                .collect()
        })
        .unwrap_or_default();

    if !from_pattern.is_empty() {
        return from_pattern;
    }
    let last = width.max(1) - 1;
    if last == 0 {
        vec![0]
    } else {
        vec![0, last]
    }
}

/// What is being placed: a new module or an existing one being moved.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub width: u32,
    pub legs_pattern: Option<&'a str>,
    /// Module excluded from the overlap check (the one being dragged).
    pub moving: Option<&'a ModuleId>,
}

impl<'a> Candidate<'a> {
    pub fn new(width: u32, legs_pattern: Option<&'a str>) -> Self {
        Self {
            width: width.max(1),
            legs_pattern,
            moving: None,
        }
    }

    /// Candidate for moving an already placed module.
    pub fn moving(module: &'a ModuleInstance) -> Self {
        Self {
            width: module.width.max(1),
            legs_pattern: module.legs_pattern.as_deref(),
            moving: Some(&module.id),
        }
    }
}

/// A resolved placement, valid or not. Rendered as the drag preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPreview {
    pub board: BoardId,
    /// Resolved leftmost column.
    pub x: i32,
    pub width: u32,
    pub valid: bool,
    pub legs: Vec<u32>,
}

/// Outcome of validating a pointer position.
///
/// `None` means no preview at all (layout unknown, pointer off every board),
/// which is distinct from an invalid preview.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    None,
    Preview(PlacementPreview),
}

impl Placement {
    pub fn preview(&self) -> Option<&PlacementPreview> {
        match self {
            Placement::None => None,
            Placement::Preview(p) => Some(p),
        }
    }

    /// The preview, only if it may be dropped.
    pub fn valid(&self) -> Option<&PlacementPreview> {
        self.preview().filter(|p| p.valid)
    }
}

/// Leftmost column that centres a `width`-wide footprint under `grid_x`,
/// clamped to the board.
///
/// `grid_x` is the pointer position relative to the grid's left edge.
pub fn centered_column(grid_x: f32, width: u32, columns: usize, pitch: f32) -> i32 {
    let raw = ((grid_x - width as f32 * pitch / 2.0) / pitch).floor() as i32;
    let max = columns as i32 - width as i32;
    raw.min(max).max(0)
}

/// Validate a candidate at a fixed column.
pub fn validate_at_column<'a, I>(
    board: &BoardId,
    layout: &Layout,
    others: I,
    candidate: &Candidate<'_>,
    x: i32,
    config: &EditorConfig,
) -> PlacementPreview
where
    I: IntoIterator<Item = &'a ModuleInstance>,
{
    let width = candidate.width;
    let legs = leg_offsets(candidate.legs_pattern, width, config.leg_marker);
    // Spans in i64: saved or dragged columns may sit anywhere in i32.
    let start = i64::from(x);
    let end = start + i64::from(width);

    let in_bounds = start >= 0 && end <= layout.columns() as i64;
    let overlaps = others
        .into_iter()
        .filter(|m| &m.board_id == board && Some(&m.id) != candidate.moving)
        .any(|m| start < i64::from(m.x) + i64::from(m.width) && i64::from(m.x) < end);
    let legs_ok = layout.pin_rows(config.pin_row_side).iter().all(|&row| {
        legs.iter().all(|&offset| {
            i32::try_from(start + i64::from(offset))
                .is_ok_and(|col| layout.cell(row, col) == Some(Cell::PowerPin))
        })
    });

    PlacementPreview {
        board: board.clone(),
        x,
        width,
        valid: in_bounds && !overlaps && legs_ok,
        legs,
    }
}

/// Validate a candidate under a pointer given in board-local coordinates.
///
/// `layout` is `None` while the board's layout is still unknown; `local` is
/// `None` when the pointer could not be resolved on this board.
pub fn validate_at_pointer<'a, I>(
    board: &BoardId,
    layout: Option<&Layout>,
    others: I,
    candidate: &Candidate<'_>,
    local_x: Option<f32>,
    config: &EditorConfig,
) -> Placement
where
    I: IntoIterator<Item = &'a ModuleInstance>,
{
    let (Some(layout), Some(local_x)) = (layout, local_x) else {
        return Placement::None;
    };
    let grid_x = local_x - config.grid_padding;
    let x = centered_column(grid_x, candidate.width, layout.columns(), config.column_pitch());
    Placement::Preview(validate_at_column(board, layout, others, candidate, x, config))
}

/// First column, scanning left to right, at which the candidate fits.
pub fn leftmost_valid_column<'a, I>(
    board: &BoardId,
    layout: &Layout,
    others: I,
    candidate: &Candidate<'_>,
    config: &EditorConfig,
) -> Option<i32>
where
    I: IntoIterator<Item = &'a ModuleInstance> + Clone,
{
    let last = layout.columns() as i32 - candidate.width as i32;
    (0..=last).find(|&x| validate_at_column(board, layout, others.clone(), candidate, x, config).valid)
}
