//! Breadboard layout grids.
//!
//! A [`Layout`] is an immutable grid of cells loaded per board type. Rows are
//! given as equal-length strings:
//!
//! * `P` - power-bus pin a module leg can plug into
//! * `M` - generic area
//! * `_` - gap (bus break)

use crate::config::{EditorConfig, PinRowSide};
use crate::error::LayoutError;
use crate::placement::PlacementPreview;

/// One cell of a breadboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    PowerPin,
    Area,
    Gap,
}

impl Cell {
    fn from_char(ch: char, power_pin_marker: char) -> Option<Self> {
        match ch {
            c if c == power_pin_marker => Some(Cell::PowerPin),
            'M' => Some(Cell::Area),
            '_' => Some(Cell::Gap),
            _ => None,
        }
    }
}

/// Immutable rows x columns grid of a board type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    cells: Vec<Vec<Cell>>,
    columns: usize,
}

impl Layout {
    /// Parse layout rows using the default `P` power-pin marker.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, LayoutError> {
        Self::parse_with_marker(rows, 'P')
    }

    pub fn parse_with_marker<S: AsRef<str>>(rows: &[S], power_pin_marker: char) -> Result<Self, LayoutError> {
        let first = rows.first().ok_or(LayoutError::Empty)?;
        let columns = first.as_ref().chars().count();
        if columns == 0 {
            return Err(LayoutError::Empty);
        }

        let mut cells = Vec::with_capacity(rows.len());
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != columns {
                return Err(LayoutError::RaggedRow { row, expected: columns, found });
            }
            let parsed = line
                .chars()
                .enumerate()
                .map(|(col, ch)| Cell::from_char(ch, power_pin_marker).ok_or(LayoutError::UnknownCell { ch, row, col }))
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(parsed);
        }

        Ok(Self { cells, columns })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Cell at (row, column); `None` when out of range (negative columns included).
    pub fn cell(&self, row: usize, col: i32) -> Option<Cell> {
        let col = usize::try_from(col).ok()?;
        self.cells.get(row)?.get(col).copied()
    }

    /// The two rows module legs plug into on `side`.
    pub fn pin_rows(&self, side: PinRowSide) -> [usize; 2] {
        let rows = self.rows();
        match side {
            PinRowSide::Top => [0, 1.min(rows.saturating_sub(1))],
            PinRowSide::Bottom => [rows.saturating_sub(2), rows.saturating_sub(1)],
        }
    }

    /// True for the top two and bottom two rows.
    pub fn is_pin_row(&self, row: usize) -> bool {
        let rows = self.rows();
        row < 2 || row + 2 >= rows
    }
}

/// Pixel metrics of a board surface in board-local (SVG user space) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardMetrics {
    pub rows: usize,
    pub columns: usize,
    pub grid_width: f32,
    pub grid_height: f32,
    pub padding: f32,
}

impl BoardMetrics {
    pub fn new(layout: &Layout, config: &EditorConfig) -> Self {
        let columns = layout.columns() as f32;
        Self {
            rows: layout.rows(),
            columns: layout.columns(),
            grid_width: columns * config.cell_size + (columns - 1.0).max(0.0) * config.cell_margin,
            grid_height: config.grid_pixel_height(layout.rows()),
            padding: config.grid_padding,
        }
    }

    /// Size of the surface's view box, padding included.
    pub fn surface_size(&self) -> (f32, f32) {
        (self.grid_width + 2.0 * self.padding, self.grid_height + 2.0 * self.padding)
    }

    /// Top-left of a module's rectangle. Modules are bottom-aligned with the grid.
    pub fn module_origin(&self, column: i32, module_height: f32, config: &EditorConfig) -> (f32, f32) {
        (
            self.padding + column as f32 * config.column_pitch(),
            self.padding + self.grid_height - module_height,
        )
    }

    /// Top-left of a cell's rectangle.
    pub fn cell_origin(&self, row: usize, col: usize, config: &EditorConfig) -> (f32, f32) {
        (
            self.padding + col as f32 * config.column_pitch(),
            self.padding + row as f32 * (config.cell_height() + config.cell_margin),
        )
    }
}

/// How a cell should be highlighted while a placement preview is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellHighlight {
    None,
    /// A leg lands on a power-bus pin.
    Leg { valid: bool },
    /// A leg lands on a gap.
    LegOnGap { valid: bool },
    /// Inside the footprint on a pin row, no leg.
    Footprint { valid: bool },
    /// Inside the footprint on a pin row, over a gap.
    FootprintGap { valid: bool },
}

/// Classify a cell for rendering the placement preview.
pub fn cell_highlight(layout: &Layout, preview: &PlacementPreview, row: usize, col: usize) -> CellHighlight {
    if !layout.is_pin_row(row) {
        return CellHighlight::None;
    }
    let Some(cell) = layout.cell(row, col as i32) else {
        return CellHighlight::None;
    };
    let valid = preview.valid;
    let offset = col as i64 - i64::from(preview.x);
    let is_gap = cell == Cell::Gap;

    if offset >= 0 && preview.legs.contains(&(offset as u32)) {
        if is_gap {
            CellHighlight::LegOnGap { valid }
        } else {
            CellHighlight::Leg { valid }
        }
    } else if offset >= 0 && offset < i64::from(preview.width) {
        if is_gap {
            CellHighlight::FootprintGap { valid }
        } else {
            CellHighlight::Footprint { valid }
        }
    } else {
        CellHighlight::None
    }
}
