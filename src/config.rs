//! Editor configuration.
//!
//! [`EditorConfig`] gathers every geometric constant the editor depends on:
//! breadboard cell metrics, display scale, hit-test radius and cable shape.
//! All fields have defaults, so a host can load a partial JSON document and
//! override only what differs.
//!
//! ```ignore
//! let config = EditorConfig::from_json_str(r#"{ "snap_radius": 24.0 }"#)?;
//! assert_eq!(config.cell_size, 18.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PatchResult;

/// Which pair of layout rows a module's legs plug into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinRowSide {
    /// Rows 0 and 1.
    Top,
    /// Rows `rows - 2` and `rows - 1` (modules are bottom-aligned).
    #[default]
    Bottom,
}

/// Shape parameters for cable curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CableStyle {
    /// Approach distance as a fraction of the endpoint distance.
    pub approach_ratio: f32,
    /// Upper bound of the approach distance.
    pub approach_cap: f32,
    /// `|dy| < |dx| * horizontal_ratio` classifies a span as horizontal.
    pub horizontal_ratio: f32,
    /// Horizontal spans shorter than this use the vertical shape.
    pub horizontal_min_span: f32,
    /// Minimum droop of a long horizontal span.
    pub droop_floor: f32,
    /// Maximum droop of a long horizontal span.
    pub droop_cap: f32,
    /// Minimum bend of a vertical or short span.
    pub bend_floor: f32,
    /// Stroke width reported to the renderer.
    pub line_width: f32,
}

impl Default for CableStyle {
    fn default() -> Self {
        Self {
            approach_ratio: 0.3,
            approach_cap: 80.0,
            horizontal_ratio: 0.3,
            horizontal_min_span: 80.0,
            droop_floor: 80.0,
            droop_cap: 400.0,
            bend_floor: 60.0,
            line_width: 5.0,
        }
    }
}

/// Geometry and interaction constants for the patch editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Cell width in board-local pixels.
    pub cell_size: f32,
    /// Gap between neighbouring cells.
    pub cell_margin: f32,
    /// Padding between the board surface edge and the grid.
    pub grid_padding: f32,
    /// Cell height is `cell_size * vertical_scale`.
    pub vertical_scale: f32,
    /// Board-local to screen scale of a board surface.
    pub display_scale: f32,
    /// Maximum distance at which a pointer snaps to a pin.
    pub snap_radius: f32,
    /// Layout character marking a power-bus pin.
    pub power_pin_marker: char,
    /// Leg-pattern character marking a leg.
    pub leg_marker: char,
    pub pin_row_side: PinRowSide,
    /// Module width used when metadata omits one.
    pub default_unit_width: u32,
    /// Row count for the height fallback when no layout is known.
    pub fallback_rows: usize,
    pub default_knob_value: f32,
    pub cable: CableStyle,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            cell_size: 18.0,
            cell_margin: 2.0,
            grid_padding: 26.0,
            vertical_scale: 1.09,
            display_scale: 0.8,
            snap_radius: 18.0,
            power_pin_marker: 'P',
            leg_marker: 'p',
            pin_row_side: PinRowSide::Bottom,
            default_unit_width: 5,
            fallback_rows: 10,
            default_knob_value: 0.5,
            cable: CableStyle::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON configuration over the defaults.
    pub fn from_json_str(json: &str) -> PatchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Horizontal distance between the left edges of two neighbouring cells.
    pub fn column_pitch(&self) -> f32 {
        self.cell_size + self.cell_margin
    }

    /// Rendered cell height.
    pub fn cell_height(&self) -> f32 {
        self.cell_size * self.vertical_scale
    }

    /// Pixel width of a module spanning `units` columns.
    pub fn module_pixel_width(&self, units: u32) -> f32 {
        let units = units.max(1) as f32;
        units * self.cell_size + (units - 1.0) * self.cell_margin
    }

    /// Pixel height of a grid with `rows` rows.
    pub fn grid_pixel_height(&self, rows: usize) -> f32 {
        let rows = rows as f32;
        rows * self.cell_height() + (rows - 1.0).max(0.0) * self.cell_margin
    }
}
