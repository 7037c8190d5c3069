//! Pin position calculation.
//!
//! Every sub-pin of every module gets a position in board-local pixels. Groups
//! with explicit normalised coordinates are scaled by the module rectangle;
//! groups without them are laid out automatically on a horizontal line
//! (inputs near the top edge, outputs near the bottom edge) so that every pin
//! can always be drawn and hit-tested.

use crate::config::EditorConfig;
use crate::grid::{BoardMetrics, Layout};
use crate::model::{IoKind, ModuleId, ModuleInstance, PinGroup, PinId};
use crate::registry::{BoardPins, PinEntry};
use crate::transform::Point;

/// Vertical position of auto-placed input pins, as a fraction of module height.
pub const AUTO_INPUT_Y: f32 = 0.12;
/// Vertical position of auto-placed output pins, as a fraction of module height.
pub const AUTO_OUTPUT_Y: f32 = 0.88;
/// Normalised horizontal range used by the auto layout.
pub const AUTO_MIN_X: f32 = 0.15;
pub const AUTO_MAX_X: f32 = 0.85;

/// Evenly spaced normalised slots on a horizontal line.
///
/// A single slot sits at the centre of the range.
pub fn horizontal_pin_slots(count: usize, y: f32, min_x: f32, max_x: f32) -> Vec<Point> {
    match count {
        0 => Vec::new(),
        1 => vec![Point::new((min_x + max_x) / 2.0, y)],
        n => {
            let step = (max_x - min_x) / (n - 1) as f32;
            (0..n).map(|i| Point::new(min_x + i as f32 * step, y)).collect()
        }
    }
}

/// Rectangle of a module in board-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ModuleRect {
    /// Rectangle of a placed module on a board with the given layout.
    pub fn of(module: &ModuleInstance, layout: &Layout, config: &EditorConfig) -> Self {
        let metrics = BoardMetrics::new(layout, config);
        let (x, y) = metrics.module_origin(module.x, module.height, config);
        Self {
            x,
            y,
            width: config.module_pixel_width(module.width),
            height: module.height,
        }
    }
}

/// Pin positions of one module.
///
/// `inputs[group][pin]` and `outputs[group][pin]` hold board-local positions;
/// `entries` is the same data flattened with identifiers and labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModulePins {
    pub inputs: Vec<Vec<Point>>,
    pub outputs: Vec<Vec<Point>>,
    pub entries: Vec<PinEntry>,
}

impl ModulePins {
    pub fn positions(&self, io: IoKind) -> &[Vec<Point>] {
        match io {
            IoKind::Input => &self.inputs,
            IoKind::Output => &self.outputs,
        }
    }

    pub fn position(&self, pin: &PinId) -> Option<Point> {
        self.positions(pin.io).get(pin.group)?.get(pin.pin).copied()
    }
}

/// Compute every pin position of a module placed at `rect`.
pub fn calculate_module_pins(
    module_id: &ModuleId,
    inputs: &[PinGroup],
    outputs: &[PinGroup],
    rect: ModuleRect,
) -> ModulePins {
    let mut entries = Vec::new();
    let inputs = layout_groups(module_id, IoKind::Input, inputs, rect, &mut entries);
    let outputs = layout_groups(module_id, IoKind::Output, outputs, rect, &mut entries);
    ModulePins { inputs, outputs, entries }
}

fn layout_groups(
    module_id: &ModuleId,
    io: IoKind,
    groups: &[PinGroup],
    rect: ModuleRect,
    entries: &mut Vec<PinEntry>,
) -> Vec<Vec<Point>> {
    let (auto_y, default_y) = match io {
        IoKind::Input => (AUTO_INPUT_Y, 0.0),
        IoKind::Output => (AUTO_OUTPUT_Y, 1.0),
    };
    // One slot per group; used only by groups without explicit geometry.
    let slots = horizontal_pin_slots(groups.len(), auto_y, AUTO_MIN_X, AUTO_MAX_X);

    groups
        .iter()
        .enumerate()
        .map(|(group_index, group)| {
            let normalised: Vec<Point> = match group.explicit_pins() {
                Some(pins) => pins
                    .iter()
                    .map(|p| Point::new(p.x.unwrap_or(0.5), p.y.unwrap_or(default_y)))
                    .collect(),
                None => vec![slots[group_index]],
            };

            normalised
                .into_iter()
                .enumerate()
                .map(|(pin_index, n)| {
                    let position = Point::new(rect.x + n.x * rect.width, rect.y + n.y * rect.height);
                    entries.push(PinEntry {
                        id: PinId::new(module_id.clone(), io, group_index, pin_index),
                        position,
                        label: group.title.clone(),
                    });
                    position
                })
                .collect()
        })
        .collect()
}

/// Compute the flat pin table of one board.
pub fn board_pins<'a, I>(layout: &Layout, modules: I, config: &EditorConfig) -> BoardPins
where
    I: IntoIterator<Item = &'a ModuleInstance>,
{
    let entries = modules
        .into_iter()
        .flat_map(|module| {
            let rect = ModuleRect::of(module, layout, config);
            calculate_module_pins(&module.id, &module.inputs, &module.outputs, rect).entries
        })
        .collect();
    BoardPins::new(entries)
}
