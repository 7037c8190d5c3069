//! Cable rendering data for the shared cable overlay.
//!
//! This module provides [`CableLayer`], which resolves every pin in the
//! registry to container coordinates and turns committed cables and the
//! pending ghost cable into SVG paths for Slint.
//!
//! # Example
//!
//! ```ignore
//! let mut layer = CableLayer::new(registry.clone(), &config);
//!
//! // Bind once - auto-syncs on every update_paths call
//! let model = Rc::new(VecModel::<CablePath>::default());
//! layer.bind_model(model.clone(), |id, path, color, width| CablePath { id, path, color, width });
//! window.set_cable_paths(ModelRc::from(model));
//!
//! layer.update_paths(&patch.cables, gesture.pending(), &surfaces);
//! window.set_ghost_path(layer.ghost_path().unwrap_or_default().into());
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use slint::{Color, Model, SharedString, VecModel};

use crate::cables::CableSet;
use crate::config::{CableStyle, EditorConfig};
use crate::gesture::PendingCable;
use crate::model::{CableId, PinId};
use crate::path::generate_cable_path;
use crate::registry::PinRegistryHandle;
use crate::transform::{local_to_global, surface_offset, Point, SurfaceMeasure};

/// Stroke colour of the ghost cable.
pub const GHOST_COLOR: &str = "#ff2fd6";

/// Internal trait for auto-syncing to Slint models.
trait ModelSyncer {
    fn sync(&self, paths: &[CablePathData]);
}

/// Concrete implementation of ModelSyncer for a specific path type.
struct ConcreteModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(SharedString, SharedString, Color, f32) -> P,
{
    fn sync(&self, paths: &[CablePathData]) {
        // Update existing rows or add new ones
        for (i, path) in paths.iter().enumerate() {
            let item = (self.constructor)(
                SharedString::from(path.id.as_str()),
                SharedString::from(path.path.as_str()),
                path.color,
                path.line_width,
            );
            if i < self.model.row_count() {
                self.model.set_row_data(i, item);
            } else {
                self.model.push(item);
            }
        }
        // Remove excess rows
        while self.model.row_count() > paths.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

/// One committed cable, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct CablePathData {
    pub id: CableId,
    pub path: String,
    pub color: Color,
    pub line_width: f32,
}

/// Builds the cable overlay from the pin registry.
pub struct CableLayer {
    registry: PinRegistryHandle,
    style: CableStyle,
    display_scale: f32,
    paths: Vec<CablePathData>,
    ghost: Option<String>,
    syncer: Option<Box<dyn ModelSyncer>>,
}

impl CableLayer {
    pub fn new(registry: PinRegistryHandle, config: &EditorConfig) -> Self {
        Self {
            registry,
            style: config.cable,
            display_scale: config.display_scale,
            paths: Vec::new(),
            ghost: None,
            syncer: None,
        }
    }

    /// Bind to a Slint model for automatic synchronization.
    ///
    /// * `constructor` - creates path items from (cable id, path commands, color, line width)
    pub fn bind_model<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, Color, f32) -> P + 'static,
    {
        self.syncer = Some(Box::new(ConcreteModelSyncer { model, constructor }));
    }

    pub fn set_style(&mut self, style: CableStyle) {
        self.style = style;
    }

    pub fn set_display_scale(&mut self, scale: f32) {
        self.display_scale = scale;
    }

    /// Every registered pin in container coordinates.
    ///
    /// Pins on boards that cannot be measured are left out.
    pub fn global_pin_positions<M: SurfaceMeasure + ?Sized>(&self, measure: &M) -> HashMap<PinId, Point> {
        let registry = self.registry.snapshot();
        let mut positions = HashMap::with_capacity(registry.pin_count());
        for (board, pins) in registry.boards() {
            let Some(offset) = surface_offset(measure, board) else {
                continue;
            };
            for pin in pins.iter() {
                positions.insert(pin.id.clone(), local_to_global(pin.position, offset, self.display_scale));
            }
        }
        positions
    }

    /// Recompute all cable paths and the ghost path.
    ///
    /// Cables with an endpoint that cannot be resolved are skipped. The ghost
    /// is drawn from the pending cable's anchor to the pointer.
    pub fn update_paths<M: SurfaceMeasure + ?Sized>(
        &mut self,
        cables: &CableSet,
        pending: Option<&PendingCable>,
        measure: &M,
    ) {
        let positions = self.global_pin_positions(measure);

        self.paths = cables
            .iter()
            .filter_map(|cable| {
                let from = positions.get(&cable.from)?;
                let to = positions.get(&cable.to)?;
                Some(CablePathData {
                    id: cable.id.clone(),
                    path: generate_cable_path(*from, *to, &self.style),
                    color: parse_css_color(&cable.color).unwrap_or(Color::from_rgb_u8(128, 128, 128)),
                    line_width: self.style.line_width,
                })
            })
            .collect();

        self.ghost = pending.and_then(|pending| {
            let from = positions.get(&pending.from)?;
            let to = pending.pointer?;
            Some(generate_cable_path(*from, to, &self.style))
        });

        // Auto-sync to bound model if present
        if let Some(syncer) = &self.syncer {
            syncer.sync(&self.paths);
        }
    }

    pub fn paths(&self) -> &[CablePathData] {
        &self.paths
    }

    pub fn ghost_path(&self) -> Option<&str> {
        self.ghost.as_deref()
    }

    pub fn ghost_color(&self) -> Color {
        parse_css_color(GHOST_COLOR).unwrap_or(Color::from_rgb_u8(255, 47, 214))
    }
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r,g,b)` or `hsl(h,s%,l%)` into a colour.
pub fn parse_css_color(css: &str) -> Option<Color> {
    let css = css.trim();
    if let Some(hex) = css.strip_prefix('#') {
        return parse_hex(hex);
    }
    let (name, args) = css.strip_suffix(')')?.split_once('(')?;
    let args: Vec<&str> = args.split(',').map(str::trim).collect();
    let [a, b, c] = args.as_slice() else {
        return None;
    };
    match name.trim() {
        "rgb" => Some(Color::from_rgb_u8(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?)),
        "hsl" => {
            let h: f32 = a.trim_end_matches("deg").parse().ok()?;
            let s: f32 = b.strip_suffix('%')?.parse().ok()?;
            let l: f32 = c.strip_suffix('%')?.parse().ok()?;
            let (r, g, b) = hsl_to_rgb(h, s / 100.0, l / 100.0);
            Some(Color::from_rgb_u8(r, g, b))
        }
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Color::from_rgb_u8(digits.next()??, digits.next()??, digits.next()??))
        }
        6 => Some(Color::from_rgb_u8(
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        _ => None,
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 / 60 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
