//! Module metadata and board layouts supplied by the host.
//!
//! The catalog holds one [`ModuleMeta`] per module type (keyed by slug) and
//! the image aspect ratios learned so far. Aspect ratios arrive
//! asynchronously; until one is known a module's height falls back to a
//! deterministic estimate.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::error::{PatchError, PatchResult};
use crate::grid::Layout;
use crate::model::{BoardId, Knob, ModuleId, ModuleInstance, PinGroup, Switch};

/// Title and description of a knob or switch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlDef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Static description of a module type (`meta.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleMeta {
    pub slug: String,
    pub name: String,
    pub short_description: String,
    /// Width in grid columns.
    pub units_width: Option<u32>,
    pub legs_pattern: Option<String>,
    pub inputs: Vec<PinGroup>,
    pub outputs: Vec<PinGroup>,
    pub knobs: Vec<ControlDef>,
    pub switches: Vec<ControlDef>,
}

impl ModuleMeta {
    pub fn from_json_str(slug: &str, json: &str) -> PatchResult<Self> {
        let mut meta: ModuleMeta = serde_json::from_str(json)?;
        if meta.slug.is_empty() {
            meta.slug = slug.to_owned();
        }
        Ok(meta)
    }

    pub fn width(&self, config: &EditorConfig) -> u32 {
        self.units_width.filter(|&w| w > 0).unwrap_or(config.default_unit_width)
    }

    /// Panel image, regular resolution.
    pub fn image_path(&self) -> String {
        format!("modules/{}/panel.png", self.slug)
    }

    /// Panel image, high resolution. Its aspect ratio sizes the module.
    pub fn large_image_path(&self) -> String {
        format!("modules/{}/panel_large.png", self.slug)
    }

    /// Case-insensitive match on name, slug or short description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.slug.to_lowercase().contains(&query)
            || self.short_description.to_lowercase().contains(&query)
    }

    /// A fresh instance of this module type with default control values.
    pub fn instantiate(&self, board: BoardId, x: i32, height: f32, config: &EditorConfig) -> ModuleInstance {
        ModuleInstance {
            id: ModuleId::random(),
            module_type: self.slug.clone(),
            board_id: board,
            x,
            y: 0,
            width: self.width(config),
            height,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            knobs: self
                .knobs
                .iter()
                .map(|k| Knob {
                    title: k.title.clone(),
                    description: k.description.clone(),
                    value: config.default_knob_value,
                })
                .collect(),
            switches: self
                .switches
                .iter()
                .map(|s| Switch {
                    title: s.title.clone(),
                    description: s.description.clone(),
                    value: false,
                })
                .collect(),
            legs_pattern: self.legs_pattern.clone().filter(|p| !p.is_empty()),
        }
    }
}

/// Height of a module `units` columns wide whose panel has `aspect` (width / height).
pub fn module_height(units: u32, aspect: f32, config: &EditorConfig) -> f32 {
    (config.module_pixel_width(units) / aspect).round()
}

/// Height used while no aspect ratio is known: the full grid height.
pub fn fallback_module_height(rows: usize, config: &EditorConfig) -> f32 {
    config.grid_pixel_height(rows)
}

/// All known module types, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    metas: Vec<ModuleMeta>,
    index: HashMap<String, usize>,
    aspects: HashMap<String, f32>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a module type.
    pub fn insert(&mut self, meta: ModuleMeta) {
        match self.index.get(&meta.slug) {
            Some(&i) => self.metas[i] = meta,
            None => {
                self.index.insert(meta.slug.clone(), self.metas.len());
                self.metas.push(meta);
            }
        }
    }

    pub fn get(&self, slug: &str) -> Option<&ModuleMeta> {
        self.index.get(slug).map(|&i| &self.metas[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleMeta> {
        self.metas.iter()
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Module types matching a browser filter.
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a ModuleMeta> + 'a {
        self.metas.iter().filter(move |m| m.matches(query))
    }

    /// Record the panel image aspect ratio (width / height) of a module type.
    ///
    /// Non-finite or non-positive ratios are ignored.
    pub fn set_image_aspect(&mut self, slug: &str, aspect: f32) -> bool {
        if !aspect.is_finite() || aspect <= 0.0 {
            tracing::warn!(slug, aspect, "ignoring invalid image aspect ratio");
            return false;
        }
        self.aspects.insert(slug.to_owned(), aspect);
        true
    }

    pub fn image_aspect(&self, slug: &str) -> Option<f32> {
        self.aspects.get(slug).copied()
    }

    /// Height for a module: from the image aspect if known, else `saved`, else
    /// the rows-based estimate.
    pub fn resolve_height(
        &self,
        slug: &str,
        units: u32,
        saved: Option<f32>,
        rows: Option<usize>,
        config: &EditorConfig,
    ) -> f32 {
        if let Some(aspect) = self.image_aspect(slug) {
            return module_height(units, aspect, config);
        }
        if let Some(height) = saved.filter(|h| h.is_finite() && *h > 0.0) {
            return height;
        }
        tracing::warn!(slug, "no image dimensions for module, using fallback height");
        fallback_module_height(rows.unwrap_or(config.fallback_rows), config)
    }
}

/// Board layouts keyed by board type.
#[derive(Debug, Clone, Default)]
pub struct LayoutSource {
    layouts: HashMap<String, Layout>,
    order: Vec<String>,
}

impl LayoutSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "<board type>": ["<row>", ...], ... }`.
    pub fn from_json_str(json: &str, config: &EditorConfig) -> PatchResult<Self> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;

        let mut source = Self::new();
        for (board_type, rows) in raw {
            let layout = Layout::parse_with_marker(&rows, config.power_pin_marker)?;
            source.insert(board_type, layout);
        }
        Ok(source)
    }

    pub fn insert(&mut self, board_type: impl Into<String>, layout: Layout) {
        let board_type = board_type.into();
        if !self.layouts.contains_key(&board_type) {
            self.order.push(board_type.clone());
        }
        self.layouts.insert(board_type, layout);
    }

    pub fn get(&self, board_type: &str) -> Option<&Layout> {
        self.layouts.get(board_type)
    }

    /// Board types in insertion order.
    pub fn board_types(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Layout of a board type, or an error naming it.
    pub fn require(&self, board_type: &str) -> PatchResult<&Layout> {
        self.get(board_type)
            .ok_or_else(|| PatchError::UnknownBoardType(board_type.to_owned()))
    }
}
