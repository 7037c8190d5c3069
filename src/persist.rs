//! Patch files.
//!
//! A patch file stores boards, module placements with their control values,
//! and cables. Module pin groups and control definitions are not stored;
//! they are looked up in the [`ModuleCatalog`] on load and merged with the
//! saved values by title.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cables::{Cable, CableSet};
use crate::catalog::{LayoutSource, ModuleCatalog};
use crate::config::EditorConfig;
use crate::error::{PatchError, PatchResult};
use crate::model::{Board, BoardId, Knob, ModuleId, ModuleInstance, Patch, Switch};

/// A module as stored in a patch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedModule {
    pub id: ModuleId,
    #[serde(rename = "type")]
    pub module_type: String,
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    #[serde(default)]
    pub height: Option<f32>,
    pub breadboard_id: BoardId,
    #[serde(default)]
    pub knob_values: BTreeMap<String, f32>,
    #[serde(default)]
    pub switch_values: BTreeMap<String, bool>,
}

impl From<&ModuleInstance> for SavedModule {
    fn from(m: &ModuleInstance) -> Self {
        Self {
            id: m.id.clone(),
            module_type: m.module_type.clone(),
            x: m.x,
            y: m.y,
            width: m.width,
            height: Some(m.height),
            breadboard_id: m.board_id.clone(),
            knob_values: m.knobs.iter().map(|k| (k.title.clone(), k.value)).collect(),
            switch_values: m.switches.iter().map(|s| (s.title.clone(), s.value)).collect(),
        }
    }
}

/// On-disk patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchFile {
    pub breadboards: Vec<Board>,
    pub modules: Vec<SavedModule>,
    #[serde(default)]
    pub cables: Vec<Cable>,
}

impl PatchFile {
    pub fn from_patch(patch: &Patch) -> Self {
        Self {
            breadboards: patch.boards.clone(),
            modules: patch.modules.iter().map(SavedModule::from).collect(),
            cables: patch.cables.iter().cloned().collect(),
        }
    }

    /// Parse a patch document, requiring the `breadboards` and `modules` keys.
    pub fn from_json_str(json: &str) -> PatchResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        for key in ["breadboards", "modules"] {
            if value.get(key).map_or(true, serde_json::Value::is_null) {
                return Err(PatchError::MissingKey(key));
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Serialize a patch as pretty-printed JSON.
pub fn save_patch(patch: &Patch) -> PatchResult<String> {
    Ok(serde_json::to_string_pretty(&PatchFile::from_patch(patch))?)
}

/// Parse a patch file and rebuild the full patch from it.
///
/// Fails without side effects on malformed JSON or missing required keys.
/// Inconsistent content degrades: modules on unknown boards and cables to
/// unknown modules are dropped with a warning.
pub fn load_patch(
    json: &str,
    catalog: &ModuleCatalog,
    layouts: &LayoutSource,
    config: &EditorConfig,
) -> PatchResult<Patch> {
    let file = PatchFile::from_json_str(json)?;
    Ok(restore_patch(file, catalog, layouts, config))
}

/// Rebuild a patch from a parsed file.
pub fn restore_patch(file: PatchFile, catalog: &ModuleCatalog, layouts: &LayoutSource, config: &EditorConfig) -> Patch {
    let mut patch = Patch::new();

    for board in file.breadboards {
        if layouts.get(&board.board_type).is_none() {
            tracing::warn!(board = %board.id, board_type = %board.board_type, "no layout for board type");
        }
        patch.add_board(board);
    }

    for saved in file.modules {
        let Some(board) = patch.board(&saved.breadboard_id) else {
            tracing::warn!(module = %saved.id, board = %saved.breadboard_id, "dropping module on unknown board");
            continue;
        };
        let layout = layouts.get(&board.board_type);
        let module = restore_module(saved, catalog, layout.map(|l| l.rows()), config);
        let end = i64::from(module.x) + i64::from(module.width);
        if module.x < 0 || layout.is_some_and(|l| end > l.columns() as i64) {
            tracing::warn!(
                module = %module.id,
                board = %module.board_id,
                x = module.x,
                width = module.width,
                "dropping module outside its board"
            );
            continue;
        }
        patch.modules.push(module);
    }

    let known: HashSet<ModuleId> = patch.modules.iter().map(|m| m.id.clone()).collect();
    let mut cables = CableSet::new();
    for cable in file.cables {
        if !known.contains(&cable.from.module) || !known.contains(&cable.to.module) {
            tracing::warn!(cable = %cable.id, from = %cable.from, to = %cable.to, "dropping cable to unknown module");
            continue;
        }
        for end in [&cable.from, &cable.to] {
            let auto_group = patch
                .module(&end.module)
                .and_then(|m| m.groups(end.io).get(end.group))
                .is_some_and(|g| g.explicit_pins().is_none());
            if auto_group && end.pin > 0 {
                // Auto layout places one pin per group; this end has no position.
                tracing::warn!(cable = %cable.id, pin = %end, "cable ends on a second pin of an auto-laid-out group");
            }
        }
        let id = cable.id.clone();
        if cables.push(cable).is_none() {
            tracing::warn!(cable = %id, "dropping duplicate or self-connected cable");
        }
    }
    patch.cables = cables;

    patch
}

fn restore_module(saved: SavedModule, catalog: &ModuleCatalog, rows: Option<usize>, config: &EditorConfig) -> ModuleInstance {
    let meta = catalog.get(&saved.module_type);
    if meta.is_none() {
        tracing::warn!(module = %saved.id, module_type = %saved.module_type, "no metadata for module type");
    }

    let units = meta
        .and_then(|m| m.units_width)
        .filter(|&w| w > 0)
        .unwrap_or(saved.width.max(1));
    let height = catalog.resolve_height(&saved.module_type, units, saved.height, rows, config);

    let (inputs, outputs, knobs, switches, legs_pattern) = match meta {
        Some(meta) => (
            meta.inputs.clone(),
            meta.outputs.clone(),
            meta.knobs
                .iter()
                .map(|k| Knob {
                    title: k.title.clone(),
                    description: k.description.clone(),
                    value: saved
                        .knob_values
                        .get(&k.title)
                        .map_or(config.default_knob_value, |v| v.clamp(0.0, 1.0)),
                })
                .collect(),
            meta.switches
                .iter()
                .map(|s| Switch {
                    title: s.title.clone(),
                    description: s.description.clone(),
                    value: saved.switch_values.get(&s.title).copied().unwrap_or(false),
                })
                .collect(),
            meta.legs_pattern.clone().filter(|p| !p.is_empty()),
        ),
        // Keep the saved control values so a later save does not lose them.
        None => (
            Vec::new(),
            Vec::new(),
            saved
                .knob_values
                .iter()
                .map(|(title, value)| Knob {
                    title: title.clone(),
                    description: String::new(),
                    value: value.clamp(0.0, 1.0),
                })
                .collect(),
            saved
                .switch_values
                .iter()
                .map(|(title, value)| Switch {
                    title: title.clone(),
                    description: String::new(),
                    value: *value,
                })
                .collect(),
            None,
        ),
    };

    ModuleInstance {
        id: saved.id,
        module_type: saved.module_type,
        board_id: saved.breadboard_id,
        x: saved.x,
        y: saved.y,
        width: saved.width.max(1),
        height,
        inputs,
        outputs,
        knobs,
        switches,
        legs_pattern,
    }
}
