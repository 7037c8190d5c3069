//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use std::cell::RefCell;
use std::rc::Rc;

use slint_patch_editor::{
    BoardId, Cable, EditorConfig, EditorObserver, LayoutSource, ModuleCatalog, ModuleMeta, PinId,
    PlacementPreview,
};

pub const BOARD_TYPE: &str = "breadboard-830";
pub const COLUMNS: usize = 63;
pub const ROWS: usize = 14;

/// 830-point breadboard: two power rows top and bottom with a bus break
/// every sixth column, generic area in between.
pub fn board_830_rows() -> Vec<String> {
    let pin_row: String = (0..COLUMNS).map(|c| if c % 6 == 5 { '_' } else { 'P' }).collect();
    let area_row = "M".repeat(COLUMNS);
    let mut rows = vec![pin_row.clone(), pin_row.clone()];
    rows.extend(std::iter::repeat(area_row).take(ROWS - 4));
    rows.push(pin_row.clone());
    rows.push(pin_row);
    rows
}

pub fn layouts() -> LayoutSource {
    let json = serde_json::json!({ BOARD_TYPE: board_830_rows() }).to_string();
    LayoutSource::from_json_str(&json, &EditorConfig::default()).expect("valid layouts")
}

pub const VCO_META: &str = r#"{
    "name": "VCO",
    "shortDescription": "Voltage controlled oscillator",
    "unitsWidth": 5,
    "inputs": [{ "title": "V/Oct" }, { "title": "FM" }],
    "outputs": [{ "title": "Saw" }, { "title": "Square" }],
    "knobs": [{ "title": "Tune" }, { "title": "Fine" }],
    "switches": [{ "title": "Range" }]
}"#;

pub const MIXER_META: &str = r#"{
    "name": "Stereo Mixer",
    "shortDescription": "Two channel mixer",
    "unitsWidth": 4,
    "legsPattern": "p--p",
    "inputs": [{ "title": "In", "pins": [{ "x": 0.25, "y": 0.2 }, { "x": 0.75, "y": 0.2 }] }],
    "outputs": [{ "title": "Out" }],
    "knobs": [{ "title": "Level" }]
}"#;

pub fn catalog() -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    catalog.insert(ModuleMeta::from_json_str("vco", VCO_META).expect("valid meta"));
    catalog.insert(ModuleMeta::from_json_str("mixer", MIXER_META).expect("valid meta"));
    catalog
}

/// Two boards, a VCO on the first and a mixer on the second, one cable.
pub const PATCH_JSON: &str = r#"{
    "breadboards": [
        { "id": "b1", "type": "breadboard-830" },
        { "id": "b2", "type": "breadboard-830" }
    ],
    "modules": [
        {
            "id": "osc", "type": "vco", "x": 0, "y": 0, "width": 5, "height": 200,
            "breadboardId": "b1",
            "knobValues": { "Tune": 0.25 },
            "switchValues": { "Range": true }
        },
        {
            "id": "mix", "type": "mixer", "x": 12, "y": 0, "width": 4, "height": 180,
            "breadboardId": "b2",
            "knobValues": { "Level": 0.9 }
        }
    ],
    "cables": [
        { "id": "c1", "from": "osc:output:0:0", "to": "mix:input:0:1", "color": "hsl(200,80%,60%)" }
    ]
}"#;

pub fn board(id: &str) -> BoardId {
    BoardId::new(id)
}

/// Records observer notifications for assertions.
#[derive(Default, Clone)]
pub struct EventTracker {
    /// (anchor, picked_up)
    pub started: Rc<RefCell<Vec<(String, bool)>>>,
    /// (from, to, created)
    pub committed: Rc<RefCell<Vec<(String, String, bool)>>>,
    /// Count of gesture_cancelled calls
    pub cancelled: Rc<RefCell<usize>>,
    /// Columns of valid previews
    pub validated: Rc<RefCell<Vec<i32>>>,
    /// Columns of rejected previews
    pub rejected: Rc<RefCell<Vec<i32>>>,
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.started.borrow_mut().clear();
        self.committed.borrow_mut().clear();
        *self.cancelled.borrow_mut() = 0;
        self.validated.borrow_mut().clear();
        self.rejected.borrow_mut().clear();
    }
}

impl EditorObserver for EventTracker {
    fn gesture_started(&self, anchor: &PinId, picked_up: Option<&Cable>) {
        self.started.borrow_mut().push((anchor.to_string(), picked_up.is_some()));
    }

    fn gesture_committed(&self, from: &PinId, to: &PinId, created: Option<&Cable>) {
        self.committed
            .borrow_mut()
            .push((from.to_string(), to.to_string(), created.is_some()));
    }

    fn gesture_cancelled(&self, _anchor: &PinId) {
        *self.cancelled.borrow_mut() += 1;
    }

    fn placement_validated(&self, preview: &PlacementPreview) {
        self.validated.borrow_mut().push(preview.x);
    }

    fn placement_rejected(&self, preview: &PlacementPreview) {
        self.rejected.borrow_mut().push(preview.x);
    }
}
