//! # Slint Patch Editor Library
//!
//! The editing core of a breadboard modular-synth patch editor: modules snap
//! onto breadboard grids, and patch cables connect their pins across boards.
//!
//! ## Features
//!
//! - **Placement Validation** - Overlap and leg/power-rail checks with a drag preview
//! - **Pin Geometry** - Explicit or automatic pin positions, published per board
//! - **Cross-Board Cables** - Nearest-pin snapping over every board, pick-up and toggle gestures
//! - **Measured Transforms** - Pointer and pin coordinates resolved from live surface measurements
//! - **Persistence** - Patch files, metadata merge on load, assembly instructions
//!
//! ## Core Pieces
//!
//! - [`Layout`] - Parsed breadboard grid
//! - [`validate_at_pointer`] - Placement preview under the pointer
//! - [`calculate_module_pins`] - Pin positions of one module
//! - [`PinRegistryHandle`] - Shared per-board pin tables
//! - [`nearest_pin`] - Cross-board pin hit-test
//! - [`CableGesture`] - Cable drag state machine
//! - [`CableLayer`] - Cable paths for the overlay, synced to a Slint model
//! - [`PatchEditorController`] - Everything above wired to Slint callbacks

pub mod cable_layer;
pub mod cables;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod grid;
pub mod instructions;
pub mod model;
pub mod observer;
pub mod path;
pub mod persist;
pub mod pins;
pub mod placement;
pub mod registry;
pub mod transform;

pub use cable_layer::{parse_css_color, CableLayer, CablePathData};
pub use cables::{random_cable_color, Cable, CableSet, ConnectOutcome};
pub use catalog::{LayoutSource, ModuleCatalog, ModuleMeta};
pub use config::{CableStyle, EditorConfig, PinRowSide};
pub use controller::{DragSource, PatchEditorController};
pub use error::{LayoutError, PatchError, PatchResult, PinIdError};
pub use gesture::{CableGesture, GestureEvent, GestureOutcome, GestureState, NoCapture, PendingCable, PointerCapture};
pub use grid::{cell_highlight, BoardMetrics, Cell, CellHighlight, Layout};
pub use hit_test::{find_pin_at, nearest_pin, PinGeometry, PinHit};
pub use instructions::generate_instructions;
pub use model::{
    Board, BoardId, CableId, IoKind, Knob, ModuleId, ModuleInstance, MoveDirection, Patch, PinGroup, PinId,
    Removed, SubPin, Switch,
};
pub use observer::{EditorObserver, NoopObserver, TracingObserver};
pub use path::{generate_cable_path, CubicBezier};
pub use persist::{load_patch, save_patch, PatchFile};
pub use pins::{board_pins, calculate_module_pins, ModulePins, ModuleRect};
pub use placement::{leftmost_valid_column, validate_at_column, validate_at_pointer, Candidate, Placement, PlacementPreview};
pub use registry::{BoardPins, PinEntry, PinRegistry, PinRegistryHandle};
pub use transform::{Affine, Point, Rect, StaticSurfaces, SurfaceMeasure};
