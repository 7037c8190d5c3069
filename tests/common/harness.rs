//! Test harness for the patch editor controller.
//!
//! Sets up a controller over the shared fixtures with a bound cable model,
//! event tracking and helpers for simulating pointer input in screen space.

#![allow(dead_code)]

use std::rc::Rc;

use slint::{Color, SharedString, VecModel};
use slint_patch_editor::{
    BoardId, EditorConfig, PatchEditorController, PinId, Point, Rect, StaticSurfaces, SurfaceMeasure,
};

use super::{catalog, layouts, EventTracker, PATCH_JSON};

/// Row of the bound cable model, mirroring a Slint struct.
#[derive(Debug, Clone, PartialEq)]
pub struct CableRow {
    pub id: SharedString,
    pub path: SharedString,
    pub color: Color,
    pub width: f32,
}

/// Screen geometry: the container at (10, 20), boards stacked below it.
pub fn surfaces() -> StaticSurfaces {
    StaticSurfaces::new(Rect::new(10.0, 20.0, 1400.0, 1200.0))
        .with_board(BoardId::new("b1"), Rect::new(10.0, 60.0, 1100.0, 380.0), 0.8)
        .with_board(BoardId::new("b2"), Rect::new(10.0, 480.0, 1100.0, 380.0), 0.8)
}

pub struct PatchHarness {
    pub ctrl: PatchEditorController,
    pub surfaces: StaticSurfaces,
    pub cables: Rc<VecModel<CableRow>>,
    pub tracker: EventTracker,
}

impl PatchHarness {
    /// Controller with the fixture patch loaded.
    pub fn new() -> Self {
        let harness = Self::empty();
        harness.ctrl.load(PATCH_JSON).expect("fixture patch loads");
        harness
    }

    /// Controller with no boards.
    pub fn empty() -> Self {
        let surfaces = surfaces();
        let ctrl = PatchEditorController::new(catalog(), layouts(), EditorConfig::default(), Rc::new(surfaces.clone()))
            .with_seed(42);
        let tracker = EventTracker::new();
        ctrl.set_observer(Rc::new(tracker.clone()));

        let cables = Rc::new(VecModel::<CableRow>::from(Vec::new()));
        ctrl.bind_cable_model(cables.clone(), |id, path, color, width| CableRow { id, path, color, width });

        Self {
            ctrl,
            surfaces,
            cables,
            tracker,
        }
    }

    /// Replace the screen geometry.
    pub fn set_surfaces(&mut self, surfaces: StaticSurfaces) {
        self.ctrl.set_measure(Rc::new(surfaces.clone()));
        self.surfaces = surfaces;
    }

    /// Screen position of a registered pin.
    pub fn screen_of(&self, pin: &PinId) -> Point {
        let registry = self.ctrl.registry().snapshot();
        let (board, entry) = registry.find(pin).expect("pin is registered");
        self.surfaces
            .screen_ctm(board)
            .expect("board is measured")
            .apply(entry.position)
    }

    /// Press on `pin` and release over `target`.
    pub fn drag_cable(&self, pin: &PinId, target: &PinId) {
        self.ctrl.pin_pressed(pin, self.screen_of(pin));
        self.ctrl.pointer_moved(self.screen_of(target));
        self.ctrl.pointer_released(self.screen_of(target));
    }

    /// Screen point whose board-local x centres a `width`-wide module on `column`.
    pub fn screen_for_column(&self, board: &BoardId, column: i32, width: u32) -> Point {
        let config = EditorConfig::default();
        let local_x = config.grid_padding + (column as f32 + width as f32 / 2.0 + 0.25) * config.column_pitch();
        self.surfaces
            .screen_ctm(board)
            .expect("board is measured")
            .apply(Point::new(local_x, 100.0))
    }

    pub fn cable_count(&self) -> usize {
        self.ctrl.patch().borrow().cables.len()
    }
}
