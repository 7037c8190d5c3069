//! High-level controller for patch editor applications.
//!
//! The [`PatchEditorController`] owns the patch, the module catalog, the
//! board layouts and the pin registry, and wires pointer input to placement
//! validation and the cable gesture.
//!
//! # Example
//!
//! ```ignore
//! use slint_patch_editor::{EditorConfig, PatchEditorController};
//!
//! slint::include_modules!();
//!
//! fn main() {
//!     let window = MainWindow::new().unwrap();
//!     let ctrl = PatchEditorController::new(catalog, layouts, EditorConfig::default(), surfaces);
//!
//!     let cables = Rc::new(VecModel::<CablePath>::default());
//!     ctrl.bind_cable_model(cables.clone(), |id, path, color, width| CablePath { id, path, color, width });
//!     window.set_cable_paths(ModelRc::from(cables));
//!
//!     // Cable gesture
//!     window.on_pin_pressed(ctrl.pin_pressed_callback());
//!     window.on_pointer_moved(ctrl.pointer_moved_callback());
//!     window.on_pointer_released(ctrl.pointer_released_callback());
//!
//!     // Controls
//!     window.on_knob_changed(ctrl.knob_changed_callback());
//!     window.on_switch_toggled(ctrl.switch_toggled_callback());
//!
//!     window.on_refresh({
//!         let ctrl = ctrl.clone();
//!         let w = window.as_weak();
//!         move || {
//!             if let Some(w) = w.upgrade() {
//!                 w.set_ghost_path(ctrl.ghost_path());
//!             }
//!         }
//!     });
//!
//!     window.run().unwrap();
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use slint::{Color, SharedString, VecModel};

use crate::cable_layer::CableLayer;
use crate::catalog::{module_height, LayoutSource, ModuleCatalog};
use crate::config::EditorConfig;
use crate::error::{PatchError, PatchResult};
use crate::gesture::{CableGesture, GestureEvent, GestureOutcome, NoCapture, PointerCapture};
use crate::instructions::generate_instructions;
use crate::model::{Board, BoardId, ModuleId, MoveDirection, Patch, PinId, Removed};
use crate::observer::{EditorObserver, NoopObserver};
use crate::persist::{load_patch, save_patch};
use crate::pins::board_pins;
use crate::placement::{leftmost_valid_column, validate_at_column, validate_at_pointer, Candidate, Placement};
use crate::hit_test::nearest_pin;
use crate::registry::PinRegistryHandle;
use crate::transform::{pointer_to_container, pointer_to_local, Point, SurfaceMeasure};

/// What a module drag carries.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A new module of this type, dragged in from the module browser.
    Catalog(String),
    /// A module already on a board.
    Module(ModuleId),
}

#[derive(Debug, Clone)]
struct ModuleDrag {
    source: DragSource,
    placement: Placement,
}

/// Controller that manages patch editor state and provides callback implementations.
///
/// This provides a high-level API that handles:
/// - Board and module management with placement validation
/// - Pin registry rebuilds after every layout-affecting change
/// - The cable gesture (pick up, snap, toggle) across all boards
/// - Cable path computation in container coordinates
/// - Patch save/load and assembly instructions
///
/// Clone this controller to share it across callbacks.
#[derive(Clone)]
pub struct PatchEditorController {
    patch: Rc<RefCell<Patch>>,
    catalog: Rc<RefCell<ModuleCatalog>>,
    layouts: Rc<RefCell<LayoutSource>>,
    config: Rc<RefCell<EditorConfig>>,
    registry: PinRegistryHandle,
    layer: Rc<RefCell<CableLayer>>,
    gesture: Rc<RefCell<CableGesture>>,
    module_drag: Rc<RefCell<Option<ModuleDrag>>>,
    measure: Rc<RefCell<Rc<dyn SurfaceMeasure>>>,
    capture: Rc<RefCell<Box<dyn PointerCapture>>>,
    observer: Rc<RefCell<Rc<dyn EditorObserver>>>,
    rng: Rc<RefCell<StdRng>>,
}

impl PatchEditorController {
    /// Create a controller over an empty patch.
    pub fn new(
        catalog: ModuleCatalog,
        layouts: LayoutSource,
        config: EditorConfig,
        measure: Rc<dyn SurfaceMeasure>,
    ) -> Self {
        let registry = PinRegistryHandle::new();
        let layer = CableLayer::new(registry.clone(), &config);
        Self {
            patch: Rc::new(RefCell::new(Patch::new())),
            catalog: Rc::new(RefCell::new(catalog)),
            layouts: Rc::new(RefCell::new(layouts)),
            config: Rc::new(RefCell::new(config)),
            registry,
            layer: Rc::new(RefCell::new(layer)),
            gesture: Rc::new(RefCell::new(CableGesture::new())),
            module_drag: Rc::new(RefCell::new(None)),
            measure: Rc::new(RefCell::new(measure)),
            capture: Rc::new(RefCell::new(Box::new(NoCapture))),
            observer: Rc::new(RefCell::new(Rc::new(NoopObserver))),
            rng: Rc::new(RefCell::new(StdRng::from_entropy())),
        }
    }

    /// Use a fixed seed for cable colours.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.borrow_mut() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn set_observer(&self, observer: Rc<dyn EditorObserver>) {
        *self.observer.borrow_mut() = observer;
    }

    pub fn set_pointer_capture(&self, capture: Box<dyn PointerCapture>) {
        *self.capture.borrow_mut() = capture;
    }

    /// Replace the surface measurements (after the host re-lays out its boards).
    pub fn set_measure(&self, measure: Rc<dyn SurfaceMeasure>) {
        *self.measure.borrow_mut() = measure;
        self.refresh_cables();
    }

    /// Set the pin snap radius (default: 18.0).
    pub fn set_snap_radius(&self, radius: f32) {
        self.config.borrow_mut().snap_radius = radius;
    }

    /// Set the board display scale (default: 0.8).
    pub fn set_display_scale(&self, scale: f32) {
        self.config.borrow_mut().display_scale = scale;
        self.layer.borrow_mut().set_display_scale(scale);
        self.refresh_cables();
    }

    // === Accessors ===

    /// Get access to the patch.
    pub fn patch(&self) -> Rc<RefCell<Patch>> {
        self.patch.clone()
    }

    /// Get access to the module catalog.
    pub fn catalog(&self) -> Rc<RefCell<ModuleCatalog>> {
        self.catalog.clone()
    }

    pub fn config(&self) -> EditorConfig {
        self.config.borrow().clone()
    }

    /// Shared pin registry; hand clones to other renderers.
    pub fn registry(&self) -> PinRegistryHandle {
        self.registry.clone()
    }

    /// Slugs of the module types matching a browser filter.
    pub fn search_modules(&self, query: &str) -> Vec<String> {
        self.catalog.borrow().search(query).map(|m| m.slug.clone()).collect()
    }

    fn measure(&self) -> Rc<dyn SurfaceMeasure> {
        self.measure.borrow().clone()
    }

    fn observer(&self) -> Rc<dyn EditorObserver> {
        self.observer.borrow().clone()
    }

    // === Derived state ===

    /// Recompute every board's pins and publish them in one step.
    ///
    /// Boards whose layout is unknown get no pins.
    pub fn rebuild_registry(&self) {
        {
            let patch = self.patch.borrow();
            let layouts = self.layouts.borrow();
            let config = self.config.borrow();
            let boards = patch
                .boards
                .iter()
                .filter_map(|board| {
                    let layout = layouts.get(&board.board_type)?;
                    Some((board.id.clone(), board_pins(layout, patch.modules_on(&board.id), &config)))
                })
                .collect();
            self.registry.publish_all(boards);
        }
        self.refresh_cables();
    }

    /// Recompute cable and ghost paths (after scrolling or re-layout).
    pub fn refresh_cables(&self) {
        let measure = self.measure();
        let patch = self.patch.borrow();
        let gesture = self.gesture.borrow();
        self.layer
            .borrow_mut()
            .update_paths(&patch.cables, gesture.pending(), &*measure);
    }

    /// Bind a Slint model that receives cable paths on every refresh.
    pub fn bind_cable_model<P, F>(&self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, Color, f32) -> P + 'static,
    {
        self.layer.borrow_mut().bind_model(model, constructor);
        self.refresh_cables();
    }

    /// Current ghost cable path, empty when no cable is being dragged.
    pub fn ghost_path(&self) -> SharedString {
        self.layer.borrow().ghost_path().unwrap_or_default().into()
    }

    pub fn cable_paths(&self) -> Vec<crate::cable_layer::CablePathData> {
        self.layer.borrow().paths().to_vec()
    }

    // === Boards ===

    /// Append a board of a known type.
    pub fn add_board(&self, board_type: &str) -> PatchResult<BoardId> {
        self.layouts.borrow().require(board_type)?;
        let id = self.patch.borrow_mut().add_board(Board::new(board_type));
        self.rebuild_registry();
        Ok(id)
    }

    /// Remove a board with its modules and their cables.
    pub fn remove_board(&self, id: &BoardId) -> PatchResult<Removed> {
        let removed = self.patch.borrow_mut().remove_board(id)?;
        self.after_removal(&removed);
        Ok(removed)
    }

    pub fn move_board(&self, id: &BoardId, direction: MoveDirection) -> bool {
        let moved = self.patch.borrow_mut().move_board(id, direction);
        if moved {
            self.rebuild_registry();
        }
        moved
    }

    // === Modules ===

    /// Add a module at the leftmost free slot of the last board.
    pub fn add_module(&self, slug: &str) -> PatchResult<ModuleId> {
        let module = {
            let patch = self.patch.borrow();
            let catalog = self.catalog.borrow();
            let layouts = self.layouts.borrow();
            let config = self.config.borrow();

            let meta = catalog
                .get(slug)
                .ok_or_else(|| PatchError::UnknownModuleType(slug.to_owned()))?;
            let board = patch.boards.last().ok_or(PatchError::NoBoards)?;
            let layout = layouts.require(&board.board_type)?;

            let width = meta.width(&config);
            let candidate = Candidate::new(width, meta.legs_pattern.as_deref());
            let x = leftmost_valid_column(&board.id, layout, &patch.modules, &candidate, &config)
                .ok_or_else(|| PatchError::NoRoom(board.id.clone()))?;
            let height = catalog.resolve_height(slug, width, None, Some(layout.rows()), &config);
            meta.instantiate(board.id.clone(), x, height, &config)
        };

        let id = module.id.clone();
        tracing::debug!(module = %id, slug, x = module.x, "adding module");
        self.patch.borrow_mut().modules.push(module);
        self.rebuild_registry();
        Ok(id)
    }

    /// Move a module to `x` on `board`, keeping its cables.
    pub fn move_module(&self, id: &ModuleId, board: &BoardId, x: i32) -> PatchResult<()> {
        {
            let patch = self.patch.borrow();
            let layouts = self.layouts.borrow();
            let config = self.config.borrow();

            let module = patch.module(id).ok_or_else(|| PatchError::UnknownModule(id.clone()))?;
            let target = patch.board(board).ok_or_else(|| PatchError::UnknownBoard(board.clone()))?;
            let layout = layouts.require(&target.board_type)?;
            let preview = validate_at_column(board, layout, &patch.modules, &Candidate::moving(module), x, &config);
            if !preview.valid {
                return Err(PatchError::InvalidPlacement { board: board.clone(), x });
            }
        }
        if let Some(module) = self.patch.borrow_mut().module_mut(id) {
            module.board_id = board.clone();
            module.x = x;
        }
        self.rebuild_registry();
        Ok(())
    }

    /// Remove a module and its cables.
    pub fn remove_module(&self, id: &ModuleId) -> PatchResult<Removed> {
        let removed = self.patch.borrow_mut().remove_module(id)?;
        self.after_removal(&removed);
        Ok(removed)
    }

    fn after_removal(&self, removed: &Removed) {
        let anchor_gone = self
            .gesture
            .borrow()
            .pending()
            .is_some_and(|p| removed.modules.contains(&p.from.module));
        if anchor_gone {
            self.cancel_cable_gesture();
        }
        let dragged_gone = matches!(
            self.module_drag.borrow().as_ref().map(|d| &d.source),
            Some(DragSource::Module(id)) if removed.modules.contains(id)
        );
        if dragged_gone {
            self.module_drag.borrow_mut().take();
        }
        self.rebuild_registry();
    }

    pub fn set_knob(&self, module: &ModuleId, title: &str, value: f32) -> bool {
        self.patch.borrow_mut().set_knob(module, title, value)
    }

    pub fn set_switch(&self, module: &ModuleId, title: &str, value: bool) -> bool {
        self.patch.borrow_mut().set_switch(module, title, value)
    }

    /// A panel image finished loading for `module`.
    ///
    /// Records the aspect ratio for the module's type and resizes every
    /// module of that type. Returns `false` for a module that no longer
    /// exists or an unusable ratio.
    pub fn apply_image_aspect(&self, module: &ModuleId, aspect: f32) -> bool {
        let Some(slug) = self.patch.borrow().module(module).map(|m| m.module_type.clone()) else {
            tracing::debug!(%module, "ignoring image dimensions for removed module");
            return false;
        };
        if !self.catalog.borrow_mut().set_image_aspect(&slug, aspect) {
            return false;
        }
        {
            let config = self.config.borrow();
            let mut patch = self.patch.borrow_mut();
            for m in patch.modules.iter_mut().filter(|m| m.module_type == slug) {
                m.height = module_height(m.width, aspect, &config);
            }
        }
        self.rebuild_registry();
        true
    }

    // === Module drag ===

    /// Start dragging a new or existing module.
    pub fn begin_module_drag(&self, source: DragSource) {
        *self.module_drag.borrow_mut() = Some(ModuleDrag {
            source,
            placement: Placement::None,
        });
    }

    /// The pointer moved during a module drag; returns the preview to draw.
    pub fn module_drag_over(&self, screen: Point) -> Placement {
        let Some(source) = self.module_drag.borrow().as_ref().map(|d| d.source.clone()) else {
            return Placement::None;
        };
        let placement = self.resolve_placement(&source, screen);

        if let Some(preview) = placement.preview() {
            let observer = self.observer();
            if preview.valid {
                observer.placement_validated(preview);
            } else {
                observer.placement_rejected(preview);
            }
        }
        if let Some(drag) = self.module_drag.borrow_mut().as_mut() {
            drag.placement = placement.clone();
        }
        placement
    }

    fn resolve_placement(&self, source: &DragSource, screen: Point) -> Placement {
        let measure = self.measure();
        let Some(board_id) = measure.surface_at(screen) else {
            return Placement::None;
        };
        let patch = self.patch.borrow();
        let Some(board) = patch.board(&board_id) else {
            return Placement::None;
        };
        let layouts = self.layouts.borrow();
        let config = self.config.borrow();
        let layout = layouts.get(&board.board_type);
        let local_x = pointer_to_local(&*measure, &board_id, screen).map(|p| p.x);

        match source {
            DragSource::Catalog(slug) => {
                let catalog = self.catalog.borrow();
                let Some(meta) = catalog.get(slug) else {
                    return Placement::None;
                };
                let candidate = Candidate::new(meta.width(&config), meta.legs_pattern.as_deref());
                validate_at_pointer(&board_id, layout, &patch.modules, &candidate, local_x, &config)
            }
            DragSource::Module(id) => {
                let Some(module) = patch.module(id) else {
                    return Placement::None;
                };
                validate_at_pointer(&board_id, layout, &patch.modules, &Candidate::moving(module), local_x, &config)
            }
        }
    }

    /// The preview of the running module drag.
    pub fn module_placement(&self) -> Placement {
        self.module_drag
            .borrow()
            .as_ref()
            .map_or(Placement::None, |d| d.placement.clone())
    }

    /// Drop the dragged module at its last valid preview.
    ///
    /// Returns the placed module, or `None` when there was no valid preview.
    pub fn drop_module(&self) -> PatchResult<Option<ModuleId>> {
        let Some(drag) = self.module_drag.borrow_mut().take() else {
            return Ok(None);
        };
        let Some(preview) = drag.placement.valid() else {
            return Ok(None);
        };

        let id = match drag.source {
            DragSource::Catalog(slug) => {
                let module = {
                    let catalog = self.catalog.borrow();
                    let layouts = self.layouts.borrow();
                    let config = self.config.borrow();
                    let patch = self.patch.borrow();
                    let meta = catalog
                        .get(&slug)
                        .ok_or_else(|| PatchError::UnknownModuleType(slug.clone()))?;
                    let rows = patch
                        .board(&preview.board)
                        .and_then(|b| layouts.get(&b.board_type))
                        .map(|l| l.rows());
                    let height = catalog.resolve_height(&slug, meta.width(&config), None, rows, &config);
                    meta.instantiate(preview.board.clone(), preview.x, height, &config)
                };
                let id = module.id.clone();
                self.patch.borrow_mut().modules.push(module);
                id
            }
            DragSource::Module(id) => {
                let mut patch = self.patch.borrow_mut();
                let module = patch.module_mut(&id).ok_or_else(|| PatchError::UnknownModule(id.clone()))?;
                module.board_id = preview.board.clone();
                module.x = preview.x;
                id
            }
        };

        tracing::debug!(module = %id, board = %preview.board, x = preview.x, "module dropped");
        self.rebuild_registry();
        Ok(Some(id))
    }

    pub fn cancel_module_drag(&self) {
        self.module_drag.borrow_mut().take();
    }

    // === Cable gesture ===

    /// Pointer pressed on a pin.
    pub fn pin_pressed(&self, pin: &PinId, screen: Point) -> GestureOutcome {
        let measure = self.measure();
        let registry = self.registry.snapshot();
        let (outcome, event) = {
            let mut patch = self.patch.borrow_mut();
            let mut gesture = self.gesture.borrow_mut();
            gesture.begin(pin, pointer_to_container(&*measure, screen), &registry, &mut patch.cables)
        };
        if outcome != GestureOutcome::Ignored {
            self.refresh_cables();
        }
        self.announce(event);
        outcome
    }

    /// Pointer moved anywhere while a cable is being dragged.
    ///
    /// Every pin is a hover candidate, the anchor included: over the anchor
    /// there is no target, even with another pin in snap range.
    pub fn pointer_moved(&self, screen: Point) -> GestureOutcome {
        if !self.gesture.borrow().is_dragging() {
            return GestureOutcome::Ignored;
        }
        let measure = self.measure();
        let snap_radius = self.config.borrow().snap_radius;
        let hover = nearest_pin(&self.registry.snapshot(), &*measure, screen, snap_radius, None);

        let outcome = self
            .gesture
            .borrow_mut()
            .pointer_move(pointer_to_container(&*measure, screen), hover.map(|h| h.pin));
        self.refresh_cables();
        outcome
    }

    /// Pointer released while a cable is being dragged.
    pub fn pointer_released(&self, screen: Point) -> GestureOutcome {
        if !self.gesture.borrow().is_dragging() {
            return GestureOutcome::Ignored;
        }
        self.pointer_moved(screen);
        let target = self.gesture.borrow().pending().and_then(|p| p.hover.clone());

        let (outcome, event) = {
            let mut patch = self.patch.borrow_mut();
            let mut rng = self.rng.borrow_mut();
            let mut gesture = self.gesture.borrow_mut();
            gesture.finish(target, &mut patch.cables, &mut *rng)
        };
        self.refresh_cables();
        self.announce(event);
        outcome
    }

    /// Abort a running cable gesture.
    pub fn cancel_cable_gesture(&self) -> GestureOutcome {
        let (outcome, event) = self.gesture.borrow_mut().abort();
        if outcome != GestureOutcome::Ignored {
            self.refresh_cables();
        }
        self.announce(event);
        outcome
    }

    /// Report a gesture transition once no editor state is borrowed.
    fn announce(&self, event: Option<GestureEvent>) {
        let Some(event) = event else {
            return;
        };
        event.apply_capture(&mut **self.capture.borrow_mut());
        event.notify(&*self.observer());
    }

    pub fn is_dragging_cable(&self) -> bool {
        self.gesture.borrow().is_dragging()
    }

    // === Persistence ===

    pub fn save(&self) -> PatchResult<String> {
        save_patch(&self.patch.borrow())
    }

    /// Replace the patch with a saved one. On error nothing changes.
    pub fn load(&self, json: &str) -> PatchResult<()> {
        let patch = {
            let catalog = self.catalog.borrow();
            let layouts = self.layouts.borrow();
            let config = self.config.borrow();
            load_patch(json, &catalog, &layouts, &config)?
        };
        self.cancel_cable_gesture();
        self.cancel_module_drag();
        *self.patch.borrow_mut() = patch;
        self.rebuild_registry();
        Ok(())
    }

    /// Assembly guide for the current patch.
    pub fn instructions(&self, title: Option<&str>) -> String {
        generate_instructions(&self.patch.borrow(), &self.catalog.borrow(), title)
    }

    // === Callback factories ===

    /// Returns a callback for `pin-pressed(pin-id, x, y)`.
    pub fn pin_pressed_callback(&self) -> impl Fn(SharedString, f32, f32) {
        let ctrl = self.clone();
        move |pin, x, y| match pin.parse::<PinId>() {
            Ok(pin) => {
                ctrl.pin_pressed(&pin, Point::new(x, y));
            }
            Err(err) => tracing::debug!(%err, "ignoring press on malformed pin id"),
        }
    }

    /// Returns a callback for `pointer-moved(x, y)`.
    pub fn pointer_moved_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.pointer_moved(Point::new(x, y));
        }
    }

    /// Returns a callback for `pointer-released(x, y)`.
    pub fn pointer_released_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| {
            ctrl.pointer_released(Point::new(x, y));
        }
    }

    /// Returns a callback for `knob-changed(module-id, title, value)`.
    pub fn knob_changed_callback(&self) -> impl Fn(SharedString, SharedString, f32) {
        let patch = self.patch.clone();
        move |module, title, value| {
            patch.borrow_mut().set_knob(&ModuleId::new(module.as_str()), &title, value);
        }
    }

    /// Returns a callback for `switch-toggled(module-id, title, value)`.
    pub fn switch_toggled_callback(&self) -> impl Fn(SharedString, SharedString, bool) {
        let patch = self.patch.clone();
        move |module, title, value| {
            patch.borrow_mut().set_switch(&ModuleId::new(module.as_str()), &title, value);
        }
    }

    /// Returns a callback for `module-drag-over(x, y)`, reporting whether the drop would be valid.
    pub fn module_drag_over_callback(&self) -> impl Fn(f32, f32) -> bool {
        let ctrl = self.clone();
        move |x, y| ctrl.module_drag_over(Point::new(x, y)).valid().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleMeta;
    use crate::grid::Layout;
    use crate::model::PinGroup;
    use crate::observer::tests::Recorder;
    use crate::transform::{Rect, StaticSurfaces};

    const PATCH: &str = r#"{
        "breadboards": [{ "id": "b1", "type": "830" }, { "id": "b2", "type": "830" }],
        "modules": [
            { "id": "osc", "type": "vco", "x": 0, "y": 0, "width": 5, "breadboardId": "b1" },
            { "id": "filt", "type": "vco", "x": 0, "y": 0, "width": 5, "breadboardId": "b2" }
        ],
        "cables": []
    }"#;

    fn layout_830() -> Layout {
        let pin_row: String = (0..63).map(|c| if c % 6 == 5 { '_' } else { 'P' }).collect();
        let mut rows = vec![pin_row.clone(), pin_row.clone()];
        rows.extend(std::iter::repeat("M".repeat(63)).take(10));
        rows.push(pin_row.clone());
        rows.push(pin_row);
        Layout::parse(&rows).expect("valid layout")
    }

    fn controller() -> PatchEditorController {
        let mut catalog = ModuleCatalog::new();
        catalog.insert(ModuleMeta {
            slug: "vco".into(),
            name: "VCO".into(),
            units_width: Some(5),
            inputs: vec![PinGroup::titled("In")],
            outputs: vec![PinGroup::titled("Out")],
            ..ModuleMeta::default()
        });
        let mut layouts = LayoutSource::new();
        layouts.insert("830", layout_830());

        let surfaces = StaticSurfaces::new(Rect::new(0.0, 0.0, 2000.0, 2000.0))
            .with_board(BoardId::new("b1"), Rect::new(0.0, 0.0, 1200.0, 300.0), 0.8)
            .with_board(BoardId::new("b2"), Rect::new(0.0, 400.0, 1200.0, 300.0), 0.8);
        let ctrl = PatchEditorController::new(catalog, layouts, EditorConfig::default(), Rc::new(surfaces))
            .with_seed(3);
        ctrl.load(PATCH).expect("fixture loads");
        ctrl
    }

    /// Screen position of a pin on a board drawn at 0.8 with the given origin.
    fn screen_of(ctrl: &PatchEditorController, pin: &PinId) -> Point {
        let registry = ctrl.registry().snapshot();
        let (board, entry) = registry.find(pin).expect("pin registered");
        let top = if board.as_str() == "b1" { 0.0 } else { 400.0 };
        Point::new(entry.position.x * 0.8, entry.position.y * 0.8 + top)
    }

    // ========================================================================
    // Registry
    // ========================================================================

    #[test]
    fn test_load_publishes_pins_for_every_board() {
        let ctrl = controller();
        let registry = ctrl.registry().snapshot();
        assert_eq!(registry.boards().count(), 2);
        assert_eq!(registry.pin_count(), 4);
        assert!(registry.contains(&PinId::output("osc", 0, 0)));
    }

    #[test]
    fn test_moving_a_module_republishes_its_pins() {
        let ctrl = controller();
        let before = ctrl.registry().snapshot();
        ctrl.move_module(&ModuleId::new("osc"), &BoardId::new("b1"), 6).expect("valid move");
        let after = ctrl.registry().snapshot();

        let pin = PinId::input("osc", 0, 0);
        let old = before.find(&pin).map(|(_, e)| e.position.x);
        let new = after.find(&pin).map(|(_, e)| e.position.x);
        assert!(new > old);
    }

    // ========================================================================
    // Boards and modules
    // ========================================================================

    #[test]
    fn test_add_module_takes_leftmost_free_slot_of_last_board() {
        let ctrl = controller();
        let id = ctrl.add_module("vco").expect("room on b2");
        let patch = ctrl.patch();
        let patch = patch.borrow();
        let module = patch.module(&id).expect("added");
        assert_eq!(module.board_id, BoardId::new("b2"));
        assert_eq!(module.x, 6);
        assert_eq!(module.knobs.len(), 0);
    }

    #[test]
    fn test_add_module_errors() {
        let ctrl = controller();
        assert!(matches!(ctrl.add_module("nope"), Err(PatchError::UnknownModuleType(_))));
        assert!(matches!(ctrl.add_board("nope"), Err(PatchError::UnknownBoardType(_))));
    }

    #[test]
    fn test_move_module_rejects_overlap() {
        let ctrl = controller();
        let err = ctrl.move_module(&ModuleId::new("filt"), &BoardId::new("b1"), 0);
        assert!(matches!(err, Err(PatchError::InvalidPlacement { x: 0, .. })));
    }

    #[test]
    fn test_remove_board_cascades_cables() {
        let ctrl = controller();
        ctrl.patch()
            .borrow_mut()
            .cables
            .insert(PinId::output("osc", 0, 0), PinId::input("filt", 0, 0), "red");

        let removed = ctrl.remove_board(&BoardId::new("b2")).expect("known board");
        assert_eq!(removed.modules, vec![ModuleId::new("filt")]);
        assert_eq!(removed.cables.len(), 1);
        assert!(ctrl.patch().borrow().cables.is_empty());
        assert_eq!(ctrl.registry().snapshot().boards().count(), 1);
    }

    #[test]
    fn test_apply_image_aspect_ignores_removed_modules() {
        let ctrl = controller();
        assert!(ctrl.apply_image_aspect(&ModuleId::new("osc"), 0.5));
        let height = ctrl.patch().borrow().module(&ModuleId::new("osc")).map(|m| m.height);
        assert_eq!(height, Some(module_height(5, 0.5, &EditorConfig::default())));

        ctrl.remove_module(&ModuleId::new("osc")).expect("known module");
        assert!(!ctrl.apply_image_aspect(&ModuleId::new("osc"), 0.5));
    }

    // ========================================================================
    // Module drag
    // ========================================================================

    #[test]
    fn test_drag_from_catalog_and_drop() {
        let ctrl = controller();
        let recorder = Rc::new(Recorder::default());
        ctrl.set_observer(recorder.clone());
        ctrl.begin_module_drag(DragSource::Catalog("vco".into()));

        // Local x = 26 + 20 * 8.75 centres a 5-wide module on column 6.
        let local_x = 26.0 + 20.0 * 8.75;
        let placement = ctrl.module_drag_over(Point::new(local_x * 0.8, 100.0));
        assert_eq!(placement.valid().map(|p| p.x), Some(6));

        let id = ctrl.drop_module().expect("drop").expect("placed");
        assert_eq!(ctrl.patch().borrow().module(&id).map(|m| m.x), Some(6));
        assert_eq!(recorder.events.borrow().as_slice(), ["valid 6"]);
        assert_eq!(ctrl.module_placement(), Placement::None);
    }

    #[test]
    fn test_drag_off_every_board_has_no_preview() {
        let ctrl = controller();
        ctrl.begin_module_drag(DragSource::Module(ModuleId::new("osc")));
        assert_eq!(ctrl.module_drag_over(Point::new(100.0, 350.0)), Placement::None);
        assert_eq!(ctrl.drop_module().expect("drop"), None);
    }

    #[test]
    fn test_drop_on_invalid_preview_does_nothing() {
        let ctrl = controller();
        ctrl.begin_module_drag(DragSource::Module(ModuleId::new("filt")));
        let placement = ctrl.module_drag_over(Point::new(30.0, 100.0));
        assert_eq!(placement.preview().map(|p| p.valid), Some(false));
        assert_eq!(ctrl.drop_module().expect("drop"), None);
        let board = ctrl.patch().borrow().module(&ModuleId::new("filt")).map(|m| m.board_id.clone());
        assert_eq!(board, Some(BoardId::new("b2")));
    }

    // ========================================================================
    // Cable gesture
    // ========================================================================

    #[test]
    fn test_cable_between_boards() {
        let ctrl = controller();
        let from = PinId::output("osc", 0, 0);
        let to = PinId::input("filt", 0, 0);

        let started = ctrl.pin_pressed(&from, screen_of(&ctrl, &from));
        assert!(matches!(started, GestureOutcome::Started { picked_up: None, .. }));
        assert!(!ctrl.ghost_path().is_empty());

        let outcome = ctrl.pointer_released(screen_of(&ctrl, &to));
        assert!(matches!(outcome, GestureOutcome::Connected(_)));
        assert!(ctrl.ghost_path().is_empty());
        assert!(ctrl.patch().borrow().cables.between(&from, &to).is_some());
        assert_eq!(ctrl.cable_paths().len(), 1);
    }

    #[test]
    fn test_release_away_from_pins_cancels() {
        let ctrl = controller();
        let from = PinId::output("osc", 0, 0);
        ctrl.pin_pressed(&from, screen_of(&ctrl, &from));
        assert_eq!(ctrl.pointer_released(Point::new(1100.0, 1500.0)), GestureOutcome::Cancelled);
        assert!(ctrl.patch().borrow().cables.is_empty());
        assert!(!ctrl.is_dragging_cable());
    }

    #[test]
    fn test_pick_up_and_toggle_off() {
        let ctrl = controller();
        let from = PinId::output("osc", 0, 0);
        let to = PinId::input("filt", 0, 0);
        ctrl.patch().borrow_mut().cables.insert(from.clone(), to.clone(), "red");
        ctrl.rebuild_registry();

        // Pressing the input lifts the cable and anchors at the output.
        let started = ctrl.pin_pressed(&to, screen_of(&ctrl, &to));
        assert!(matches!(started, GestureOutcome::Started { ref anchor, picked_up: Some(_) } if *anchor == from));
        assert!(ctrl.patch().borrow().cables.is_empty());

        // Re-dropping on the same input recreates it.
        ctrl.pointer_released(screen_of(&ctrl, &to));
        assert_eq!(ctrl.patch().borrow().cables.len(), 1);
    }

    #[test]
    fn test_removing_anchor_module_cancels_gesture() {
        let ctrl = controller();
        let from = PinId::output("osc", 0, 0);
        ctrl.pin_pressed(&from, screen_of(&ctrl, &from));
        ctrl.remove_module(&ModuleId::new("osc")).expect("known module");
        assert!(!ctrl.is_dragging_cable());
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    #[test]
    fn test_failed_load_leaves_state_untouched() {
        let ctrl = controller();
        assert!(ctrl.load("{ not json").is_err());
        assert!(ctrl.load(r#"{ "modules": [] }"#).is_err());
        assert_eq!(ctrl.patch().borrow().modules.len(), 2);
        assert_eq!(ctrl.registry().snapshot().pin_count(), 4);
    }

    #[test]
    fn test_save_then_load() {
        let ctrl = controller();
        let json = ctrl.save().expect("serializes");
        ctrl.remove_board(&BoardId::new("b1")).expect("known board");
        ctrl.load(&json).expect("loads");
        assert_eq!(ctrl.patch().borrow().boards.len(), 2);
        assert!(ctrl.instructions(None).contains("2x VCO"));
    }

    #[test]
    fn test_callbacks_parse_ids_once() {
        let ctrl = controller();
        let pressed = ctrl.pin_pressed_callback();
        pressed("garbage".into(), 0.0, 0.0);
        assert!(!ctrl.is_dragging_cable());

        let from = PinId::output("osc", 0, 0);
        let at = screen_of(&ctrl, &from);
        pressed(from.to_string().into(), at.x, at.y);
        assert!(ctrl.is_dragging_cable());
        ctrl.cancel_cable_gesture();
    }
}
