//! Level 2: Placement Tests
//!
//! Tests placement validation on the 830-point board: centring under the
//! pointer, overlap, leg/power-rail alignment, and the module drag workflow.

mod common;

use common::harness::PatchHarness;
use common::{board, layouts, BOARD_TYPE, COLUMNS};
use slint::Model;
use slint_patch_editor::{
    cell_highlight, validate_at_column, validate_at_pointer, Candidate, CellHighlight, DragSource, EditorConfig,
    ModuleId, ModuleInstance, Placement, PinGroup,
};

fn placed(id: &str, x: i32, width: u32) -> ModuleInstance {
    ModuleInstance {
        id: ModuleId::new(id),
        module_type: "vco".into(),
        board_id: board("b1"),
        x,
        y: 0,
        width,
        height: 200.0,
        inputs: vec![PinGroup::titled("In")],
        outputs: Vec::new(),
        knobs: Vec::new(),
        switches: Vec::new(),
        legs_pattern: None,
    }
}

/// Reference predicate: no overlap and every leg on a power pin.
fn expected_valid(x: i32, width: u32, legs: &[u32], others: &[ModuleInstance]) -> bool {
    let end = x + width as i32;
    let in_bounds = x >= 0 && end <= COLUMNS as i32;
    let free = others.iter().all(|m| end <= m.x || m.x + m.width as i32 <= x);
    let on_rail = legs.iter().all(|&leg| {
        let col = x + leg as i32;
        (0..COLUMNS as i32).contains(&col) && col % 6 != 5
    });
    in_bounds && free && on_rail
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_width_five_module_at_column_three() {
    let source = layouts();
    let layout = source.get(BOARD_TYPE).expect("fixture layout");
    let config = EditorConfig::default();

    // Pointer centred over columns 3..8.
    let local_x = config.grid_padding + (3.0 + 2.5 + 0.25) * config.column_pitch();
    let placement = validate_at_pointer(
        &board("b1"),
        Some(layout),
        &Vec::new(),
        &Candidate::new(5, None),
        Some(local_x),
        &config,
    );

    let preview = placement.preview().expect("a preview is drawn");
    assert_eq!(preview.x, 3);
    assert!(preview.valid);
    assert_eq!(preview.legs, vec![0, 4]);
}

#[test]
fn test_validity_matches_reference_for_every_column() {
    let source = layouts();
    let layout = source.get(BOARD_TYPE).expect("fixture layout");
    let config = EditorConfig::default();
    let others = vec![placed("a", 20, 6)];

    for (width, pattern) in [(5, None), (4, Some("p--p")), (3, Some("-p-")), (1, None)] {
        let candidate = Candidate::new(width, pattern);
        let last = COLUMNS as i32 - width as i32;
        for x in 0..=last {
            let preview = validate_at_column(&board("b1"), layout, &others, &candidate, x, &config);
            assert_eq!(
                preview.valid,
                expected_valid(x, width, &preview.legs, &others),
                "width {width} pattern {pattern:?} at column {x}"
            );
        }
    }
}

#[test]
fn test_boundary_columns() {
    let source = layouts();
    let layout = source.get(BOARD_TYPE).expect("fixture layout");
    let config = EditorConfig::default();
    let candidate = Candidate::new(4, None);

    // 0 and 3 are rail pins.
    assert!(validate_at_column(&board("b1"), layout, &Vec::new(), &candidate, 0, &config).valid);
    // Last column 59: legs at 59 (gap) and 62.
    let last = COLUMNS as i32 - 4;
    assert!(!validate_at_column(&board("b1"), layout, &Vec::new(), &candidate, last, &config).valid);
    assert!(!validate_at_column(&board("b1"), layout, &Vec::new(), &candidate, last + 1, &config).valid);
}

#[test]
fn test_unknown_layout_is_no_placement() {
    let config = EditorConfig::default();
    let placement = validate_at_pointer(&board("b1"), None, &Vec::new(), &Candidate::new(5, None), Some(200.0), &config);
    assert_eq!(placement, Placement::None);

    let source = layouts();
    let layout = source.get(BOARD_TYPE);
    let placement = validate_at_pointer(&board("b1"), layout, &Vec::new(), &Candidate::new(5, None), None, &config);
    assert_eq!(placement, Placement::None);
}

#[test]
fn test_cell_highlight_marks_legs_on_gaps() {
    let source = layouts();
    let layout = source.get(BOARD_TYPE).expect("fixture layout");
    let config = EditorConfig::default();
    // Legs at 2 and 5; column 5 is a bus break.
    let preview = validate_at_column(&board("b1"), layout, &Vec::new(), &Candidate::new(4, None), 2, &config);
    assert!(!preview.valid);

    let bottom = layout.rows() - 1;
    assert_eq!(cell_highlight(layout, &preview, bottom, 2), CellHighlight::Leg { valid: false });
    assert_eq!(cell_highlight(layout, &preview, bottom, 5), CellHighlight::LegOnGap { valid: false });
    assert_eq!(cell_highlight(layout, &preview, bottom, 3), CellHighlight::Footprint { valid: false });
    assert_eq!(cell_highlight(layout, &preview, 5, 3), CellHighlight::None);
}

// ============================================================================
// Drag workflow
// ============================================================================

#[test]
fn test_drag_new_module_onto_second_board() {
    let harness = PatchHarness::new();
    harness.ctrl.begin_module_drag(DragSource::Catalog("vco".into()));

    let over_mixer = harness.screen_for_column(&board("b2"), 11, 5);
    let rejected = harness.ctrl.module_drag_over(over_mixer);
    assert_eq!(rejected.preview().map(|p| p.valid), Some(false));

    let free = harness.screen_for_column(&board("b2"), 24, 5);
    let accepted = harness.ctrl.module_drag_over(free);
    assert_eq!(accepted.valid().map(|p| (p.board.clone(), p.x)), Some((board("b2"), 24)));

    let id = harness.ctrl.drop_module().expect("drop").expect("placed");
    let patch = harness.ctrl.patch();
    let patch = patch.borrow();
    let module = patch.module(&id).expect("new module");
    assert_eq!(module.board_id, board("b2"));
    assert_eq!(module.knobs.iter().map(|k| k.value).collect::<Vec<_>>(), vec![0.5, 0.5]);

    assert_eq!(*harness.tracker.rejected.borrow(), vec![11]);
    assert_eq!(*harness.tracker.validated.borrow(), vec![24]);
}

#[test]
fn test_move_existing_module_across_boards_keeps_cables() {
    let harness = PatchHarness::new();
    harness.ctrl.begin_module_drag(DragSource::Module(ModuleId::new("mix")));
    let target = harness.screen_for_column(&board("b1"), 12, 4);
    assert!(harness.ctrl.module_drag_over(target).valid().is_some());
    harness.ctrl.drop_module().expect("drop");

    let patch = harness.ctrl.patch();
    assert_eq!(
        patch.borrow().module(&ModuleId::new("mix")).map(|m| m.board_id.clone()),
        Some(board("b1"))
    );
    assert_eq!(patch.borrow().cables.len(), 1);
    assert_eq!(harness.cables.row_count(), 1);
}

#[test]
fn test_moving_module_may_overlap_its_own_footprint() {
    let harness = PatchHarness::new();
    harness.ctrl.begin_module_drag(DragSource::Module(ModuleId::new("mix")));
    // 13..17 overlaps the module's current 12..16.
    let nudge = harness.screen_for_column(&board("b2"), 13, 4);
    assert!(harness.ctrl.module_drag_over(nudge).valid().is_some());
    harness.ctrl.cancel_module_drag();
    assert_eq!(harness.ctrl.module_placement(), Placement::None);
}

#[test]
fn test_add_module_fills_leftmost_slot() {
    let harness = PatchHarness::new();
    let first = harness.ctrl.add_module("vco").expect("room");
    let second = harness.ctrl.add_module("vco").expect("room");

    let patch = harness.ctrl.patch();
    let patch = patch.borrow();
    assert_eq!(patch.module(&first).map(|m| m.x), Some(0));
    assert_eq!(patch.module(&second).map(|m| m.x), Some(6));
}
