//! Pin registry shared between the board renderer and the cable engine.
//!
//! The registry holds, per board, the flat table of every pin's board-local
//! position. It is owned by the editor and handed to readers as a
//! [`PinRegistryHandle`]. Writers publish whole boards; readers take an
//! immutable [`Rc`] snapshot, so a reader never observes a half-rebuilt table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::model::{BoardId, PinId};
use crate::transform::Point;

/// One pin, resolved to board-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PinEntry {
    pub id: PinId,
    pub position: Point,
    /// Title of the pin's group.
    pub label: String,
}

/// All pins of one board, in generation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardPins {
    entries: Vec<PinEntry>,
    index: HashMap<PinId, usize>,
}

impl BoardPins {
    pub fn new(entries: Vec<PinEntry>) -> Self {
        let index = entries.iter().enumerate().map(|(i, e)| (e.id.clone(), i)).collect();
        Self { entries, index }
    }

    pub fn get(&self, pin: &PinId) -> Option<&PinEntry> {
        self.index.get(pin).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PinEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable snapshot of every board's pins, in board order.
#[derive(Debug, Clone, Default)]
pub struct PinRegistry {
    boards: Vec<(BoardId, Rc<BoardPins>)>,
}

impl PinRegistry {
    pub fn board(&self, board: &BoardId) -> Option<&BoardPins> {
        self.boards.iter().find(|(id, _)| id == board).map(|(_, pins)| pins.as_ref())
    }

    /// Boards in scan order.
    pub fn boards(&self) -> impl Iterator<Item = (&BoardId, &BoardPins)> {
        self.boards.iter().map(|(id, pins)| (id, pins.as_ref()))
    }

    /// Find a pin on any board.
    pub fn find(&self, pin: &PinId) -> Option<(&BoardId, &PinEntry)> {
        self.boards
            .iter()
            .find_map(|(id, pins)| pins.get(pin).map(|entry| (id, entry)))
    }

    pub fn contains(&self, pin: &PinId) -> bool {
        self.find(pin).is_some()
    }

    pub fn pin_count(&self) -> usize {
        self.boards.iter().map(|(_, pins)| pins.len()).sum()
    }
}

/// Shared handle to the current registry snapshot.
///
/// Cloning the handle shares the registry; publishing through any clone is
/// seen by every other.
#[derive(Debug, Clone, Default)]
pub struct PinRegistryHandle {
    current: Rc<RefCell<Rc<PinRegistry>>>,
}

impl PinRegistryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Later publications do not affect it.
    pub fn snapshot(&self) -> Rc<PinRegistry> {
        self.current.borrow().clone()
    }

    /// Replace one board's table wholesale, appending the board if it is new.
    pub fn publish(&self, board: BoardId, pins: BoardPins) {
        tracing::trace!(board = %board, pins = pins.len(), "publishing board pins");
        let mut next = PinRegistry::clone(&self.snapshot());
        let pins = Rc::new(pins);
        match next.boards.iter_mut().find(|(id, _)| *id == board) {
            Some(slot) => slot.1 = pins,
            None => next.boards.push((board, pins)),
        }
        *self.current.borrow_mut() = Rc::new(next);
    }

    /// Replace the whole registry in one step.
    pub fn publish_all(&self, boards: Vec<(BoardId, BoardPins)>) {
        tracing::trace!(boards = boards.len(), "publishing pin registry");
        let boards = boards.into_iter().map(|(id, pins)| (id, Rc::new(pins))).collect();
        *self.current.borrow_mut() = Rc::new(PinRegistry { boards });
    }

    pub fn remove(&self, board: &BoardId) {
        let mut next = PinRegistry::clone(&self.snapshot());
        next.boards.retain(|(id, _)| id != board);
        *self.current.borrow_mut() = Rc::new(next);
    }

    pub fn clear(&self) {
        *self.current.borrow_mut() = Rc::new(PinRegistry::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pin: PinId, x: f32, y: f32) -> PinEntry {
        PinEntry {
            id: pin,
            position: Point::new(x, y),
            label: "In".into(),
        }
    }

    #[test]
    fn test_publish_replaces_board_wholesale() {
        let handle = PinRegistryHandle::new();
        let board = BoardId::new("b");
        handle.publish(
            board.clone(),
            BoardPins::new(vec![entry(PinId::input("m1", 0, 0), 1.0, 1.0), entry(PinId::input("m2", 0, 0), 2.0, 2.0)]),
        );
        handle.publish(board.clone(), BoardPins::new(vec![entry(PinId::input("m2", 0, 0), 5.0, 5.0)]));

        let registry = handle.snapshot();
        assert!(!registry.contains(&PinId::input("m1", 0, 0)));
        assert_eq!(
            registry.find(&PinId::input("m2", 0, 0)).map(|(_, e)| e.position),
            Some(Point::new(5.0, 5.0))
        );
        assert_eq!(registry.pin_count(), 1);
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let handle = PinRegistryHandle::new();
        let before = handle.snapshot();
        handle.publish(BoardId::new("b"), BoardPins::new(vec![entry(PinId::input("m1", 0, 0), 0.0, 0.0)]));
        assert_eq!(before.pin_count(), 0);
        assert_eq!(handle.snapshot().pin_count(), 1);
    }

    #[test]
    fn test_clones_share_registry() {
        let writer = PinRegistryHandle::new();
        let reader = writer.clone();
        writer.publish(BoardId::new("b"), BoardPins::new(vec![entry(PinId::input("m1", 0, 0), 0.0, 0.0)]));
        assert!(reader.snapshot().contains(&PinId::input("m1", 0, 0)));
    }

    #[test]
    fn test_board_order_is_publication_order() {
        let handle = PinRegistryHandle::new();
        handle.publish(BoardId::new("a"), BoardPins::default());
        handle.publish(BoardId::new("b"), BoardPins::default());
        handle.publish(BoardId::new("a"), BoardPins::default());
        let order: Vec<String> = handle.snapshot().boards().map(|(id, _)| id.to_string()).collect();
        assert_eq!(order, vec!["a", "b"]);

        handle.remove(&BoardId::new("a"));
        assert_eq!(handle.snapshot().boards().count(), 1);
    }
}
