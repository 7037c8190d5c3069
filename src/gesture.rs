//! Pointer gestures that create, remove and re-route cables.
//!
//! A gesture runs `Idle -> Dragging -> (Connected | Cancelled) -> Idle`.
//! Pointer capture (the gesture-scoped move/up listeners) is acquired when a
//! gesture starts and released on every path that ends it.

use rand::Rng;

use crate::cables::{Cable, CableSet, ConnectOutcome};
use crate::model::PinId;
use crate::observer::EditorObserver;
use crate::registry::PinRegistry;
use crate::transform::Point;

/// Gesture-scoped pointer listeners.
pub trait PointerCapture {
    /// Start receiving move/up events for the gesture.
    fn capture(&mut self);
    /// Stop receiving them.
    fn release(&mut self);
}

/// Capture for hosts that route pointer events themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn capture(&mut self) {}
    fn release(&mut self) {}
}

/// The in-flight cable drawn as a ghost while dragging.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCable {
    pub from: PinId,
    /// Pointer position in container coordinates, if known.
    pub pointer: Option<Point>,
    /// Pin the pointer currently snaps to.
    pub hover: Option<PinId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(PendingCable),
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Nothing happened.
    Ignored,
    /// A gesture started; `picked_up` is the cable removed from the pin, if any.
    Started { anchor: PinId, picked_up: Option<Cable> },
    /// The pending cable followed the pointer.
    Moved,
    /// The gesture ended on a pin.
    Connected(ConnectOutcome),
    /// The gesture ended without a connection.
    Cancelled,
}

/// Cable gesture state machine.
#[derive(Debug, Clone, Default)]
pub struct CableGesture {
    state: GestureState,
}

impl CableGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingCable> {
        match &self.state {
            GestureState::Idle => None,
            GestureState::Dragging(pending) => Some(pending),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Pointer pressed on `pin`.
    ///
    /// A free pin anchors a new pending cable. A pin that already has a
    /// cable lifts the first one off immediately and anchors the pending
    /// cable at that cable's far end. Pins missing from the registry, far
    /// ends missing from it, and presses during a running gesture are ignored.
    pub fn pointer_down(
        &mut self,
        pin: &PinId,
        pointer: Option<Point>,
        registry: &PinRegistry,
        cables: &mut CableSet,
        capture: &mut dyn PointerCapture,
        observer: &dyn EditorObserver,
    ) -> GestureOutcome {
        let (outcome, event) = self.begin(pin, pointer, registry, cables);
        announce(event, capture, observer);
        outcome
    }

    /// Pointer moved; `hover` is the nearest pin within snap distance.
    ///
    /// A hover on the anchor itself is dropped, so releasing there cancels.
    pub fn pointer_move(&mut self, pointer: Option<Point>, hover: Option<PinId>) -> GestureOutcome {
        let GestureState::Dragging(pending) = &mut self.state else {
            return GestureOutcome::Ignored;
        };
        pending.pointer = pointer;
        pending.hover = hover.filter(|pin| pin != &pending.from);
        GestureOutcome::Moved
    }

    /// Pointer released; `target` is the nearest pin within snap distance.
    pub fn pointer_up<R: Rng + ?Sized>(
        &mut self,
        target: Option<PinId>,
        cables: &mut CableSet,
        rng: &mut R,
        capture: &mut dyn PointerCapture,
        observer: &dyn EditorObserver,
    ) -> GestureOutcome {
        let (outcome, event) = self.finish(target, cables, rng);
        announce(event, capture, observer);
        outcome
    }

    /// Abort a running gesture (focus loss, board removed under the pointer).
    pub fn cancel(&mut self, capture: &mut dyn PointerCapture, observer: &dyn EditorObserver) -> GestureOutcome {
        let (outcome, event) = self.abort();
        announce(event, capture, observer);
        outcome
    }

    /// [`pointer_down`](Self::pointer_down) without the notifications.
    ///
    /// Hosts that keep the cable set behind a borrow use this and
    /// [`GestureEvent::announce`] once the borrow is released.
    pub fn begin(
        &mut self,
        pin: &PinId,
        pointer: Option<Point>,
        registry: &PinRegistry,
        cables: &mut CableSet,
    ) -> (GestureOutcome, Option<GestureEvent>) {
        if self.is_dragging() || !registry.contains(pin) {
            return (GestureOutcome::Ignored, None);
        }

        let attached = cables.attached_to(pin).next().cloned();
        let (anchor, picked_up) = match attached {
            Some(cable) => {
                let Some(other) = cable.other_end(pin).cloned() else {
                    return (GestureOutcome::Ignored, None);
                };
                if !registry.contains(&other) {
                    return (GestureOutcome::Ignored, None);
                }
                cables.remove(&cable.id);
                (other, Some(cable))
            }
            None => (pin.clone(), None),
        };

        self.state = GestureState::Dragging(PendingCable {
            from: anchor.clone(),
            pointer,
            hover: None,
        });
        let event = GestureEvent::Started {
            anchor: anchor.clone(),
            picked_up: picked_up.clone(),
        };
        (GestureOutcome::Started { anchor, picked_up }, Some(event))
    }

    /// [`pointer_up`](Self::pointer_up) without the notifications.
    pub fn finish<R: Rng + ?Sized>(
        &mut self,
        target: Option<PinId>,
        cables: &mut CableSet,
        rng: &mut R,
    ) -> (GestureOutcome, Option<GestureEvent>) {
        let GestureState::Dragging(pending) = std::mem::take(&mut self.state) else {
            return (GestureOutcome::Ignored, None);
        };
        let from = pending.from;

        match target.filter(|pin| pin != &from) {
            Some(to) => {
                let outcome = cables.connect(from.clone(), to.clone(), rng);
                let event = match &outcome {
                    ConnectOutcome::Created(cable) => GestureEvent::Committed {
                        from,
                        to,
                        created: Some(cable.clone()),
                    },
                    ConnectOutcome::Removed(_) => GestureEvent::Committed { from, to, created: None },
                    ConnectOutcome::Rejected => GestureEvent::Cancelled { anchor: from },
                };
                (GestureOutcome::Connected(outcome), Some(event))
            }
            None => (GestureOutcome::Cancelled, Some(GestureEvent::Cancelled { anchor: from })),
        }
    }

    /// [`cancel`](Self::cancel) without the notifications.
    pub fn abort(&mut self) -> (GestureOutcome, Option<GestureEvent>) {
        let GestureState::Dragging(pending) = std::mem::take(&mut self.state) else {
            return (GestureOutcome::Ignored, None);
        };
        (GestureOutcome::Cancelled, Some(GestureEvent::Cancelled { anchor: pending.from }))
    }
}

/// A gesture transition still to be reported to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Started { anchor: PinId, picked_up: Option<Cable> },
    Committed { from: PinId, to: PinId, created: Option<Cable> },
    Cancelled { anchor: PinId },
}

impl GestureEvent {
    /// Acquire or release pointer capture for this transition.
    pub fn apply_capture(&self, capture: &mut dyn PointerCapture) {
        match self {
            GestureEvent::Started { .. } => capture.capture(),
            GestureEvent::Committed { .. } | GestureEvent::Cancelled { .. } => capture.release(),
        }
    }

    pub fn notify(&self, observer: &dyn EditorObserver) {
        match self {
            GestureEvent::Started { anchor, picked_up } => observer.gesture_started(anchor, picked_up.as_ref()),
            GestureEvent::Committed { from, to, created } => observer.gesture_committed(from, to, created.as_ref()),
            GestureEvent::Cancelled { anchor } => observer.gesture_cancelled(anchor),
        }
    }

    /// Capture first, then the observer.
    pub fn announce(&self, capture: &mut dyn PointerCapture, observer: &dyn EditorObserver) {
        self.apply_capture(capture);
        self.notify(observer);
    }
}

fn announce(event: Option<GestureEvent>, capture: &mut dyn PointerCapture, observer: &dyn EditorObserver) {
    if let Some(event) = event {
        event.announce(capture, observer);
    }
}
