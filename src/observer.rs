//! Notifications about editor state transitions.
//!
//! The editor reports gesture and placement transitions to an
//! [`EditorObserver`]. Hosts that want an event log or debugging overlay
//! implement it; everyone else uses [`NoopObserver`] or [`TracingObserver`].

use crate::cables::Cable;
use crate::model::PinId;
use crate::placement::PlacementPreview;

/// Receives editor state transitions. Every method defaults to doing nothing.
pub trait EditorObserver {
    /// A cable gesture started at `anchor`; `picked_up` is the cable lifted off it, if any.
    fn gesture_started(&self, _anchor: &PinId, _picked_up: Option<&Cable>) {}
    /// A gesture ended on a pin: `created` is the new cable, or `None` if an existing one was toggled off.
    fn gesture_committed(&self, _from: &PinId, _to: &PinId, _created: Option<&Cable>) {}
    fn gesture_cancelled(&self, _anchor: &PinId) {}
    fn placement_validated(&self, _preview: &PlacementPreview) {}
    fn placement_rejected(&self, _preview: &PlacementPreview) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EditorObserver for NoopObserver {}

/// Observer that logs transitions with `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EditorObserver for TracingObserver {
    fn gesture_started(&self, anchor: &PinId, picked_up: Option<&Cable>) {
        tracing::debug!(%anchor, picked_up = ?picked_up.map(|c| &c.id), "cable gesture started");
    }

    fn gesture_committed(&self, from: &PinId, to: &PinId, created: Option<&Cable>) {
        tracing::debug!(%from, %to, created = created.is_some(), "cable gesture committed");
    }

    fn gesture_cancelled(&self, anchor: &PinId) {
        tracing::debug!(%anchor, "cable gesture cancelled");
    }

    fn placement_validated(&self, preview: &PlacementPreview) {
        tracing::debug!(board = %preview.board, x = preview.x, "placement valid");
    }

    fn placement_rejected(&self, preview: &PlacementPreview) {
        tracing::debug!(board = %preview.board, x = preview.x, "placement rejected");
    }
}
