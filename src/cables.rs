//! Cable storage and connection semantics.
//!
//! A cable joins two distinct pins. At most one cable may exist between an
//! unordered pair of pins: connecting an already connected pair removes the
//! existing cable instead (toggle semantics). A pin may take part in any
//! number of cables.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{CableId, ModuleId, PinId};

/// A committed connection between two pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cable {
    pub id: CableId,
    pub from: PinId,
    pub to: PinId,
    /// CSS colour string, e.g. `hsl(210,80%,60%)`.
    pub color: String,
}

impl Cable {
    /// True if this cable joins `a` and `b` in either direction.
    pub fn connects(&self, a: &PinId, b: &PinId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }

    pub fn touches(&self, pin: &PinId) -> bool {
        &self.from == pin || &self.to == pin
    }

    pub fn touches_module(&self, module: &ModuleId) -> bool {
        &self.from.module == module || &self.to.module == module
    }

    /// The endpoint opposite `pin`, if `pin` is an endpoint.
    pub fn other_end(&self, pin: &PinId) -> Option<&PinId> {
        if &self.from == pin {
            Some(&self.to)
        } else if &self.to == pin {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// Result of [`CableSet::connect`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    /// A new cable was created.
    Created(Cable),
    /// The pair was already connected; that cable was removed.
    Removed(Cable),
    /// Both endpoints were the same pin; nothing changed.
    Rejected,
}

/// Random cable colour with a fixed saturation and lightness.
pub fn random_cable_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let hue: u16 = rng.gen_range(0..360);
    format!("hsl({hue},80%,60%)")
}

/// Ordered collection of cables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CableSet {
    cables: Vec<Cable>,
}

impl CableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cable> {
        self.cables.iter()
    }

    pub fn as_slice(&self) -> &[Cable] {
        &self.cables
    }

    pub fn get(&self, id: &CableId) -> Option<&Cable> {
        self.cables.iter().find(|c| &c.id == id)
    }

    /// The cable joining `a` and `b` in either direction.
    pub fn between(&self, a: &PinId, b: &PinId) -> Option<&Cable> {
        self.cables.iter().find(|c| c.connects(a, b))
    }

    /// All cables with an endpoint at `pin`, in insertion order.
    pub fn attached_to<'a>(&'a self, pin: &'a PinId) -> impl Iterator<Item = &'a Cable> + 'a {
        self.cables.iter().filter(move |c| c.touches(pin))
    }

    /// Insert a cable unconditionally (used when loading a patch).
    ///
    /// Returns `None` for a self-loop or a pair that is already connected.
    pub fn push(&mut self, cable: Cable) -> Option<&Cable> {
        if cable.from == cable.to || self.between(&cable.from, &cable.to).is_some() {
            return None;
        }
        self.cables.push(cable);
        self.cables.last()
    }

    /// Insert a cable with a fresh id and the given colour.
    pub fn insert(&mut self, from: PinId, to: PinId, color: impl Into<String>) -> Option<&Cable> {
        self.push(Cable {
            id: CableId::random(),
            from,
            to,
            color: color.into(),
        })
    }

    /// Connect `from` to `to` with toggle semantics.
    pub fn connect<R: Rng + ?Sized>(&mut self, from: PinId, to: PinId, rng: &mut R) -> ConnectOutcome {
        if from == to {
            return ConnectOutcome::Rejected;
        }
        if let Some(index) = self.cables.iter().position(|c| c.connects(&from, &to)) {
            return ConnectOutcome::Removed(self.cables.remove(index));
        }
        let cable = Cable {
            id: CableId::random(),
            from,
            to,
            color: random_cable_color(rng),
        };
        self.cables.push(cable.clone());
        ConnectOutcome::Created(cable)
    }

    pub fn remove(&mut self, id: &CableId) -> Option<Cable> {
        let index = self.cables.iter().position(|c| &c.id == id)?;
        Some(self.cables.remove(index))
    }

    /// Remove every cable with an endpoint on one of `modules`.
    pub fn remove_touching_modules(&mut self, modules: &HashSet<ModuleId>) -> Vec<CableId> {
        let mut removed = Vec::new();
        self.cables.retain(|c| {
            let doomed = modules.contains(&c.from.module) || modules.contains(&c.to.module);
            if doomed {
                removed.push(c.id.clone());
            }
            !doomed
        });
        removed
    }

    pub fn clear(&mut self) {
        self.cables.clear();
    }
}

impl<'a> IntoIterator for &'a CableSet {
    type Item = &'a Cable;
    type IntoIter = std::slice::Iter<'a, Cable>;

    fn into_iter(self) -> Self::IntoIter {
        self.cables.iter()
    }
}
