//! Patch data model: breadboards, placed modules, pin identifiers and cables.
//!
//! A [`Patch`] owns everything that is persisted. Derived state such as pin
//! positions lives in the [`registry`](crate::registry) and is rebuilt from
//! the patch whenever placement changes.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cables::CableSet;
use crate::error::{PatchError, PatchResult, PinIdError};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a fresh random (UUID v4) identifier.
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a breadboard.
    BoardId
);
string_id!(
    /// Identifier of a placed module instance.
    ModuleId
);
string_id!(
    /// Identifier of a cable.
    CableId
);

/// Direction of a pin group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoKind {
    Input,
    Output,
}

impl IoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IoKind::Input => "input",
            IoKind::Output => "output",
        }
    }
}

impl FromStr for IoKind {
    type Err = PinIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(IoKind::Input),
            "output" => Ok(IoKind::Output),
            other => Err(PinIdError::UnknownIo(other.to_owned())),
        }
    }
}

/// Globally unique address of a single sub-pin:
/// `{moduleId}:{input|output}:{groupIndex}:{subPinIndex}`.
///
/// Parsed once at the boundary (pointer events, patch files); everything
/// downstream works with the structured form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PinId {
    pub module: ModuleId,
    pub io: IoKind,
    pub group: usize,
    pub pin: usize,
}

impl PinId {
    pub fn new(module: ModuleId, io: IoKind, group: usize, pin: usize) -> Self {
        Self { module, io, group, pin }
    }

    pub fn input(module: impl Into<ModuleId>, group: usize, pin: usize) -> Self {
        Self::new(module.into(), IoKind::Input, group, pin)
    }

    pub fn output(module: impl Into<ModuleId>, group: usize, pin: usize) -> Self {
        Self::new(module.into(), IoKind::Output, group, pin)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.module, self.io.as_str(), self.group, self.pin)
    }
}

impl FromStr for PinId {
    type Err = PinIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split from the right so the module id itself may contain ':'.
        let mut parts = s.rsplitn(4, ':');
        let (Some(pin), Some(group), Some(io), Some(module)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(PinIdError::Malformed(s.to_owned()));
        };
        if module.is_empty() {
            return Err(PinIdError::Malformed(s.to_owned()));
        }
        let parse_index = |v: &str| v.parse::<usize>().map_err(|_| PinIdError::BadIndex(v.to_owned()));
        Ok(PinId {
            module: ModuleId::new(module),
            io: io.parse()?,
            group: parse_index(group)?,
            pin: parse_index(pin)?,
        })
    }
}

impl TryFrom<String> for PinId {
    type Error = PinIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PinId> for String {
    fn from(value: PinId) -> Self {
        value.to_string()
    }
}

/// Normalised position of one sub-pin inside its module, both axes in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubPin {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

/// A titled cluster of sub-pins (a stereo input has two).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PinGroup {
    #[serde(default, alias = "label")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Explicit sub-pin geometry. `None` (or empty) selects automatic layout.
    #[serde(default)]
    pub pins: Option<Vec<SubPin>>,
}

impl PinGroup {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_pins(title: impl Into<String>, pins: Vec<SubPin>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            pins: Some(pins),
        }
    }

    /// Explicit sub-pins, if any were supplied.
    pub fn explicit_pins(&self) -> Option<&[SubPin]> {
        self.pins.as_deref().filter(|pins| !pins.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Knob {
    pub title: String,
    pub description: String,
    /// Position in `[0, 1]`.
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub title: String,
    pub description: String,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    #[serde(rename = "type")]
    pub board_type: String,
}

impl Board {
    pub fn new(board_type: impl Into<String>) -> Self {
        Self {
            id: BoardId::random(),
            board_type: board_type.into(),
        }
    }
}

/// A module placed on a breadboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInstance {
    pub id: ModuleId,
    pub module_type: String,
    pub board_id: BoardId,
    /// Leftmost occupied grid column.
    pub x: i32,
    /// Kept for the patch file; modules are bottom-aligned on the board.
    pub y: i32,
    /// Width in grid columns, at least 1.
    pub width: u32,
    /// Height in board-local pixels.
    pub height: f32,
    pub inputs: Vec<PinGroup>,
    pub outputs: Vec<PinGroup>,
    pub knobs: Vec<Knob>,
    pub switches: Vec<Switch>,
    pub legs_pattern: Option<String>,
}

impl ModuleInstance {
    /// Occupied column range `[x, x + width)`.
    pub fn columns(&self) -> Range<i32> {
        self.x..self.x.saturating_add(i32::try_from(self.width).unwrap_or(i32::MAX))
    }

    pub fn groups(&self, io: IoKind) -> &[PinGroup] {
        match io {
            IoKind::Input => &self.inputs,
            IoKind::Output => &self.outputs,
        }
    }

    /// Title of the pin group a pin belongs to.
    pub fn group_title(&self, pin: &PinId) -> Option<&str> {
        self.groups(pin.io).get(pin.group).map(|g| g.title.as_str())
    }
}

/// Direction for [`Patch::move_board`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// What a cascading removal took with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Removed {
    pub boards: Vec<BoardId>,
    pub modules: Vec<ModuleId>,
    pub cables: Vec<CableId>,
}

/// The complete persisted state of the editor.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub boards: Vec<Board>,
    pub modules: Vec<ModuleInstance>,
    pub cables: CableSet,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self, id: &BoardId) -> Option<&Board> {
        self.boards.iter().find(|b| &b.id == id)
    }

    pub fn module(&self, id: &ModuleId) -> Option<&ModuleInstance> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn module_mut(&mut self, id: &ModuleId) -> Option<&mut ModuleInstance> {
        self.modules.iter_mut().find(|m| &m.id == id)
    }

    /// Modules on a board, in insertion order.
    pub fn modules_on<'a>(&'a self, board: &BoardId) -> impl Iterator<Item = &'a ModuleInstance> + 'a {
        let board = board.clone();
        self.modules.iter().filter(move |m| m.board_id == board)
    }

    pub fn add_board(&mut self, board: Board) -> BoardId {
        let id = board.id.clone();
        self.boards.push(board);
        id
    }

    /// Remove a board, every module on it and every cable touching those modules.
    pub fn remove_board(&mut self, id: &BoardId) -> PatchResult<Removed> {
        if self.board(id).is_none() {
            return Err(PatchError::UnknownBoard(id.clone()));
        }
        let doomed: HashSet<ModuleId> = self.modules_on(id).map(|m| m.id.clone()).collect();

        self.boards.retain(|b| &b.id != id);
        self.modules.retain(|m| !doomed.contains(&m.id));
        let cables = self.cables.remove_touching_modules(&doomed);

        let mut modules: Vec<ModuleId> = doomed.into_iter().collect();
        modules.sort();
        Ok(Removed {
            boards: vec![id.clone()],
            modules,
            cables,
        })
    }

    /// Remove a module and every cable touching it.
    pub fn remove_module(&mut self, id: &ModuleId) -> PatchResult<Removed> {
        if self.module(id).is_none() {
            return Err(PatchError::UnknownModule(id.clone()));
        }
        self.modules.retain(|m| &m.id != id);
        let doomed = HashSet::from([id.clone()]);
        let cables = self.cables.remove_touching_modules(&doomed);
        Ok(Removed {
            boards: Vec::new(),
            modules: vec![id.clone()],
            cables,
        })
    }

    /// Swap a board with its neighbour. Returns `false` at either end of the stack.
    pub fn move_board(&mut self, id: &BoardId, direction: MoveDirection) -> bool {
        let Some(index) = self.boards.iter().position(|b| &b.id == id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.boards.len() => index + 1,
            _ => return false,
        };
        self.boards.swap(index, target);
        true
    }

    /// Set a knob by title, clamping to `[0, 1]`. Returns `false` if nothing matched.
    pub fn set_knob(&mut self, module: &ModuleId, title: &str, value: f32) -> bool {
        let Some(knob) = self
            .module_mut(module)
            .and_then(|m| m.knobs.iter_mut().find(|k| k.title == title))
        else {
            return false;
        };
        knob.value = value.clamp(0.0, 1.0);
        true
    }

    /// Set a switch by title. Returns `false` if nothing matched.
    pub fn set_switch(&mut self, module: &ModuleId, title: &str, value: bool) -> bool {
        let Some(switch) = self
            .module_mut(module)
            .and_then(|m| m.switches.iter_mut().find(|s| s.title == title))
        else {
            return false;
        };
        switch.value = value;
        true
    }
}
