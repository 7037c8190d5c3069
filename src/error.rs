//! Error types for patch editing.
//!
//! Only conditions that abort an operation are errors. Per-frame conditions
//! such as an invalid placement or geometry that has not been measured yet are
//! ordinary values ([`Placement`](crate::placement::Placement), `Option`).

use thiserror::Error;

use crate::model::{BoardId, ModuleId};

/// Errors raised while parsing a board layout grid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,

    #[error("layout row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell '{ch}' at row {row}, column {col}")]
    UnknownCell { ch: char, row: usize, col: usize },
}

/// Errors raised while parsing a pin identifier string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinIdError {
    #[error("pin id '{0}' must have the form module:io:group:pin")]
    Malformed(String),

    #[error("unknown pin direction '{0}' (expected input or output)")]
    UnknownIo(String),

    #[error("invalid pin index '{0}'")]
    BadIndex(String),
}

/// Errors raised by patch operations and patch file loading.
#[derive(Error, Debug)]
pub enum PatchError {
    /// JSON parsing error from serde_json
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level key is absent from the patch file
    #[error("patch file is missing '{0}'")]
    MissingKey(&'static str),

    #[error("unknown breadboard type '{0}'")]
    UnknownBoardType(String),

    #[error("unknown breadboard {0}")]
    UnknownBoard(BoardId),

    #[error("unknown module {0}")]
    UnknownModule(ModuleId),

    #[error("no metadata for module type '{0}'")]
    UnknownModuleType(String),

    #[error("module does not fit at column {x} on breadboard {board}")]
    InvalidPlacement { board: BoardId, x: i32 },

    #[error("no free slot for module on breadboard {0}")]
    NoRoom(BoardId),

    #[error("patch has no breadboards")]
    NoBoards,

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// Result type alias for patch operations
pub type PatchResult<T> = Result<T, PatchError>;
