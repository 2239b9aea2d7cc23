pub mod decorator;
pub mod pool;
pub mod terminal;

use std::fmt;

use thiserror::Error;

use crate::chord::{EntryId, KeyPress};
use crate::layout::{Position, Size};

pub use pool::{Assignment, Reconciliation, WindowPool, WindowSlot};
pub use terminal::{CellMeasure, TerminalMonitor, TerminalSurfaces};

/// Stable identifier of a pooled surface, `0..pool size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// What a card surface renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    pub entry: EntryId,
    pub keys: Vec<KeyPress>,
    /// Set on the newest card only; it alone highlights held keys.
    pub emphasize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotMessage {
    Update(CardContent),
    /// Drop whatever the surface showed so a reused slot cannot flash stale
    /// content.
    Clear,
}

/// One idempotent instruction for the window system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    Send { slot: SlotId, message: SlotMessage },
    SetSize { slot: SlotId, size: Size },
    SetPosition { slot: SlotId, position: Position },
    Show(SlotId),
    Hide(SlotId),
}

impl SurfaceCommand {
    pub fn slot(&self) -> SlotId {
        match self {
            SurfaceCommand::Send { slot, .. }
            | SurfaceCommand::SetSize { slot, .. }
            | SurfaceCommand::SetPosition { slot, .. } => *slot,
            SurfaceCommand::Show(slot) | SurfaceCommand::Hide(slot) => *slot,
        }
    }
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface {0} has not been created")]
    UnknownSlot(SlotId),
    #[error("window backend error: {0}")]
    Backend(String),
}

/// Host windowing primitives for the pooled card surfaces.
///
/// Every call is fire-and-forget from the engine's point of view: failures
/// are logged and the same command is issued again on the next tick.
pub trait WindowSystem {
    /// Create the surface for `slot`. Creating an existing slot is a no-op.
    fn create(&mut self, slot: SlotId) -> Result<(), SurfaceError>;
    fn set_position(&mut self, slot: SlotId, position: Position) -> Result<(), SurfaceError>;
    fn set_size(&mut self, slot: SlotId, size: Size) -> Result<(), SurfaceError>;
    fn show(&mut self, slot: SlotId) -> Result<(), SurfaceError>;
    fn hide(&mut self, slot: SlotId) -> Result<(), SurfaceError>;
    fn send_to_slot(&mut self, slot: SlotId, message: SlotMessage) -> Result<(), SurfaceError>;

    fn apply(&mut self, command: SurfaceCommand) -> Result<(), SurfaceError> {
        match command {
            SurfaceCommand::Send { slot, message } => self.send_to_slot(slot, message),
            SurfaceCommand::SetSize { slot, size } => self.set_size(slot, size),
            SurfaceCommand::SetPosition { slot, position } => self.set_position(slot, position),
            SurfaceCommand::Show(slot) => self.show(slot),
            SurfaceCommand::Hide(slot) => self.hide(slot),
        }
    }
}

impl<T: WindowSystem + ?Sized> WindowSystem for &mut T {
    fn create(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
        (**self).create(slot)
    }

    fn set_position(&mut self, slot: SlotId, position: Position) -> Result<(), SurfaceError> {
        (**self).set_position(slot, position)
    }

    fn set_size(&mut self, slot: SlotId, size: Size) -> Result<(), SurfaceError> {
        (**self).set_size(slot, size)
    }

    fn show(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
        (**self).show(slot)
    }

    fn hide(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
        (**self).hide(slot)
    }

    fn send_to_slot(&mut self, slot: SlotId, message: SlotMessage) -> Result<(), SurfaceError> {
        (**self).send_to_slot(slot, message)
    }
}
