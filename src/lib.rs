//! Live keystroke and mouse chord overlay.
//!
//! Raw input is folded into a set of held keys, each change becomes a chord
//! card on a small time-decaying stack, and every live card is bound to one
//! surface of a fixed pool, measured and positioned above the bottom-right
//! corner of the screen.

pub mod chord;
pub mod config;
pub mod constants;
pub mod debug_log;
pub mod drivers;
pub mod engine;
pub mod event_loop;
pub mod input;
pub mod layout;
pub mod runner;
pub mod theme;
pub mod tracing_sub;
pub mod ui;
pub mod window;

pub use config::{ConfigError, OverlayConfig};
pub use engine::{ChordEngine, ReconcileReport};
pub use input::RawInputEvent;
