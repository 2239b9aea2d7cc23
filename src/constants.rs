//! Shared crate-wide constants.
//!
//! These are the compiled-in defaults. `OverlayConfig` carries them at
//! runtime and the binary lets each one be overridden from the command line.

use std::time::Duration;

/// Number of chord cards kept on screen, and therefore the number of pooled
/// surfaces created at startup.
pub const STACK_MAX_SIZE: usize = 6;

/// How long a card survives after its last activity before the idle sweep
/// removes it.
pub const MAX_LIVE_TIME: Duration = Duration::from_millis(3000);

/// Period of the refresh timer: press-state refresh, idle sweep and surface
/// reconciliation.
pub const CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Period of the slower, eviction-only timer.
pub const EVICT_INTERVAL: Duration = Duration::from_millis(500);

/// Distance, in physical pixels, between the card tower and the bottom-right
/// corner of the monitor. Applied to both axes.
pub const BOTTOM_MARGIN: u32 = 200;

/// Vertical gap between two stacked cards.
pub const EVENT_ITEM_MARGIN: u32 = 12;

/// Inner padding around each key label inside a card.
pub const EVENT_ITEM_PADDING: u32 = 12;

/// Border thickness a measured card is padded by on every side.
pub const BORDER_SIZE: u32 = 2;

/// Labels that keep the newest card alive while they are held, even when no
/// new input arrives.
pub const STICKY_LABELS: [&str; 3] = ["LeftClick", "RightClick", "WheelClick"];

/// Edge distance used by the terminal host, where one cell stands in for one
/// pixel and the pixel defaults would push every card off screen.
pub const TERMINAL_MARGIN: u32 = 1;

/// Gap between stacked cards in the terminal host.
pub const TERMINAL_GAP: u32 = 0;
