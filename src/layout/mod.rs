//! Card geometry: measuring each live entry and stacking the cards into a
//! right-aligned tower that grows upward from the bottom-right corner.

use crate::chord::{KeyPress, StackEntry};
use crate::config::OverlayConfig;
use crate::constants::{BORDER_SIZE, EVENT_ITEM_MARGIN, EVENT_ITEM_PADDING};

/// Signed screen position of a card's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Primary display geometry in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Monitor {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

pub trait MonitorSource {
    /// `None` while the display is unavailable; layout is skipped that tick.
    fn primary_monitor(&self) -> Option<Monitor>;
}

pub trait Measure {
    /// Logical bounding box of a card showing `keys`, or `None` when the
    /// renderer cannot measure yet.
    fn measure(&self, keys: &[KeyPress]) -> Option<Size>;
}

impl<T: MonitorSource + ?Sized> MonitorSource for &T {
    fn primary_monitor(&self) -> Option<Monitor> {
        (**self).primary_monitor()
    }
}

impl<T: Measure + ?Sized> Measure for &T {
    fn measure(&self, keys: &[KeyPress]) -> Option<Size> {
        (**self).measure(keys)
    }
}

/// Logical-pixel estimate for hosts without a text renderer.
///
/// Each key is a chip of `glyph_width` per character plus padding on both
/// sides; chips are `EVENT_ITEM_MARGIN` apart and the card adds `BORDER_SIZE`
/// on every side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatedMeasure {
    pub glyph_width: u32,
    pub line_height: u32,
}

impl Default for EstimatedMeasure {
    fn default() -> Self {
        Self {
            glyph_width: 9,
            line_height: 18,
        }
    }
}

impl Measure for EstimatedMeasure {
    fn measure(&self, keys: &[KeyPress]) -> Option<Size> {
        if keys.is_empty() {
            return None;
        }
        let chips: u32 = keys
            .iter()
            .map(|k| k.label.chars().count() as u32 * self.glyph_width + 2 * EVENT_ITEM_PADDING)
            .sum();
        let gaps = (keys.len() as u32 - 1) * EVENT_ITEM_MARGIN;
        Some(Size::new(
            chips + gaps + 2 * BORDER_SIZE,
            self.line_height + 2 * EVENT_ITEM_PADDING + 2 * BORDER_SIZE,
        ))
    }
}

/// Physical size of `entry` on `monitor`. [`Size::ZERO`] means "not ready":
/// the entry must not be shown yet.
pub fn measure_entry<M: Measure + ?Sized>(
    entry: &StackEntry,
    monitor: &Monitor,
    measure: &M,
) -> Size {
    let Some(logical) = measure.measure(&entry.keys) else {
        return Size::ZERO;
    };
    let scale = if monitor.scale_factor.is_finite() && monitor.scale_factor > 0.0 {
        monitor.scale_factor
    } else {
        1.0
    };
    // Truncate like the renderer does when it snaps to whole pixels.
    Size {
        width: (logical.width as f64 * scale) as u32,
        height: (logical.height as f64 * scale) as u32,
    }
}

/// Measure and position every entry.
///
/// Cards are right-aligned `margin` pixels from the right edge. The newest
/// card sits `margin` pixels above the bottom edge and each older card is
/// placed `gap` pixels above the previous card's top edge. Entries that could
/// not be measured keep a zero size and take no room in the tower.
pub fn layout<M: Measure + ?Sized>(
    entries: &mut [StackEntry],
    monitor: &Monitor,
    measure: &M,
    config: &OverlayConfig,
) {
    let margin = config.margin as i64;
    let gap = config.gap as i64;
    let right = monitor.width as i64 - margin;
    let mut bottom = monitor.height as i64 - margin;

    for entry in entries.iter_mut().rev() {
        let size = measure_entry(entry, monitor, measure);
        entry.w = size.width;
        entry.h = size.height;
        if size.is_empty() {
            entry.x = 0;
            entry.y = 0;
            continue;
        }
        let top = bottom - size.height as i64;
        entry.x = clamp_i32(right - size.width as i64);
        entry.y = clamp_i32(top);
        bottom = top - gap;
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
