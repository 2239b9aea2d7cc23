//! Terminal host for the card pool.
//!
//! The terminal plays every collaborator the engine talks to: its size is the
//! monitor (one cell per pixel, scale factor 1), cards are measured in cells by
//! the decorator, and each pooled slot is a floating card composited onto the
//! ratatui frame.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::chord::KeyPress;
use crate::layout::{Measure, Monitor, MonitorSource, Position, Size};
use crate::ui::UiFrame;

use super::decorator::{CardDecorator, CardRect, ChipDecorator};
use super::{CardContent, SlotId, SlotMessage, SurfaceError, WindowSystem};

#[derive(Debug, Clone, Default)]
struct Surface {
    position: Position,
    size: Size,
    visible: bool,
    content: Option<CardContent>,
}

/// Pooled card surfaces drawn into the terminal buffer.
#[derive(Debug)]
pub struct TerminalSurfaces {
    surfaces: BTreeMap<SlotId, Surface>,
    decorator: Arc<dyn CardDecorator>,
    dirty: bool,
}

impl Default for TerminalSurfaces {
    fn default() -> Self {
        Self::new(Arc::new(ChipDecorator::default()))
    }
}

impl TerminalSurfaces {
    pub fn new(decorator: Arc<dyn CardDecorator>) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            decorator,
            dirty: true,
        }
    }

    pub fn decorator(&self) -> Arc<dyn CardDecorator> {
        Arc::clone(&self.decorator)
    }

    /// Number of surfaces that would be drawn.
    pub fn visible_count(&self) -> usize {
        self.surfaces
            .values()
            .filter(|s| s.visible && s.content.is_some())
            .count()
    }

    pub fn is_visible(&self, slot: SlotId) -> bool {
        self.surfaces.get(&slot).is_some_and(|s| s.visible)
    }

    pub fn content(&self, slot: SlotId) -> Option<&CardContent> {
        self.surfaces.get(&slot).and_then(|s| s.content.as_ref())
    }

    /// True once since the last call if any surface changed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn render(&self, frame: &mut UiFrame<'_>) {
        let bounds = frame.area();
        for surface in self.surfaces.values() {
            let Some(content) = surface.content.as_ref() else {
                continue;
            };
            if !surface.visible || frame.clip_signed(surface.position, surface.size).is_none() {
                continue;
            }
            let rect = CardRect {
                x: surface.position.x,
                y: surface.position.y,
                width: surface.size.width.min(u16::MAX as u32) as u16,
                height: surface.size.height.min(u16::MAX as u32) as u16,
            };
            self.decorator
                .render_card(frame.buffer_mut(), rect, bounds, content);
        }
    }

    fn surface_mut(&mut self, slot: SlotId) -> Result<&mut Surface, SurfaceError> {
        self.surfaces
            .get_mut(&slot)
            .ok_or(SurfaceError::UnknownSlot(slot))
    }
}

impl WindowSystem for TerminalSurfaces {
    fn create(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
        if !self.surfaces.contains_key(&slot) {
            tracing::debug!(%slot, "created card surface");
            self.surfaces.insert(slot, Surface::default());
        }
        Ok(())
    }

    fn set_position(&mut self, slot: SlotId, position: Position) -> Result<(), SurfaceError> {
        let surface = self.surface_mut(slot)?;
        if surface.position != position {
            surface.position = position;
            self.dirty = true;
        }
        Ok(())
    }

    fn set_size(&mut self, slot: SlotId, size: Size) -> Result<(), SurfaceError> {
        let surface = self.surface_mut(slot)?;
        if surface.size != size {
            surface.size = size;
            self.dirty = true;
        }
        Ok(())
    }

    fn show(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
        let surface = self.surface_mut(slot)?;
        if !surface.visible {
            surface.visible = true;
            self.dirty = true;
        }
        Ok(())
    }

    fn hide(&mut self, slot: SlotId) -> Result<(), SurfaceError> {
        let surface = self.surface_mut(slot)?;
        if surface.visible {
            surface.visible = false;
            self.dirty = true;
        }
        Ok(())
    }

    fn send_to_slot(&mut self, slot: SlotId, message: SlotMessage) -> Result<(), SurfaceError> {
        let surface = self.surface_mut(slot)?;
        let next = match message {
            SlotMessage::Update(content) => Some(content),
            SlotMessage::Clear => None,
        };
        if surface.content != next {
            surface.content = next;
            self.dirty = true;
        }
        Ok(())
    }
}

/// Card measurement in terminal cells.
#[derive(Debug, Clone)]
pub struct CellMeasure {
    decorator: Arc<dyn CardDecorator>,
}

impl CellMeasure {
    pub fn new(decorator: Arc<dyn CardDecorator>) -> Self {
        Self { decorator }
    }
}

impl Measure for CellMeasure {
    fn measure(&self, keys: &[KeyPress]) -> Option<Size> {
        let size = self.decorator.card_size(keys);
        (!size.is_empty()).then_some(size)
    }
}

/// The terminal viewport standing in for the primary monitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalMonitor {
    size: Option<(u16, u16)>,
}

impl TerminalMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = Some((width, height));
    }

    /// Mark the viewport as unknown, e.g. after a failed size query.
    pub fn clear(&mut self) {
        self.size = None;
    }
}

impl MonitorSource for TerminalMonitor {
    fn primary_monitor(&self) -> Option<Monitor> {
        let (width, height) = self.size?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Monitor {
            width: width as u32,
            height: height as u32,
            scale_factor: 1.0,
        })
    }
}
