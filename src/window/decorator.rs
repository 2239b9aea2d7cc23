use ratatui::buffer::Buffer;
use ratatui::prelude::Rect;
use ratatui::style::{Modifier, Style};

use crate::chord::KeyPress;
use crate::layout::Size;
use crate::ui::{safe_set_string, text_width};

use super::CardContent;

/// Draws one chord card and reports how big a card must be.
pub trait CardDecorator: std::fmt::Debug {
    /// Size in cells of a card showing `keys`.
    fn card_size(&self, keys: &[KeyPress]) -> Size;

    /// Draw a card whose full (unclipped) extent is `rect`, writing only
    /// inside `bounds`.
    fn render_card(&self, buffer: &mut Buffer, rect: CardRect, bounds: Rect, content: &CardContent);
}

/// Signed card rectangle; the card may start above or left of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

/// A bordered card with one padded chip per key.
#[derive(Debug)]
pub struct ChipDecorator {
    pub padding: u16,
}

impl Default for ChipDecorator {
    fn default() -> Self {
        Self { padding: 1 }
    }
}

impl ChipDecorator {
    fn chip_width(&self, label: &str) -> u16 {
        (text_width(label) as u16).saturating_add(self.padding.saturating_mul(2))
    }
}

impl CardDecorator for ChipDecorator {
    fn card_size(&self, keys: &[KeyPress]) -> Size {
        if keys.is_empty() {
            return Size::ZERO;
        }
        let chips: u32 = keys.iter().map(|k| self.chip_width(&k.label) as u32).sum();
        let separators = keys.len().saturating_sub(1) as u32;
        // border + chips + border, one row of chips between two border rows
        Size::new(chips + separators + 2, 3)
    }

    fn render_card(
        &self,
        buffer: &mut Buffer,
        rect: CardRect,
        bounds: Rect,
        content: &CardContent,
    ) {
        let border_style = if content.emphasize {
            Style::default().fg(crate::theme::card_border_newest())
        } else {
            Style::default().fg(crate::theme::card_border())
        };
        let chip_style = Style::default()
            .bg(crate::theme::key_bg())
            .fg(crate::theme::key_fg());
        let pressed_style = Style::default()
            .bg(crate::theme::key_pressed_bg())
            .fg(crate::theme::key_pressed_fg())
            .add_modifier(Modifier::BOLD);

        let left = rect.x as i64;
        let top = rect.y as i64;
        let right = left + rect.width as i64 - 1;
        let bottom = top + rect.height as i64 - 1;
        let visible = |x: i64, y: i64| {
            x >= bounds.x as i64
                && x < bounds.x as i64 + bounds.width as i64
                && y >= bounds.y as i64
                && y < bounds.y as i64 + bounds.height as i64
        };
        let mut put = |x: i64, y: i64, symbol: &str, style: Style| {
            if visible(x, y)
                && let Some(cell) = buffer.cell_mut((x as u16, y as u16))
            {
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        };

        // Borders
        for x in left..=right {
            let (top_sym, bottom_sym) = if x == left {
                ("╭", "╰")
            } else if x == right {
                ("╮", "╯")
            } else {
                ("─", "─")
            };
            put(x, top, top_sym, border_style);
            put(x, bottom, bottom_sym, border_style);
        }
        for y in (top + 1)..bottom {
            put(left, y, "│", border_style);
            put(right, y, "│", border_style);
            for x in (left + 1)..right {
                put(x, y, " ", Style::default());
            }
        }

        // Chips on the middle row
        let row = top + rect.height as i64 / 2;
        if row < 0 || !(bounds.y as i64..bounds.y as i64 + bounds.height as i64).contains(&row) {
            return;
        }
        let pad = " ".repeat(self.padding as usize);
        let mut x = left + 1;
        for key in &content.keys {
            let style = if content.emphasize && key.pressed {
                pressed_style
            } else {
                chip_style
            };
            let chip = format!("{pad}{}{pad}", key.label);
            let width = self.chip_width(&key.label) as i64;
            if x >= 0 && x + width <= right {
                safe_set_string(buffer, bounds, x as u16, row as u16, &chip, style);
            }
            x += width + 1;
        }
    }
}
