use ratatui::style::Color;

// Centralized card colors. RGB accents go through `rgb_to_color` so terminals
// without truecolor still get a close named color.

pub const ACCENT_RGB: (u8, u8, u8) = (200, 100, 0);
pub const PRESSED_RGB: (u8, u8, u8) = (255, 165, 0);

pub fn truecolor_supported() -> bool {
    std::env::var("COLORTERM")
        .map(|v| {
            let v = v.to_lowercase();
            v.contains("truecolor") || v.contains("24bit")
        })
        .unwrap_or(false)
}

pub fn rgb_to_color(rgb: (u8, u8, u8)) -> Color {
    if truecolor_supported() {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    } else {
        nearest_named(rgb)
    }
}

fn nearest_named((r, g, b): (u8, u8, u8)) -> Color {
    const NAMED: [(Color, (u8, u8, u8)); 8] = [
        (Color::Black, (0, 0, 0)),
        (Color::Red, (205, 0, 0)),
        (Color::Green, (0, 205, 0)),
        (Color::Yellow, (205, 205, 0)),
        (Color::Blue, (0, 0, 238)),
        (Color::Magenta, (205, 0, 205)),
        (Color::Cyan, (0, 205, 205)),
        (Color::White, (229, 229, 229)),
    ];
    let dist = |(cr, cg, cb): (u8, u8, u8)| {
        let dr = r as i32 - cr as i32;
        let dg = g as i32 - cg as i32;
        let db = b as i32 - cb as i32;
        dr * dr + dg * dg + db * db
    };
    NAMED
        .iter()
        .min_by_key(|(_, rgb)| dist(*rgb))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}

pub fn accent() -> Color {
    rgb_to_color(ACCENT_RGB)
}

// Card chrome
pub fn card_border() -> Color {
    Color::DarkGray
}
pub fn card_border_newest() -> Color {
    accent()
}

// Key chips
pub fn key_bg() -> Color {
    Color::DarkGray
}
pub fn key_fg() -> Color {
    Color::White
}
pub fn key_pressed_bg() -> Color {
    rgb_to_color(PRESSED_RGB)
}
pub fn key_pressed_fg() -> Color {
    Color::Black
}

// Debug log strip
pub fn debug_fg() -> Color {
    Color::Gray
}
