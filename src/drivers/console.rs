use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyEventState, KeyModifiers, KeyboardEnhancementFlags, ModifierKeyCode, MouseButton,
    MouseEvent, MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::{DriverEvent, InputDriver, OutputDriver};
use crate::input::RawInputEvent;
use crate::ui::UiFrame;

/// Modifier flags and the raw id reported for each when a terminal only
/// tells us which modifiers accompanied a key.
const MODIFIER_IDS: [(KeyModifiers, &str); 4] = [
    (KeyModifiers::CONTROL, "ControlLeft"),
    (KeyModifiers::SHIFT, "ShiftLeft"),
    (KeyModifiers::ALT, "Alt"),
    (KeyModifiers::SUPER, "MetaLeft"),
];

/// Reads crossterm events and turns them into raw input events.
///
/// Terminals with the kitty keyboard protocol report presses, releases and
/// bare modifier keys, which map one to one. Everywhere else only presses
/// arrive, so each press is expanded into modifier presses, the key press, the
/// key release and the modifier releases.
pub struct ConsoleInputDriver {
    enhanced: bool,
    event_queue: VecDeque<DriverEvent>,
}

impl Default for ConsoleInputDriver {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConsoleInputDriver {
    pub fn new(enhanced: bool) -> Self {
        Self {
            enhanced,
            event_queue: VecDeque::new(),
        }
    }

    /// Ask the terminal whether it reports key releases. Needs raw mode.
    pub fn detect() -> Self {
        let enhanced = match terminal::supports_keyboard_enhancement() {
            Ok(supported) => supported,
            Err(err) => {
                tracing::debug!(%err, "keyboard enhancement query failed");
                false
            }
        };
        tracing::info!(enhanced, "keyboard reporting mode");
        Self::new(enhanced)
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhanced
    }

    /// Translate one terminal event onto the internal queue.
    pub fn translate(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.translate_key(key),
            Event::Mouse(mouse) => self.translate_mouse(mouse),
            Event::Resize(width, height) => {
                self.event_queue
                    .push_back(DriverEvent::Resize { width, height });
            }
            _ => {}
        }
    }

    fn translate_key(&mut self, key: KeyEvent) {
        let pressed = matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat);
        if key.kind == KeyEventKind::Press
            && let Some(command) = hotkey(&key)
        {
            self.event_queue.push_back(command);
            return;
        }
        let Some(id) = raw_key_id(&key) else {
            return;
        };

        if self.enhanced {
            let event = if pressed {
                RawInputEvent::KeyPress(id)
            } else {
                RawInputEvent::KeyRelease(id)
            };
            self.event_queue.push_back(DriverEvent::Input(event));
            return;
        }

        if !pressed {
            return;
        }
        let modifiers: Vec<&str> = MODIFIER_IDS
            .iter()
            .filter(|(flag, raw)| key.modifiers.contains(*flag) && *raw != id)
            .map(|(_, raw)| *raw)
            .collect();
        for raw in &modifiers {
            self.push_input(RawInputEvent::key_press(*raw));
        }
        self.push_input(RawInputEvent::key_press(id.clone()));
        self.push_input(RawInputEvent::key_release(id));
        for raw in modifiers.iter().rev() {
            self.push_input(RawInputEvent::key_release(*raw));
        }
    }

    fn translate_mouse(&mut self, mouse: MouseEvent) {
        let event = match mouse.kind {
            MouseEventKind::Down(button) => RawInputEvent::button_press(button_id(button)),
            MouseEventKind::Up(button) => RawInputEvent::button_release(button_id(button)),
            MouseEventKind::ScrollUp => RawInputEvent::wheel(0.0, 1.0),
            MouseEventKind::ScrollDown => RawInputEvent::wheel(0.0, -1.0),
            MouseEventKind::ScrollLeft => RawInputEvent::wheel(-1.0, 0.0),
            MouseEventKind::ScrollRight => RawInputEvent::wheel(1.0, 0.0),
            // Pointer motion is never shown.
            MouseEventKind::Moved | MouseEventKind::Drag(_) => return,
        };
        self.push_input(event);
    }

    fn push_input(&mut self, event: RawInputEvent) {
        self.event_queue.push_back(DriverEvent::Input(event));
    }
}

impl InputDriver for ConsoleInputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.event_queue.is_empty() {
            return Ok(true);
        }
        crossterm::event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Option<DriverEvent>> {
        if let Some(evt) = self.event_queue.pop_front() {
            return Ok(Some(evt));
        }
        let evt = crossterm::event::read()?;
        self.translate(evt);
        Ok(self.event_queue.pop_front())
    }
}

fn hotkey(key: &KeyEvent) -> Option<DriverEvent> {
    let KeyCode::Char(c) = key.code else {
        return None;
    };
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match c.to_ascii_lowercase() {
        'c' => Some(DriverEvent::Quit),
        'h' if key.modifiers.contains(KeyModifiers::ALT) => Some(DriverEvent::ToggleVisibility),
        _ => None,
    }
}

fn button_id(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "Left",
        MouseButton::Right => "Right",
        MouseButton::Middle => "Middle",
    }
}

/// Identifier for a key in the same vocabulary the OS-level hooks use
/// (`KeyA`, `Num1`, `Kp1`, `ShiftLeft`, `UpArrow`, ...).
fn raw_key_id(key: &KeyEvent) -> Option<String> {
    let keypad = key.state.contains(KeyEventState::KEYPAD);
    let id = match key.code {
        KeyCode::Char(c) => return char_id(c, keypad),
        KeyCode::Enter if keypad => "KpReturn",
        KeyCode::Enter => "Return",
        KeyCode::Backspace => "Backspace",
        KeyCode::Tab | KeyCode::BackTab => "Tab",
        KeyCode::Esc => "Escape",
        KeyCode::Delete if keypad => "KpDelete",
        KeyCode::Delete => "Delete",
        KeyCode::Insert => "Insert",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Up => "UpArrow",
        KeyCode::Down => "DownArrow",
        KeyCode::Left => "LeftArrow",
        KeyCode::Right => "RightArrow",
        KeyCode::F(n) => return Some(format!("F{n}")),
        KeyCode::CapsLock => "CapsLock",
        KeyCode::ScrollLock => "ScrollLock",
        KeyCode::NumLock => "NumLock",
        KeyCode::PrintScreen => "PrintScreen",
        KeyCode::Pause => "Pause",
        KeyCode::Menu => "Menu",
        KeyCode::KeypadBegin => "Kp5",
        KeyCode::Modifier(modifier) => return modifier_id(modifier).map(str::to_string),
        KeyCode::Null | KeyCode::Media(_) => return None,
    };
    Some(id.to_string())
}

fn char_id(c: char, keypad: bool) -> Option<String> {
    if c.is_ascii_alphabetic() {
        return Some(format!("Key{}", c.to_ascii_uppercase()));
    }
    if let Some(d) = c.to_digit(10) {
        let prefix = if keypad { "Kp" } else { "Num" };
        return Some(format!("{prefix}{d}"));
    }
    let id = match c {
        '+' if keypad => "KpPlus",
        '-' if keypad => "KpMinus",
        '*' if keypad => "KpMultiply",
        '/' if keypad => "KpDivide",
        '.' if keypad => "KpDelete",
        ' ' => "Space",
        '`' | '~' => "BackQuote",
        '\\' | '|' => "BackSlash",
        '/' | '?' => "Slash",
        ',' | '<' => "Comma",
        '.' | '>' => "Dot",
        ';' | ':' => "SemiColon",
        '\'' | '"' => "Quote",
        '[' | '{' => "LeftBracket",
        ']' | '}' => "RightBracket",
        '-' | '_' => "Minus",
        '=' | '+' => "Equal",
        // Shifted digits on a US layout.
        '!' => "Num1",
        '@' => "Num2",
        '#' => "Num3",
        '$' => "Num4",
        '%' => "Num5",
        '^' => "Num6",
        '&' => "Num7",
        '*' => "Num8",
        '(' => "Num9",
        ')' => "Num0",
        '\t' => "Tab",
        '\r' | '\n' => "Return",
        other if other.is_control() => return None,
        other => return Some(other.to_uppercase().collect()),
    };
    Some(id.to_string())
}

fn modifier_id(modifier: ModifierKeyCode) -> Option<&'static str> {
    let id = match modifier {
        ModifierKeyCode::LeftShift => "ShiftLeft",
        ModifierKeyCode::RightShift => "ShiftRight",
        ModifierKeyCode::LeftControl => "ControlLeft",
        ModifierKeyCode::RightControl => "ControlRight",
        ModifierKeyCode::LeftAlt => "Alt",
        ModifierKeyCode::RightAlt | ModifierKeyCode::IsoLevel3Shift => "AltGr",
        ModifierKeyCode::LeftSuper | ModifierKeyCode::LeftHyper | ModifierKeyCode::LeftMeta => {
            "MetaLeft"
        }
        ModifierKeyCode::RightSuper
        | ModifierKeyCode::RightHyper
        | ModifierKeyCode::RightMeta => "MetaRight",
        ModifierKeyCode::IsoLevel5Shift => return None,
    };
    Some(id)
}

pub struct ConsoleOutputDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    entered: bool,
    enhanced_keys: bool,
}

impl ConsoleOutputDriver {
    pub fn new() -> io::Result<Self> {
        let stdout = io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            entered: false,
            enhanced_keys: false,
        })
    }

    /// Ask the terminal to report releases and bare modifier keys.
    pub fn enable_key_releases(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            return Ok(());
        }
        execute!(
            self.terminal.backend_mut(),
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
            )
        )?;
        self.enhanced_keys = true;
        Ok(())
    }
}

impl OutputDriver for ConsoleOutputDriver {
    fn enter(&mut self) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        execute!(
            self.terminal.backend_mut(),
            EnterAlternateScreen,
            EnableMouseCapture
        )?;
        terminal::enable_raw_mode()?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        if self.enhanced_keys {
            execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
            self.enhanced_keys = false;
        }
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        self.entered = false;
        Ok(())
    }

    fn size(&mut self) -> io::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }

    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>),
    {
        self.terminal
            .draw(move |frame| {
                let wrapper = UiFrame::new(frame);
                f(wrapper);
            })
            .map(|_| ())
            .map_err(|err| io::Error::other(err.to_string()))
    }
}

impl Drop for ConsoleOutputDriver {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}
