//! Raw input events as delivered by an input source.
//!
//! Identifiers use the physical key/button names common to global input
//! hooks (`KeyA`, `ControlLeft`, `Num1`, `UpArrow`, `Left`, ...). They are
//! turned into display labels by [`crate::drivers::utils::keyboard_normalizer`].

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RawInputEvent {
    ButtonPress(String),
    ButtonRelease(String),
    KeyPress(String),
    KeyRelease(String),
    Wheel { delta_x: f64, delta_y: f64 },
}

impl RawInputEvent {
    pub fn key_press(id: impl Into<String>) -> Self {
        Self::KeyPress(id.into())
    }

    pub fn key_release(id: impl Into<String>) -> Self {
        Self::KeyRelease(id.into())
    }

    pub fn button_press(id: impl Into<String>) -> Self {
        Self::ButtonPress(id.into())
    }

    pub fn button_release(id: impl Into<String>) -> Self {
        Self::ButtonRelease(id.into())
    }

    pub fn wheel(delta_x: f64, delta_y: f64) -> Self {
        Self::Wheel { delta_x, delta_y }
    }
}

impl fmt::Display for RawInputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawInputEvent::ButtonPress(id) => write!(f, "button press {id}"),
            RawInputEvent::ButtonRelease(id) => write!(f, "button release {id}"),
            RawInputEvent::KeyPress(id) => write!(f, "key press {id}"),
            RawInputEvent::KeyRelease(id) => write!(f, "key release {id}"),
            RawInputEvent::Wheel { delta_x, delta_y } => write!(f, "wheel {delta_x},{delta_y}"),
        }
    }
}
