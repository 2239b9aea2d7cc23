pub mod console;
pub mod utils;

use std::io;
use std::time::Duration;

use crate::input::RawInputEvent;
use crate::ui::UiFrame;

/// What an input driver hands to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Input(RawInputEvent),
    Resize { width: u16, height: u16 },
    ToggleVisibility,
    Quit,
}

pub trait InputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Next event, or `None` when the underlying event carried nothing of
    /// interest (mouse motion, focus changes).
    fn read(&mut self) -> io::Result<Option<DriverEvent>>;
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).poll(timeout)
    }

    fn read(&mut self) -> io::Result<Option<DriverEvent>> {
        (**self).read()
    }
}

pub trait OutputDriver {
    fn enter(&mut self) -> io::Result<()>;
    fn exit(&mut self) -> io::Result<()>;

    /// Current drawable size in cells.
    fn size(&mut self) -> io::Result<(u16, u16)>;

    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(UiFrame<'_>);
}
