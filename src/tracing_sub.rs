//! Tracing setup for a process whose terminal sits in raw mode.
//!
//! Events are captured in the global [`DebugLogHandle`] rather than written to
//! the screen. In [`LogMode::Live`] the overlay draws that buffer as a strip;
//! in [`LogMode::Deferred`] only warnings are kept and they are replayed once
//! the terminal has been restored.

use std::io::{self, Write};

use tracing::Level;

use crate::debug_log::{
    DEFAULT_MAX_LINES, DebugLogHandle, DebugLogWriter, global_debug_log, set_global_debug_log,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Debug output, drawn on screen while the overlay runs.
    Live,
    /// Warnings only, printed after exit.
    Deferred,
}

impl LogMode {
    pub fn from_flag(debug_log: bool) -> Self {
        if debug_log {
            Self::Live
        } else {
            Self::Deferred
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Live => Level::DEBUG,
            Self::Deferred => Level::WARN,
        }
    }
}

/// Destination of one formatted event: the captured buffer once it is
/// installed, stderr before that.
pub enum LogSink {
    Buffer(DebugLogWriter),
    Stderr(io::Stderr),
}

impl LogSink {
    fn current() -> Self {
        match global_debug_log() {
            Some(handle) => Self::Buffer(handle.writer()),
            None => Self::Stderr(io::stderr()),
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Buffer(w) => w.write(buf),
            Self::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Buffer(w) => w.flush(),
            Self::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SinkMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SinkMakeWriter {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        LogSink::current()
    }
}

/// Logging for one overlay session.
#[derive(Debug)]
pub struct OverlayLogging {
    mode: LogMode,
    handle: DebugLogHandle,
}

impl OverlayLogging {
    /// Install the global capture buffer and the fmt subscriber. A buffer or
    /// subscriber installed earlier in the process stays in place.
    pub fn init(mode: LogMode) -> Self {
        let fresh = DebugLogHandle::new(DEFAULT_MAX_LINES);
        set_global_debug_log(fresh.clone());
        let handle = global_debug_log().unwrap_or(fresh);
        let _ = tracing_subscriber::fmt()
            .with_max_level(mode.level())
            .with_writer(SinkMakeWriter)
            .with_target(false)
            .with_thread_names(false)
            .with_ansi(false)
            .without_time()
            .try_init();
        Self { mode, handle }
    }

    /// The buffer to draw on screen; live mode only.
    pub fn live_log(&self) -> Option<DebugLogHandle> {
        (self.mode == LogMode::Live).then(|| self.handle.clone())
    }

    /// Write the captured lines to `out` when they were not already shown on
    /// screen. Returns how many lines were written.
    pub fn replay<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        if self.mode == LogMode::Live {
            return Ok(0);
        }
        let lines = self.handle.tail(DEFAULT_MAX_LINES);
        for line in &lines {
            writeln!(out, "{line}")?;
        }
        Ok(lines.len())
    }
}
