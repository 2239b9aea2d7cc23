use std::io;
use std::time::Instant;

use ratatui::layout::Rect;

use crate::config::OverlayConfig;
use crate::debug_log::DebugLogHandle;
use crate::drivers::{DriverEvent, InputDriver, OutputDriver};
use crate::engine::ChordEngine;
use crate::event_loop::{ControlFlow, EventLoop, LoopEvent, TimerKind};
use crate::window::{CellMeasure, TerminalMonitor, TerminalSurfaces};

/// Rows reserved for the debug log strip when it is enabled.
const DEBUG_LOG_ROWS: u16 = 8;

/// Everything the engine draws into: pooled surfaces plus the viewport that
/// stands in for the primary monitor.
pub struct OverlayHost {
    surfaces: TerminalSurfaces,
    monitor: TerminalMonitor,
    measure: CellMeasure,
    debug_log: Option<DebugLogHandle>,
}

impl OverlayHost {
    pub fn new(debug_log: Option<DebugLogHandle>) -> Self {
        let surfaces = TerminalSurfaces::default();
        let measure = CellMeasure::new(surfaces.decorator());
        Self {
            surfaces,
            monitor: TerminalMonitor::new(),
            measure,
            debug_log,
        }
    }

    pub fn surfaces(&self) -> &TerminalSurfaces {
        &self.surfaces
    }

    fn sync_size<O: OutputDriver>(&mut self, output: &mut O) {
        match output.size() {
            Ok((width, height)) => self.monitor.set_size(width, height),
            Err(err) => {
                tracing::debug!(%err, "terminal size unavailable");
                self.monitor.clear();
            }
        }
    }

    fn reconcile(&mut self, engine: &mut ChordEngine) {
        if let Some(report) = engine.reconcile(&mut self.surfaces, &self.monitor, &self.measure)
            && report.failed > 0
        {
            tracing::debug!(failed = report.failed, "reconcile left work for next tick");
        }
    }

    fn draw<O: OutputDriver>(&mut self, output: &mut O, force: bool) -> io::Result<()> {
        let dirty = self.surfaces.take_dirty();
        if !dirty && !force && self.debug_log.is_none() {
            return Ok(());
        }
        let surfaces = &self.surfaces;
        let debug_log = self.debug_log.as_ref();
        output.draw(|mut frame| {
            if let Some(log) = debug_log {
                let area = frame.area();
                let rows = DEBUG_LOG_ROWS.min(area.height);
                let strip = Rect {
                    x: area.x,
                    y: area.y,
                    width: area.width,
                    height: rows,
                };
                log.render(&mut frame, strip);
            }
            surfaces.render(&mut frame);
        })
    }
}

/// Drive the overlay until a quit command arrives, then hide every card.
///
/// The output driver must already be entered. Input is folded into the engine
/// as it arrives; cards are laid out and pushed to the surfaces on the refresh
/// timer and expired cards are swept on both timers.
pub fn run_overlay<D, O>(
    driver: &mut D,
    output: &mut O,
    config: OverlayConfig,
    debug_log: Option<DebugLogHandle>,
) -> io::Result<OverlayHost>
where
    D: InputDriver,
    O: OutputDriver,
{
    let refresh = config.refresh_interval;
    let evict = config.evict_interval;
    let mut engine = ChordEngine::new(config, Instant::now());
    let mut host = OverlayHost::new(debug_log);
    host.sync_size(output);
    engine.create_surfaces(&mut host.surfaces);
    host.draw(output, true)?;

    let mut event_loop = EventLoop::new(driver)
        .with_timer(TimerKind::Refresh, refresh)
        .with_timer(TimerKind::Evict, evict);

    event_loop.run(|_, event| {
        let now = Instant::now();
        match event {
            LoopEvent::Driver(DriverEvent::Input(raw)) => {
                tracing::trace!(%raw, "input");
                engine.handle_input(&raw, now);
            }
            LoopEvent::Driver(DriverEvent::Resize { width, height }) => {
                host.monitor.set_size(width, height);
                host.reconcile(&mut engine);
                host.draw(output, true)?;
            }
            LoopEvent::Driver(DriverEvent::ToggleVisibility) => {
                engine.toggle_suspended();
                tracing::info!(hidden = engine.is_suspended(), "overlay visibility");
            }
            LoopEvent::Driver(DriverEvent::Quit) => return Ok(ControlFlow::Quit),
            LoopEvent::Timer(TimerKind::Refresh) => {
                let expired = engine.refresh(now);
                if !expired.is_empty() {
                    tracing::debug!(count = expired.len(), "cards expired");
                }
                host.reconcile(&mut engine);
                host.draw(output, false)?;
            }
            LoopEvent::Timer(TimerKind::Evict) => {
                let expired = engine.evict(now);
                if !expired.is_empty() {
                    tracing::debug!(count = expired.len(), "cards expired");
                }
            }
        }
        Ok(ControlFlow::Continue)
    })?;

    engine.shutdown(&mut host.surfaces);
    host.draw(output, true)?;
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawInputEvent;
    use crate::ui::UiFrame;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Replays events; once the script runs dry it waits for `idle_polls`
    /// empty polls and then asks to quit.
    struct ScriptedDriver {
        events: VecDeque<DriverEvent>,
        idle_polls: usize,
    }

    impl InputDriver for ScriptedDriver {
        fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
            if !self.events.is_empty() {
                return Ok(true);
            }
            if self.idle_polls == 0 {
                self.events.push_back(DriverEvent::Quit);
                return Ok(true);
            }
            self.idle_polls -= 1;
            std::thread::sleep(timeout.min(Duration::from_millis(5)));
            Ok(false)
        }

        fn read(&mut self) -> io::Result<Option<DriverEvent>> {
            Ok(self.events.pop_front())
        }
    }

    struct RecordingOutput {
        terminal: Terminal<TestBackend>,
        frames: Vec<String>,
    }

    impl RecordingOutput {
        fn new(width: u16, height: u16) -> Self {
            Self {
                terminal: Terminal::new(TestBackend::new(width, height)).unwrap(),
                frames: Vec::new(),
            }
        }
    }

    impl OutputDriver for RecordingOutput {
        fn enter(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn exit(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn size(&mut self) -> io::Result<(u16, u16)> {
            let area = self.terminal.backend().buffer().area;
            Ok((area.width, area.height))
        }

        fn draw<F>(&mut self, f: F) -> io::Result<()>
        where
            F: FnOnce(UiFrame<'_>),
        {
            self.terminal
                .draw(|frame| f(UiFrame::new(frame)))
                .map_err(|err| io::Error::other(err.to_string()))?;
            let text: String = self
                .terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect();
            self.frames.push(text);
            Ok(())
        }
    }

    fn config() -> OverlayConfig {
        OverlayConfig {
            refresh_interval: Duration::from_millis(2),
            evict_interval: Duration::from_millis(10),
            margin: 1,
            gap: 0,
            ..OverlayConfig::default()
        }
    }

    #[test]
    fn typed_chord_is_drawn_then_cleared_on_quit() {
        let mut driver = ScriptedDriver {
            events: VecDeque::from([
                DriverEvent::Input(RawInputEvent::key_press("ControlLeft")),
                DriverEvent::Input(RawInputEvent::key_press("KeyQ")),
                DriverEvent::Input(RawInputEvent::key_release("KeyQ")),
                DriverEvent::Input(RawInputEvent::key_release("ControlLeft")),
            ]),
            idle_polls: 20,
        };
        let mut output = RecordingOutput::new(40, 12);
        let host = run_overlay(&mut driver, &mut output, config(), None).unwrap();

        assert!(output.frames.iter().any(|f| f.contains("Ctrl") && f.contains('Q')));
        let last = output.frames.last().unwrap();
        assert!(!last.contains("Ctrl"));
        assert_eq!(host.surfaces().visible_count(), 0);
    }

    #[test]
    fn toggled_overlay_draws_nothing() {
        let mut driver = ScriptedDriver {
            events: VecDeque::from([
                DriverEvent::ToggleVisibility,
                DriverEvent::Input(RawInputEvent::key_press("KeyZ")),
            ]),
            idle_polls: 20,
        };
        let mut output = RecordingOutput::new(40, 12);
        run_overlay(&mut driver, &mut output, config(), None).unwrap();
        assert!(output.frames.iter().all(|f| !f.contains('Z')));
    }

    #[test]
    fn debug_log_strip_is_drawn() {
        let log = DebugLogHandle::new(16);
        log.push("hello from the log");
        let mut driver = ScriptedDriver {
            events: VecDeque::new(),
            idle_polls: 3,
        };
        let mut output = RecordingOutput::new(40, 12);
        run_overlay(&mut driver, &mut output, config(), Some(log)).unwrap();
        assert!(output.frames[0].contains("hello from the log"));
    }
}
