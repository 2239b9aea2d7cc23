use std::io;
use std::time::{Duration, Instant};

use crate::drivers::{DriverEvent, InputDriver};

/// Poll timeout used when no timer is registered.
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Most reads in one burst before timers get another look.
const MAX_DRAIN: usize = 256;

pub enum ControlFlow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Short period: refresh the newest card, evict, lay out, reconcile.
    Refresh,
    /// Longer period: eviction only.
    Evict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    Driver(DriverEvent),
    Timer(TimerKind),
}

#[derive(Debug)]
struct Timer {
    kind: TimerKind,
    period: Duration,
    next_due: Instant,
}

/// Single-threaded message pump.
///
/// Input events and timer firings are all dispatched from this one loop, in
/// order, and each handler call runs to completion before the next one starts.
/// Nothing the handler touches is ever shared with another thread.
pub struct EventLoop<D> {
    driver: D,
    timers: Vec<Timer>,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            timers: Vec::new(),
        }
    }

    /// Register a periodic timer whose first firing is one period from now.
    pub fn with_timer(self, kind: TimerKind, period: Duration) -> Self {
        self.with_timer_at(kind, period, Instant::now())
    }

    pub fn with_timer_at(mut self, kind: TimerKind, period: Duration, start: Instant) -> Self {
        self.timers.push(Timer {
            kind,
            period,
            next_due: start + period,
        });
        self
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.next_due).min()
    }

    fn timer_due(&self, now: Instant) -> bool {
        self.next_deadline().is_some_and(|deadline| deadline <= now)
    }

    /// Timers due at `now`, in registration order. A timer that fell more than
    /// one period behind fires once and is rescheduled from `now`; missed
    /// periods are not replayed.
    fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due = Vec::new();
        for timer in &mut self.timers {
            if timer.next_due > now {
                continue;
            }
            due.push(timer.kind);
            timer.next_due += timer.period;
            if timer.next_due <= now {
                timer.next_due = now + timer.period;
            }
        }
        due
    }

    /// Run until the handler returns [`ControlFlow::Quit`].
    ///
    /// Polls the driver until the next timer is due, drains queued input
    /// events, then fires whichever timers came due. A drain stops early once
    /// a timer is due or after [`MAX_DRAIN`] reads, so a driver that always
    /// reports input cannot starve the timers.
    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, LoopEvent) -> io::Result<ControlFlow>,
    {
        loop {
            for kind in self.take_due(Instant::now()) {
                if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Timer(kind))? {
                    return Ok(());
                }
            }

            let timeout = self
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_POLL);

            if self.driver.poll(timeout)? {
                // Drain bursts (held-key repeats, wheel spins) before the next
                // timer so the stack never lags behind the input stream.
                for _ in 0..MAX_DRAIN {
                    if let Some(event) = self.driver.read()?
                        && let ControlFlow::Quit =
                            handler(&mut self.driver, LoopEvent::Driver(event))?
                    {
                        return Ok(());
                    }
                    if self.timer_due(Instant::now()) || !self.driver.poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
        }
    }
}
