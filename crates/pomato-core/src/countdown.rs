//! Countdown timer.
//!
//! Renders `label: m:ss/total` in place once per second until the deadline,
//! toggling pause on every space key when a [`Keystrokes`] source is present.
//!
//! ## Time keeping
//!
//! The remaining time is always derived from an absolute deadline
//! (`end_time - now`), never accumulated from ticks, so slow renders cannot
//! drift the clock. Pausing freezes the remaining duration; resuming builds a
//! new deadline from it:
//!
//! ```text
//! running ──space──▶ paused     remaining_on_pause = end_time - now
//! paused  ──space──▶ running    end_time = now + remaining_on_pause
//! ```

use std::future::pending;
use std::io::Write;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::{EngineError, Result};
use crate::events::{Event, EventSink};
use crate::keys::Keystrokes;

pub const TICK: Duration = Duration::from_secs(1);

const PAUSED_SUFFIX: &str = " [Paused]";

/// State of one countdown invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    end_time: Instant,
    /// Only meaningful while `paused`.
    remaining_on_pause: Duration,
    paused: bool,
}

impl TimerState {
    pub fn start(now: Instant, duration: Duration) -> Self {
        Self {
            end_time: now + duration,
            remaining_on_pause: Duration::ZERO,
            paused: false,
        }
    }

    pub fn end_time(&self) -> Instant {
        self.end_time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        if self.paused {
            self.remaining_on_pause
        } else {
            self.end_time.saturating_duration_since(now)
        }
    }

    /// Freeze the remaining time. No-op when already paused.
    pub fn pause(&mut self, now: Instant) {
        if !self.paused {
            self.remaining_on_pause = self.end_time.saturating_duration_since(now);
            self.paused = true;
        }
    }

    /// Rebuild the deadline from the frozen remaining time. No-op when running.
    pub fn resume(&mut self, now: Instant) {
        if self.paused {
            self.end_time = now + self.remaining_on_pause;
            self.paused = false;
        }
    }

    /// Flip between running and paused. Returns whether the timer is now paused.
    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.paused {
            self.resume(now);
        } else {
            self.pause(now);
        }
        self.paused
    }

    /// Next tick at or after `now` that falls a whole number of seconds
    /// before the deadline.
    fn next_tick(&self, now: Instant) -> Instant {
        let fraction = Duration::from_nanos(u64::from(self.remaining(now).subsec_nanos()));
        if fraction.is_zero() {
            now + TICK
        } else {
            now + fraction
        }
    }
}

/// Whole seconds, rounded to nearest (half rounds up).
pub fn round_secs(d: Duration) -> u64 {
    ((d.as_nanos() + 500_000_000) / 1_000_000_000) as u64
}

/// `m:ss`, minutes unpadded.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One countdown against a render sink.
pub struct Countdown<'a, W: Write> {
    out: &'a mut W,
    keys: Option<&'a Keystrokes>,
    events: &'a EventSink,
}

impl<'a, W: Write> Countdown<'a, W> {
    /// `keys` is the pause source; without one the countdown cannot pause.
    pub fn new(out: &'a mut W, keys: Option<&'a Keystrokes>, events: &'a EventSink) -> Self {
        Self { out, keys, events }
    }

    /// Count `duration` down, returning once it has fully elapsed.
    ///
    /// # Errors
    ///
    /// [`EngineError::Render`] if the sink fails, [`EngineError::InputClosed`]
    /// if the keystroke source ends while counting.
    pub async fn run(&mut self, label: &str, duration: Duration) -> Result<()> {
        let total = format_clock(round_secs(duration));
        let now = Instant::now();
        let mut state = TimerState::start(now, duration);
        self.render(label, round_secs(duration), &total, false)?;

        let mut ticker = interval_at(state.next_tick(now), TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let idle = Notify::new();
        let keys = self.keys;
        let space_notify = keys.map(Keystrokes::space).unwrap_or(&idle);
        let space = space_notify.notified();
        tokio::pin!(space);
        space.as_mut().enable();

        loop {
            tokio::select! {
                _ = ticker.tick(), if !state.is_paused() => {
                    let left = round_secs(state.remaining(Instant::now()));
                    self.render(label, left, &total, false)?;
                    if left == 0 {
                        break;
                    }
                }
                _ = &mut space => {
                    space.set(space_notify.notified());
                    space.as_mut().enable();

                    let now = Instant::now();
                    let paused = state.toggle(now);
                    let left = round_secs(state.remaining(now));
                    if paused {
                        self.events.emit(Event::Paused { remaining_secs: left });
                    } else {
                        ticker.reset_at(state.next_tick(now));
                        self.events.emit(Event::Resumed { remaining_secs: left });
                    }
                    self.render(label, left, &total, paused)?;
                }
                _ = input_closed(keys) => return Err(EngineError::InputClosed),
            }
        }

        self.out.write_all(b"\n").map_err(EngineError::Render)?;
        self.out.flush().map_err(EngineError::Render)
    }

    fn render(&mut self, label: &str, left: u64, total: &str, paused: bool) -> Result<()> {
        let suffix = if paused { PAUSED_SUFFIX } else { "" };
        write!(
            self.out,
            "\r\x1b[K{label}: {}/{total}{suffix}",
            format_clock(left)
        )
        .and_then(|_| self.out.flush())
        .map_err(EngineError::Render)
    }
}

async fn input_closed(keys: Option<&Keystrokes>) {
    match keys {
        Some(keys) => keys.closed().await,
        None => pending().await,
    }
}
