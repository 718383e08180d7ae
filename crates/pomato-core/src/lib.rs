//! # Pomato Core Library
//!
//! Terminal pomodoro engine: a live countdown that can be paused with a
//! single keystroke, driven by a work/break cycle controller.
//!
//! ## Architecture
//!
//! - **Raw input** ([`input`]): cbreak terminal mode and a dedicated reader
//!   thread turning stdin into a byte channel
//! - **Keystroke multiplexer** ([`keys`]): classifies bytes into space and
//!   return notifications, dropping keys nobody is waiting for
//! - **Countdown** ([`countdown`]): deadline-based `m:ss/total` rendering
//!   with pause/resume
//! - **Cycle controller** ([`cycle`]): pomodoro, short break and long break
//!   sequencing, notifications, and waits for the user to advance
//!
//! ## Key Components
//!
//! - [`CycleController`]: runs rounds until an error occurs
//! - [`Countdown`]: one timed segment
//! - [`Keystrokes`]: the shared keystroke source
//! - [`CycleConfig`]: immutable durations and switches

pub mod config;
pub mod countdown;
pub mod cycle;
pub mod error;
pub mod events;
pub mod input;
pub mod keys;
pub mod notify;
pub mod style;

pub use config::{CycleConfig, Settings, TimeUnit};
pub use countdown::{Countdown, TimerState};
pub use cycle::{plan_round, Advance, CycleController, KeyInput, LineInput, Phase, SegmentKind};
pub use error::{ConfigError, EngineError};
pub use events::{Event, EventSink};
pub use input::TerminalMode;
pub use keys::{KeyEvent, Keystrokes};
pub use notify::{DesktopNotifier, Notifier, NotifyKind};
pub use style::{AnsiStyler, PlainStyler, Styler};
