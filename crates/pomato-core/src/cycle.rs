//! Cycle controller.
//!
//! A round is `long_break_each` pomodoros, each followed by a break; the last
//! break of the round is the long one. [`plan_round`] lays a round out as a
//! list of [`Phase`]s and [`CycleController`] executes it, forever.
//!
//! ```text
//! Pomodoro(1) -> ShortBreak(1) [-> AwaitingAdvance unless autostart]
//! ...
//! Pomodoro(n) -> LongBreak(n) -> AwaitingAdvance (always)
//! ```
//!
//! User interaction goes through the [`Advance`] trait, which has two
//! implementations:
//! - [`KeyInput`]: keystrokes multiplexed from a cbreak terminal; the
//!   countdown can be paused with space.
//! - [`LineInput`]: plain blocking line reads; no pause.

use std::convert::Infallible;
use std::future::Future;
use std::io::Write;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::config::CycleConfig;
use crate::countdown::{round_secs, Countdown};
use crate::error::{EngineError, Result};
use crate::events::{Event, EventSink};
use crate::input::{self, TerminalMode};
use crate::keys::Keystrokes;
use crate::notify::{DesktopNotifier, Notifier, NotifyKind, APP_TITLE};
use crate::style::{AnsiStyler, Styler};

pub const ADVANCE_PROMPT: &str = "Press enter to continue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl SegmentKind {
    pub fn title(self) -> &'static str {
        match self {
            SegmentKind::Pomodoro => "Pomodoro time",
            SegmentKind::ShortBreak => "Break time",
            SegmentKind::LongBreak => "Long break time",
        }
    }
}

/// One step of a round. Ordinals are 1-based within the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pomodoro { ordinal: u32 },
    ShortBreak { ordinal: u32 },
    LongBreak { ordinal: u32 },
    AwaitingAdvance,
}

impl Phase {
    pub fn segment(self) -> Option<(SegmentKind, u32)> {
        match self {
            Phase::Pomodoro { ordinal } => Some((SegmentKind::Pomodoro, ordinal)),
            Phase::ShortBreak { ordinal } => Some((SegmentKind::ShortBreak, ordinal)),
            Phase::LongBreak { ordinal } => Some((SegmentKind::LongBreak, ordinal)),
            Phase::AwaitingAdvance => None,
        }
    }
}

/// Steps of one round, ending with the mandatory wait after the long break.
///
/// `autostart_next` only skips the waits after short breaks. Phases are
/// produced lazily, one pomodoro at a time.
pub fn plan_round(config: &CycleConfig) -> impl Iterator<Item = Phase> {
    let rounds = config.long_break_each.max(1);
    let autostart_next = config.autostart_next;
    (1..=rounds).flat_map(move |ordinal| {
        let (rest, wait) = if ordinal == rounds {
            (Phase::LongBreak { ordinal }, true)
        } else {
            (Phase::ShortBreak { ordinal }, !autostart_next)
        };
        [
            Some(Phase::Pomodoro { ordinal }),
            Some(rest),
            wait.then_some(Phase::AwaitingAdvance),
        ]
        .into_iter()
        .flatten()
    })
}

/// How the controller learns that the user wants to move on.
pub trait Advance {
    /// Pause source handed to each countdown, if any.
    fn keystrokes(&self) -> Option<&Keystrokes>;

    /// Block until the user presses return.
    fn wait_for_advance(&mut self) -> impl Future<Output = Result<()>>;
}

/// Multiplexed mode: keystrokes from a background reader.
pub struct KeyInput {
    keys: Keystrokes,
    terminal: Option<TerminalMode>,
}

impl KeyInput {
    /// `terminal` is drained before every prompt and restored on drop.
    pub fn new(keys: Keystrokes, terminal: Option<TerminalMode>) -> Self {
        Self { keys, terminal }
    }
}

impl Advance for KeyInput {
    fn keystrokes(&self) -> Option<&Keystrokes> {
        Some(&self.keys)
    }

    async fn wait_for_advance(&mut self) -> Result<()> {
        if let Some(terminal) = &self.terminal {
            terminal.drain();
        }
        self.keys.wait_for_return().await
    }
}

/// Blocking mode: one line per advance, no pause support.
pub struct LineInput<R> {
    reader: BufReader<R>,
    drain_tty: bool,
}

impl<R: AsyncRead + Unpin> LineInput<R> {
    /// With `drain_tty`, input typed before each prompt is discarded, both
    /// in the terminal and in the read buffer.
    pub fn new(reader: R, drain_tty: bool) -> Self {
        Self {
            reader: BufReader::new(reader),
            drain_tty,
        }
    }
}

impl LineInput<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin(), input::stdin_is_tty())
    }
}

impl<R: AsyncRead + Unpin> Advance for LineInput<R> {
    fn keystrokes(&self) -> Option<&Keystrokes> {
        None
    }

    async fn wait_for_advance(&mut self) -> Result<()> {
        if self.drain_tty {
            input::drain_stdin();
            let stale = self.reader.buffer().len();
            self.reader.consume(stale);
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line).await {
            Ok(0) => Err(EngineError::InputClosed),
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!("read from stdin failed: {e}");
                Err(EngineError::InputClosed)
            }
        }
    }
}

/// Drives rounds of pomodoros and breaks until an error occurs.
pub struct CycleController<W, A> {
    config: CycleConfig,
    out: W,
    input: A,
    notifier: Box<dyn Notifier>,
    styler: Box<dyn Styler>,
    events: EventSink,
    rounds_completed: u64,
}

impl<W: Write, A: Advance> CycleController<W, A> {
    pub fn new(config: CycleConfig, out: W, input: A) -> Self {
        Self {
            config,
            out,
            input,
            notifier: Box::new(DesktopNotifier),
            styler: Box::new(AnsiStyler),
            events: EventSink::none(),
            rounds_completed: 0,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_styler(mut self, styler: Box<dyn Styler>) -> Self {
        self.styler = styler;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Run rounds back to back. Only returns on error.
    pub async fn run(&mut self) -> Result<Infallible> {
        loop {
            self.run_round().await?;
        }
    }

    /// Run one round, including the wait after its long break.
    pub async fn run_round(&mut self) -> Result<()> {
        for phase in plan_round(&self.config) {
            self.step(phase).await?;
        }
        self.rounds_completed += 1;
        tracing::debug!(rounds = self.rounds_completed, "round completed");
        Ok(())
    }

    async fn step(&mut self, phase: Phase) -> Result<()> {
        let Some((kind, ordinal)) = phase.segment() else {
            return self.await_advance().await;
        };

        let duration = match kind {
            SegmentKind::Pomodoro => self.config.pomodoro_time,
            SegmentKind::ShortBreak => self.config.break_time,
            SegmentKind::LongBreak => self.config.long_break_time,
        };
        let (before, after) = match kind {
            SegmentKind::Pomodoro => (None, None),
            SegmentKind::ShortBreak => (
                Some((NotifyKind::Start, "Have a break!")),
                Some((NotifyKind::End, "Break finished!")),
            ),
            SegmentKind::LongBreak => (
                Some((NotifyKind::Start, "Relax and have a long break!")),
                Some((NotifyKind::End, "Long break finished! Continue to work.")),
            ),
        };

        self.notify(before);
        self.events.emit(Event::SegmentStarted {
            kind,
            ordinal,
            duration_secs: round_secs(duration),
        });

        let label = format!("[{ordinal}] {}", self.styler.label(kind, kind.title()));
        Countdown::new(&mut self.out, self.input.keystrokes(), &self.events)
            .run(&label, duration)
            .await?;

        self.events.emit(Event::SegmentFinished { kind, ordinal });
        self.notify(after);
        Ok(())
    }

    async fn await_advance(&mut self) -> Result<()> {
        write!(self.out, "\r\x1b[K{ADVANCE_PROMPT}: ")
            .and_then(|_| self.out.flush())
            .map_err(EngineError::Render)?;
        self.events.emit(Event::AwaitingAdvance);
        self.input.wait_for_advance().await?;
        self.events.emit(Event::Advanced);
        Ok(())
    }

    fn notify(&self, message: Option<(NotifyKind, &str)>) {
        if let Some((kind, body)) = message {
            if self.config.show_notification {
                self.notifier.notify(kind, APP_TITLE, body);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::PlainStyler;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Instant};

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn config(each: u32, autostart_next: bool) -> CycleConfig {
        CycleConfig {
            pomodoro_time: secs(3),
            break_time: secs(1),
            long_break_time: secs(2),
            long_break_each: each,
            autostart_next,
            show_notification: true,
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(NotifyKind, String)>>>);

    impl Notifier for Recorder {
        fn notify(&self, kind: NotifyKind, title: &str, body: &str) {
            assert_eq!(title, APP_TITLE);
            self.0.lock().unwrap().push((kind, body.to_string()));
        }
    }

    /// Advances immediately; fails once `budget` waits are used up.
    struct Scripted {
        waits: usize,
        budget: usize,
    }

    impl Advance for Scripted {
        fn keystrokes(&self) -> Option<&Keystrokes> {
            None
        }

        async fn wait_for_advance(&mut self) -> Result<()> {
            if self.waits == self.budget {
                return Err(EngineError::InputClosed);
            }
            self.waits += 1;
            Ok(())
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    fn started(kind: SegmentKind, ordinal: u32, duration_secs: u64) -> Event {
        Event::SegmentStarted {
            kind,
            ordinal,
            duration_secs,
        }
    }

    fn finished(kind: SegmentKind, ordinal: u32) -> Event {
        Event::SegmentFinished { kind, ordinal }
    }

    #[test]
    fn round_plan_waits_after_every_break() {
        use Phase::*;
        let plan: Vec<_> = plan_round(&config(4, false)).collect();
        assert_eq!(
            plan,
            vec![
                Pomodoro { ordinal: 1 },
                ShortBreak { ordinal: 1 },
                AwaitingAdvance,
                Pomodoro { ordinal: 2 },
                ShortBreak { ordinal: 2 },
                AwaitingAdvance,
                Pomodoro { ordinal: 3 },
                ShortBreak { ordinal: 3 },
                AwaitingAdvance,
                Pomodoro { ordinal: 4 },
                LongBreak { ordinal: 4 },
                AwaitingAdvance,
            ]
        );
    }

    #[test]
    fn autostart_keeps_only_the_long_break_wait() {
        use Phase::*;
        let plan: Vec<_> = plan_round(&config(4, true)).collect();
        assert_eq!(plan.iter().filter(|p| **p == AwaitingAdvance).count(), 1);
        assert_eq!(plan.last(), Some(&AwaitingAdvance));
        assert_eq!(plan[plan.len() - 2], LongBreak { ordinal: 4 });
    }

    #[test]
    fn single_pomodoro_round_is_all_long_breaks() {
        use Phase::*;
        assert_eq!(
            plan_round(&config(1, false)).collect::<Vec<_>>(),
            vec![Pomodoro { ordinal: 1 }, LongBreak { ordinal: 1 }, AwaitingAdvance]
        );
    }

    #[test]
    fn huge_round_is_planned_lazily() {
        use Phase::*;
        let mut plan = plan_round(&config(u32::MAX, true));
        assert_eq!(
            plan.by_ref().take(4).collect::<Vec<_>>(),
            vec![
                Pomodoro { ordinal: 1 },
                ShortBreak { ordinal: 1 },
                Pomodoro { ordinal: 2 },
                ShortBreak { ordinal: 2 },
            ]
        );
        assert_eq!(plan.next(), Some(Pomodoro { ordinal: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn round_runs_segments_in_order() {
        let notes = Recorder::default();
        let (events, mut rx) = EventSink::new();
        let mut controller = CycleController::new(
            config(2, false),
            Vec::new(),
            Scripted { waits: 0, budget: 10 },
        )
        .with_notifier(Box::new(notes.clone()))
        .with_styler(Box::new(PlainStyler))
        .with_events(events);

        let start = Instant::now();
        controller.run_round().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= secs(9) && elapsed < Duration::from_millis(9_050), "{elapsed:?}");

        use SegmentKind::*;
        assert_eq!(
            drain(&mut rx),
            vec![
                started(Pomodoro, 1, 3),
                finished(Pomodoro, 1),
                started(ShortBreak, 1, 1),
                finished(ShortBreak, 1),
                Event::AwaitingAdvance,
                Event::Advanced,
                started(Pomodoro, 2, 3),
                finished(Pomodoro, 2),
                started(LongBreak, 2, 2),
                finished(LongBreak, 2),
                Event::AwaitingAdvance,
                Event::Advanced,
            ]
        );
        assert_eq!(
            *notes.0.lock().unwrap(),
            vec![
                (NotifyKind::Start, "Have a break!".to_string()),
                (NotifyKind::End, "Break finished!".to_string()),
                (NotifyKind::Start, "Relax and have a long break!".to_string()),
                (NotifyKind::End, "Long break finished! Continue to work.".to_string()),
            ]
        );
        assert_eq!(controller.input.waits, 2);
        assert_eq!(controller.rounds_completed, 1);

        let out = String::from_utf8(controller.out.clone()).unwrap();
        assert!(out.contains("[1] Pomodoro time: 0:00/0:03\n"));
        assert!(out.contains("[1] Break time: 0:00/0:01\n"));
        assert!(out.contains("[2] Long break time: 0:00/0:02\n"));
        assert!(out.contains("Press enter to continue: "));
    }

    #[tokio::test(start_paused = true)]
    async fn autostart_skips_short_break_waits() {
        let mut controller =
            CycleController::new(config(3, true), Vec::new(), Scripted { waits: 0, budget: 10 })
                .with_notifier(Box::new(Recorder::default()));

        controller.run_round().await.unwrap();
        assert_eq!(controller.input.waits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_notifications_stay_silent() {
        let notes = Recorder::default();
        let cfg = CycleConfig {
            show_notification: false,
            ..config(2, true)
        };
        let mut controller = CycleController::new(cfg, Vec::new(), Scripted { waits: 0, budget: 10 })
            .with_notifier(Box::new(notes.clone()));

        controller.run_round().await.unwrap();
        assert!(notes.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_ends_the_run() {
        let mut controller =
            CycleController::new(config(2, false), Vec::new(), Scripted { waits: 0, budget: 3 })
                .with_notifier(Box::new(Recorder::default()));

        let err = controller.run().await.unwrap_err();
        assert!(matches!(err, EngineError::InputClosed));
        // Round one uses two waits; round two fails at its closing wait.
        assert_eq!(controller.rounds_completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn return_key_advances_multiplexed_round() {
        let (tx, rx) = mpsc::channel(8);
        let keys = Keystrokes::spawn(rx);
        let (events, mut seen) = EventSink::new();
        let mut controller =
            CycleController::new(config(2, false), Vec::new(), KeyInput::new(keys, None))
                .with_notifier(Box::new(Recorder::default()))
                .with_events(events);

        let driver = async {
            let mut advanced = 0;
            while let Some(event) = seen.recv().await {
                match event {
                    Event::AwaitingAdvance => {
                        // A space typed at the prompt must not pause the next pomodoro.
                        tx.send(b' ').await.unwrap();
                        sleep(Duration::from_millis(50)).await;
                        tx.send(b'\n').await.unwrap();
                    }
                    Event::Paused { .. } => panic!("stale space paused a countdown"),
                    Event::Advanced => {
                        advanced += 1;
                        if advanced == 2 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        };

        let (result, ()) = tokio::join!(controller.run_round(), driver);
        result.unwrap();
    }

    #[tokio::test]
    async fn line_input_reads_one_line_per_advance() {
        let mut input = LineInput::new(&b"\nnext\n"[..], false);
        assert!(input.keystrokes().is_none());
        input.wait_for_advance().await.unwrap();
        input.wait_for_advance().await.unwrap();
        assert!(matches!(
            input.wait_for_advance().await,
            Err(EngineError::InputClosed)
        ));
    }

    #[tokio::test]
    async fn line_input_discards_buffered_lines_before_prompt() {
        use tokio::io::AsyncWriteExt;

        let (mut tx, rx) = tokio::io::duplex(64);
        tx.write_all(b"stale\n").await.unwrap();

        let mut input = LineInput::new(rx, true);
        assert_eq!(input.reader.fill_buf().await.unwrap(), b"stale\n");

        tx.write_all(b"fresh\n").await.unwrap();
        input.wait_for_advance().await.unwrap();

        drop(tx);
        assert!(matches!(
            input.wait_for_advance().await,
            Err(EngineError::InputClosed)
        ));
    }
}
