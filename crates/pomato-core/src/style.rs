//! Label styling for the countdown line.

use crossterm::style::Stylize;

use crate::cycle::SegmentKind;

/// Decorates a segment label for display. The cycle controller only knows
/// the semantic kind; the colors live here.
pub trait Styler: Send + Sync {
    fn label(&self, kind: SegmentKind, text: &str) -> String;
}

/// ANSI colors: pomodoro yellow, short break blue, long break green.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiStyler;

impl Styler for AnsiStyler {
    fn label(&self, kind: SegmentKind, text: &str) -> String {
        match kind {
            SegmentKind::Pomodoro => text.yellow().to_string(),
            SegmentKind::ShortBreak => text.blue().to_string(),
            SegmentKind::LongBreak => text.green().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainStyler;

impl Styler for PlainStyler {
    fn label(&self, _kind: SegmentKind, text: &str) -> String {
        text.to_string()
    }
}

pub fn styler(color: bool) -> Box<dyn Styler> {
    if color {
        Box::new(AnsiStyler)
    } else {
        Box::new(PlainStyler)
    }
}
