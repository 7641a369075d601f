//! Idle indicator on the terminal status line.
//!
//! While the watcher waits for edits a small glyph breathes on stderr. An
//! accepted local edit freezes it; it resumes once the edit is persisted.
//!
//! ## Widgets
//! - [`Twirl`] is the frame sequence, walked forward then backward.
//! - [`IndicatorState`] is the pure pause/resume machine driven by pipeline
//!   events.
//! - [`IdleIndicator`] ties both to a ticker and the terminal.

use std::io::Write;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;

use crate::content::ChangeSource;
use crate::events::PipelineEvent;

const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";
const ERASE_LINE: &str = "\x1b[2K";
const CURSOR_LEFT: &str = "\r";

/// Braille frames, from empty to full.
const FRAMES: &[&str] = &["⠀", "⠁", "⠉", "⠋", "⠛", "⠟", "⠿", "⡿", "⣿"];

/// Ping-pong walk over a frame list: 0, 1, .., n-1, n-2, .., 0, 1, ..
#[derive(Debug, Clone)]
pub struct Twirl {
    frames: &'static [&'static str],
    index: usize,
    forward: bool,
}

impl Twirl {
    pub fn new() -> Self {
        Self::with_frames(FRAMES)
    }

    pub fn with_frames(frames: &'static [&'static str]) -> Self {
        Self {
            frames,
            index: 0,
            forward: true,
        }
    }

    /// Current frame.
    pub fn frame(&self) -> &'static str {
        self.frames.get(self.index).copied().unwrap_or("")
    }

    /// Move one step and return the new frame.
    pub fn advance(&mut self) -> &'static str {
        let last = self.frames.len().saturating_sub(1);
        if last == 0 {
            return self.frame();
        }

        if self.forward {
            self.index += 1;
            if self.index == last {
                self.forward = false;
            }
        } else {
            self.index -= 1;
            if self.index == 0 {
                self.forward = true;
            }
        }
        self.frame()
    }

    /// Back to the first frame, moving forward.
    pub fn reset(&mut self) {
        self.index = 0;
        self.forward = true;
    }
}

impl Default for Twirl {
    fn default() -> Self {
        Self::new()
    }
}

/// Pause/resume logic of the indicator, without any I/O.
///
/// Only `ContentPersisted` resumes. A persist that fails publishes nothing, so
/// the indicator stays paused until a later save is written successfully.
#[derive(Debug, Default)]
pub struct IndicatorState {
    twirl: Twirl,
    paused: bool,
}

impl IndicatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// React to a pipeline event. Returns true when the visible state changed.
    pub fn on_event(&mut self, event: &PipelineEvent) -> bool {
        match event {
            PipelineEvent::ContentChanged(change) if change.source() == ChangeSource::Local => {
                self.twirl.reset();
                let was_paused = self.paused;
                self.paused = true;
                !was_paused
            }
            PipelineEvent::ContentChanged(_) => false,
            PipelineEvent::ContentPersisted => {
                let was_paused = self.paused;
                self.paused = false;
                was_paused
            }
        }
    }

    /// Next frame to draw, or `None` while paused.
    pub fn tick(&mut self) -> Option<&'static str> {
        if self.paused {
            None
        } else {
            Some(self.twirl.advance())
        }
    }
}

/// Animated idle glyph on stderr.
pub struct IdleIndicator {
    period: Duration,
}

impl IdleIndicator {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Only draw on an interactive stderr.
    pub fn enabled() -> bool {
        is_terminal::is_terminal(std::io::stderr())
    }

    /// Animate until the bus closes.
    pub async fn run(self, mut events: broadcast::Receiver<PipelineEvent>) {
        let mut state = IndicatorState::new();
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(frame) = state.tick() {
                        redraw(frame);
                    }
                }
                received = events.recv() => match received {
                    Ok(event) => {
                        if state.on_event(&event) && !state.is_paused() {
                            ticker.reset();
                        }
                    }
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }

        clear();
    }
}

fn redraw(frame: &str) {
    let mut stderr = std::io::stderr().lock();
    // Nothing useful to do if the terminal went away
    let _ = write!(stderr, "{CURSOR_HIDE}{ERASE_LINE}{CURSOR_LEFT}{frame}{CURSOR_LEFT}");
    let _ = stderr.flush();
}

fn clear() {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(stderr, "{ERASE_LINE}{CURSOR_LEFT}{CURSOR_SHOW}");
    let _ = stderr.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ChangeEvent;

    const THREE: &[&str] = &["a", "b", "c"];

    #[test]
    fn test_twirl_ping_pongs() {
        let mut twirl = Twirl::with_frames(THREE);
        let walk: Vec<_> = (0..6).map(|_| twirl.advance()).collect();
        assert_eq!(walk, vec!["b", "c", "b", "a", "b", "c"]);
    }

    #[test]
    fn test_twirl_single_frame_stays_put() {
        let mut twirl = Twirl::with_frames(&["x"]);
        assert_eq!(twirl.advance(), "x");
        assert_eq!(twirl.advance(), "x");
    }

    #[test]
    fn test_local_change_pauses_until_persisted() {
        let mut state = IndicatorState::new();
        assert!(state.tick().is_some());

        assert!(state.on_event(&PipelineEvent::ContentChanged(ChangeEvent::local("p", "x"))));
        assert!(state.tick().is_none());

        assert!(state.on_event(&PipelineEvent::ContentPersisted));
        // Restarts from the first frame
        assert_eq!(state.tick(), Some(FRAMES[1]));
    }

    #[test]
    fn test_failed_persist_keeps_indicator_paused() {
        let mut state = IndicatorState::new();
        state.on_event(&PipelineEvent::ContentChanged(ChangeEvent::local("p", "x")));

        // The write for "p" failed, then the user saves again
        assert!(!state.on_event(&PipelineEvent::ContentChanged(ChangeEvent::local("p", "y"))));
        assert!(state.is_paused());
        assert!(state.tick().is_none());

        assert!(state.on_event(&PipelineEvent::ContentPersisted));
        assert!(!state.is_paused());
    }

    #[test]
    fn test_database_change_does_not_pause() {
        let mut state = IndicatorState::new();
        assert!(!state.on_event(&PipelineEvent::ContentChanged(ChangeEvent::database("p", "x"))));
        assert!(!state.is_paused());
    }
}
