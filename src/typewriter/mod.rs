//! Typewriter reveal of formatted replies.
//!
//! A reply is revealed one visible character per tick against its already
//! formatted markup, with a cursor marker at the reveal boundary. Unlike a
//! plain character slice of the HTML string, the reveal is tag-aware: a frame
//! never contains half a tag, and elements still open at the boundary are
//! closed after the cursor so every frame is well-formed markup.
//!
//! There is no cancellation. Each reveal targets its own container and runs
//! to completion independently of any other.

pub mod ansi;
pub mod markup;
pub mod scroll;

pub use ansi::{AnsiRenderer, TerminalSink};
pub use markup::{Tag, TagKind, Unit, tokenize};
pub use scroll::ScrollTracker;

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Marker appended at the reveal boundary while typing.
pub const CURSOR_MARKER: &str = r#"<span class="cursor">|</span>"#;

/// Default delay between two revealed characters.
pub const DEFAULT_TICK: Duration = Duration::from_millis(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    /// Number of visible characters shown so far.
    Revealing(usize),
    Done,
}

/// What the container should display after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Partial markup, cursor included.
    Partial(String),
    /// The complete markup, cursor removed.
    Done(String),
}

impl Frame {
    pub fn html(&self) -> &str {
        match self {
            Frame::Partial(html) | Frame::Done(html) => html,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Frame::Done(_))
    }
}

/// Receives frames from [`play`].
pub trait FrameSink: Send {
    /// `delta` holds the units revealed by this tick, including any markup
    /// that precedes the new character (or trails the text, on the final
    /// frame).
    fn render(&mut self, frame: &Frame, delta: &[Unit]);

    fn scroll_to_bottom(&mut self) {}
}

/// Reveal state machine for one message.
#[derive(Debug, Clone)]
pub struct Typewriter {
    html: String,
    units: Vec<Unit>,
    visible_total: usize,
    state: RevealState,
    emitted: usize,
    delta: (usize, usize),
    /// Markup of the units emitted so far.
    prefix: String,
    /// Elements opened in `prefix` and not yet closed.
    open: Vec<String>,
}

impl Typewriter {
    pub fn new(formatted_html: impl Into<String>) -> Self {
        let html = formatted_html.into();
        let units = tokenize(&html);
        let visible_total = units.iter().filter(|u| u.is_visible()).count();
        let prefix = String::with_capacity(html.len());
        Self {
            html,
            units,
            visible_total,
            state: RevealState::Revealing(0),
            emitted: 0,
            delta: (0, 0),
            prefix,
            open: Vec::new(),
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == RevealState::Done
    }

    pub fn visible_len(&self) -> usize {
        self.visible_total
    }

    pub fn full_html(&self) -> &str {
        &self.html
    }

    /// Units revealed by the most recent [`tick`](Self::tick).
    pub fn last_delta(&self) -> &[Unit] {
        &self.units[self.delta.0..self.delta.1]
    }

    /// Advances the reveal by one character.
    ///
    /// Returns one `Partial` frame per visible character, then `Done`.
    /// Ticking after `Done` keeps returning `Done` with an empty delta.
    pub fn tick(&mut self) -> Frame {
        match self.state {
            RevealState::Revealing(shown) if shown < self.visible_total => {
                let start = self.emitted;
                let end = self.next_visible_end();
                for unit in &self.units[start..end] {
                    self.prefix.push_str(unit.as_str());
                    if let Unit::Tag(tag) = unit {
                        match tag.kind {
                            TagKind::Open => self.open.push(tag.name.clone()),
                            TagKind::Close => {
                                if let Some(pos) = self.open.iter().rposition(|n| *n == tag.name) {
                                    self.open.truncate(pos);
                                }
                            }
                            TagKind::Void => {}
                        }
                    }
                }
                self.delta = (start, end);
                self.emitted = end;
                self.state = RevealState::Revealing(shown + 1);
                Frame::Partial(self.partial_html())
            }
            RevealState::Revealing(_) => {
                self.delta = (self.emitted, self.units.len());
                self.emitted = self.units.len();
                self.state = RevealState::Done;
                Frame::Done(self.html.clone())
            }
            RevealState::Done => {
                self.delta = (self.units.len(), self.units.len());
                Frame::Done(self.html.clone())
            }
        }
    }

    /// Index just past the next visible unit after those already emitted.
    fn next_visible_end(&self) -> usize {
        self.units[self.emitted..]
            .iter()
            .position(Unit::is_visible)
            .map_or(self.units.len(), |i| self.emitted + i + 1)
    }

    fn partial_html(&self) -> String {
        let closing: usize = self.open.iter().map(|name| name.len() + 3).sum();
        let mut html = String::with_capacity(self.prefix.len() + CURSOR_MARKER.len() + closing);
        html.push_str(&self.prefix);
        html.push_str(CURSOR_MARKER);
        for name in self.open.iter().rev() {
            html.push_str("</");
            html.push_str(name);
            html.push('>');
        }
        html
    }
}

/// Runs a reveal to completion, one tick per `interval`.
///
/// After every partial frame the sink is scrolled to the bottom unless the
/// reader has scrolled away; the tracker is reset once the reveal is done.
/// Returns the final markup.
pub async fn play<S: FrameSink + ?Sized>(
    mut typewriter: Typewriter,
    interval: Duration,
    sink: &mut S,
    scroll: &Mutex<ScrollTracker>,
) -> String {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let frame = typewriter.tick();
        sink.render(&frame, typewriter.last_delta());

        match frame {
            Frame::Partial(_) => {
                let mut tracker = scroll.lock();
                if tracker.should_autoscroll() {
                    sink.scroll_to_bottom();
                    tracker.scrolled_to_bottom();
                }
            }
            Frame::Done(html) => {
                scroll.lock().finish();
                return html;
            }
        }
    }
}
