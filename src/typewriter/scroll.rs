/// Distance from the bottom, in pixels, that still counts as "at the bottom".
pub const DEFAULT_BOTTOM_THRESHOLD: f64 = 10.0;

/// Tracks whether the reader has scrolled away from the newest message.
///
/// While they have, a running reveal stops pulling the view down.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold: f64,
    user_scrolled: bool,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(DEFAULT_BOTTOM_THRESHOLD)
    }
}

impl ScrollTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            user_scrolled: false,
        }
    }

    /// Feeds a scroll event from the message container.
    pub fn on_scroll(&mut self, scroll_top: f64, client_height: f64, scroll_height: f64) {
        let at_bottom = scroll_top + client_height >= scroll_height - self.threshold;
        self.user_scrolled = !at_bottom;
    }

    pub fn should_autoscroll(&self) -> bool {
        !self.user_scrolled
    }

    pub fn user_scrolled(&self) -> bool {
        self.user_scrolled
    }

    /// Records a programmatic jump to the bottom.
    pub fn scrolled_to_bottom(&mut self) {
        self.user_scrolled = false;
    }

    /// Called when a reveal completes.
    pub fn finish(&mut self) {
        self.user_scrolled = false;
    }
}
