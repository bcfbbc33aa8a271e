//! Progress indicators for package index lookups.
//!
//! A thin wrapper over `indicatif` with brewer's styling. When progress is
//! disabled (`--no-progress`, `BREWER_NO_PROGRESS`, or quiet mode) the bar is
//! created hidden and silently ignores every call, so callers never branch on it.
//! `indicatif` also stays silent on its own when stderr is not a terminal.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// A progress bar with consistent styling.
///
/// Cloning is cheap and clones share the same underlying bar, so a clone can be
/// moved into each concurrent lookup.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a progress bar tracking `len` units of work.
    ///
    /// Returns a hidden bar when `enabled` is false.
    pub fn new(len: u64, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar.set_prefix("Resolving");
            bar
        } else {
            IndicatifBar::hidden()
        };
        Self {
            inner: bar,
        }
    }

    /// Sets the message displayed to the right of the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Advances the bar by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}
