//! Supporting utilities
//!
//! - [`fs`] - Atomic file writes and path helpers
//! - [`progress`] - Progress bars for long-running lookups

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, expand_home, safe_write};
pub use progress::ProgressBar;
