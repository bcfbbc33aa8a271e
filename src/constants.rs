//! Global constants used throughout the brewer codebase.
//!
//! Timeouts, parallelism parameters and well-known file names live here so the
//! defaults shown in `--help` and the ones used by the library never drift apart.

use std::time::Duration;

/// Default JSON API root of the Python Package Index.
///
/// Release metadata is fetched from `{DEFAULT_INDEX_URL}/{name}/{version}/json`.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

/// Default timeout for a single package index request (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum number of concurrent index lookups regardless of CPU count.
pub const MIN_PARALLELISM: usize = 4;

/// Multiplier applied to CPU core count for default lookup parallelism.
///
/// Lookups are I/O bound, so more requests than cores are in flight.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Upper bound on concurrent index lookups, to stay polite with the index.
pub const MAX_PARALLELISM: usize = 16;

/// Default CPU core count when detection fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Project metadata file read from the project directory.
pub const PROJECT_FILE: &str = "pyproject.toml";

/// Resolved lockfile read from the project directory.
pub const LOCK_FILE: &str = "poetry.lock";

/// User agent sent with every index request.
pub const USER_AGENT: &str = concat!("brewer/", env!("CARGO_PKG_VERSION"));

/// Default number of concurrent index lookups for this machine.
pub fn default_parallelism() -> usize {
    let cores =
        std::thread::available_parallelism().map(std::num::NonZero::get).unwrap_or(FALLBACK_CORE_COUNT);
    (cores * PARALLELISM_CORE_MULTIPLIER).clamp(MIN_PARALLELISM, MAX_PARALLELISM)
}
