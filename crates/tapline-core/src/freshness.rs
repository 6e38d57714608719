//! # Freshness Mark
//!
//! The persisted epoch-millis of the last successful fetch and the fixed
//! one-hour staleness window.
//!
//! ```text
//!   last_fetch                       last_fetch + STALE_AFTER_MS
//!       │◄──────────── fresh ─────────────►│◄────── stale ──────►
//!       ▼                                  ▼
//!  ─────┼──────────────────────────────────┼──────────────────────► now
//! ```

use serde::{Deserialize, Serialize};

/// Length of the staleness window: one hour in milliseconds.
pub const STALE_AFTER_MS: i64 = 60 * 60 * 1000;

/// When the item list was last fetched successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FreshnessMark {
    /// Epoch milliseconds; `0` means never fetched.
    pub last_fetch_epoch_millis: i64,
}

impl FreshnessMark {
    pub fn new(last_fetch_epoch_millis: i64) -> Self {
        FreshnessMark {
            last_fetch_epoch_millis,
        }
    }

    /// Returns true once `now` has reached the end of the window.
    ///
    /// The boundary itself counts as stale.
    pub fn is_stale(&self, now_epoch_millis: i64) -> bool {
        now_epoch_millis >= self.last_fetch_epoch_millis.saturating_add(STALE_AFTER_MS)
    }

    #[inline]
    pub fn never_fetched(&self) -> bool {
        self.last_fetch_epoch_millis == 0
    }
}
