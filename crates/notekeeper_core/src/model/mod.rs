//! Domain model for notes and the identities that own them.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field-level validation next to the types it protects.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId` and owned by one `UserId`.
//! - Deletion is represented by a `deleted_at` tombstone until an admin purges
//!   the row.

pub mod identity;
pub mod note;

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" for timestamp stamping.
///
/// Injected into services so tests can pin time.
pub trait Clock {
    /// Current time in Unix epoch milliseconds.
    fn now_epoch_ms(&self) -> i64;
}

/// Wall-clock implementation backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}
