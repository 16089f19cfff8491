//! Core domain logic for Notekeeper.
//! This crate is the single source of truth for note ownership, visibility
//! and soft-delete invariants.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{AccessDenied, NoteAction};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::identity::{Actor, OwnerSummary, Role, User, UserId};
pub use model::note::{
    CreateNoteInput, Note, NoteId, NoteListOptions, NotePatch, NoteStatus, NoteValidationError,
    NoteView,
};
pub use model::{Clock, SystemClock};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{NoteService, NoteServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
