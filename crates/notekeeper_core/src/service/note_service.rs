//! Note use-case service with role-based access control.
//!
//! # Responsibility
//! - Provide create/list/get/update/soft-delete/restore/purge APIs.
//! - Apply the access policy before every storage mutation.
//! - Stamp server-owned fields (`user_id`, timestamps) from the session/clock.
//!
//! # Invariants
//! - Input validation runs before any storage access.
//! - Every operation re-reads current state for its authorization check; the
//!   following write is conditional on the same predicates (see `WriteScope`).
//! - Soft-deleted notes are `NotFound` for get/update/soft-delete.
//! - Log events carry ids and outcomes only, never titles or content.

use crate::access::{authorize_note_access, owner_scope, require_admin, AccessDenied, NoteAction};
use crate::model::identity::Actor;
use crate::model::note::{
    CreateNoteInput, Note, NoteId, NoteListOptions, NotePatch, NoteValidationError, NoteView,
};
use crate::model::{Clock, SystemClock};
use crate::repo::note_repo::{NoteQuery, NoteRepository, Visibility, WriteScope};
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Malformed input, rejected before storage access.
    Validation(NoteValidationError),
    /// No (live) note matches the id.
    NotFound(NoteId),
    /// Caller is authenticated but lacks role or ownership.
    Forbidden { action: NoteAction, note_id: NoteId },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(_) => write!(f, "Note not found"),
            Self::Forbidden { action, .. } => write!(f, "{}", AccessDenied { action: *action }),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository and the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: NoteRepository, C: Clock> NoteService<R, C> {
    /// Creates a service with an explicit clock.
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates a note owned by the acting identity.
    ///
    /// Client-supplied owner, id and timestamps never reach this point; the
    /// owner is always `actor.user_id`.
    pub fn create(
        &self,
        input: CreateNoteInput,
        actor: &Actor,
    ) -> Result<Note, NoteServiceError> {
        if let Err(err) = input.validate() {
            warn!(
                "event=note_create module=service status=invalid actor={} field={}",
                actor.user_id,
                err.field()
            );
            return Err(err.into());
        }

        let note = Note::new(input, actor.user_id, self.clock.now_epoch_ms());
        let note_id = self.repo.insert_note(&note)?;
        let created = self
            .repo
            .find_note(note_id, Visibility::Any)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))?;

        info!(
            "event=note_create module=service status=ok actor={} note={}",
            actor.user_id, note_id
        );
        Ok(created.note)
    }

    /// Lists notes visible to the actor, newest first.
    ///
    /// Members see only their own notes; admins see every note. Each view
    /// carries its owner summary. Soft-deleted notes appear only with
    /// `include_deleted`.
    pub fn list(
        &self,
        actor: &Actor,
        options: NoteListOptions,
    ) -> Result<Vec<NoteView>, NoteServiceError> {
        let query = NoteQuery {
            owner: owner_scope(actor),
            include_deleted: options.include_deleted,
            with_owner: true,
        };
        let notes = self.repo.list_notes(&query)?;

        info!(
            "event=note_list module=service status=ok actor={} role={} include_deleted={} count={}",
            actor.user_id,
            actor.role,
            options.include_deleted,
            notes.len()
        );
        Ok(notes)
    }

    /// Gets one live note with its owner summary.
    pub fn get_by_id(&self, id: NoteId, actor: &Actor) -> Result<NoteView, NoteServiceError> {
        self.resolve_live(id, actor, NoteAction::View)
    }

    /// Applies the present patch fields to a live note.
    pub fn update(
        &self,
        id: NoteId,
        patch: NotePatch,
        actor: &Actor,
    ) -> Result<Note, NoteServiceError> {
        if let Err(err) = patch.validate() {
            warn!(
                "event=note_update module=service status=invalid actor={} note={} field={}",
                actor.user_id,
                id,
                err.field()
            );
            return Err(err.into());
        }

        self.resolve_live(id, actor, NoteAction::Update)?;
        let scope = WriteScope::live(owner_scope(actor));
        let updated = self
            .repo
            .update_note(id, &patch, self.clock.now_epoch_ms(), &scope)
            .map_err(|err| self.write_failed(NoteAction::Update, id, actor, err))?;

        info!(
            "event=note_update module=service status=ok actor={} note={}",
            actor.user_id, id
        );
        Ok(updated)
    }

    /// Marks a live note deleted without removing the row.
    ///
    /// An already soft-deleted note is reported as `NotFound`.
    pub fn soft_delete(&self, id: NoteId, actor: &Actor) -> Result<Note, NoteServiceError> {
        self.resolve_live(id, actor, NoteAction::Delete)?;
        let scope = WriteScope::live(owner_scope(actor));
        let deleted = self
            .repo
            .set_deleted_at(id, Some(self.clock.now_epoch_ms()), &scope)
            .map_err(|err| self.write_failed(NoteAction::Delete, id, actor, err))?;

        info!(
            "event=note_delete module=service status=ok actor={} note={}",
            actor.user_id, id
        );
        Ok(deleted)
    }

    /// Clears the tombstone on any existing note. Admin only.
    ///
    /// Restoring a live note succeeds without changing it.
    pub fn restore(&self, id: NoteId, actor: &Actor) -> Result<Note, NoteServiceError> {
        self.require_admin(id, actor, NoteAction::Restore)?;
        let restored = self
            .repo
            .set_deleted_at(id, None, &WriteScope::any_row())
            .map_err(|err| self.write_failed(NoteAction::Restore, id, actor, err))?;

        info!(
            "event=note_restore module=service status=ok actor={} note={}",
            actor.user_id, id
        );
        Ok(restored)
    }

    /// Physically removes a note, live or soft-deleted. Admin only.
    pub fn permanent_delete(&self, id: NoteId, actor: &Actor) -> Result<Note, NoteServiceError> {
        self.require_admin(id, actor, NoteAction::PermanentDelete)?;
        let removed = self
            .repo
            .delete_note(id)
            .map_err(|err| self.write_failed(NoteAction::PermanentDelete, id, actor, err))?;

        info!(
            "event=note_purge module=service status=ok actor={} note={}",
            actor.user_id, id
        );
        Ok(removed)
    }

    fn resolve_live(
        &self,
        id: NoteId,
        actor: &Actor,
        action: NoteAction,
    ) -> Result<NoteView, NoteServiceError> {
        let Some(view) = self.repo.find_note(id, Visibility::Live)? else {
            info!(
                "event=note_access module=service status=not_found action={} actor={} note={}",
                action.as_str(),
                actor.user_id,
                id
            );
            return Err(NoteServiceError::NotFound(id));
        };

        if let Err(denied) = authorize_note_access(actor, view.note.user_id, action) {
            warn!(
                "event=note_access module=service status=denied action={} actor={} note={}",
                action.as_str(),
                actor.user_id,
                id
            );
            return Err(NoteServiceError::Forbidden {
                action: denied.action,
                note_id: id,
            });
        }

        Ok(view)
    }

    fn require_admin(
        &self,
        id: NoteId,
        actor: &Actor,
        action: NoteAction,
    ) -> Result<(), NoteServiceError> {
        require_admin(actor, action).map_err(|denied| {
            warn!(
                "event=note_access module=service status=denied action={} actor={} role={} note={}",
                action.as_str(),
                actor.user_id,
                actor.role,
                id
            );
            NoteServiceError::Forbidden {
                action: denied.action,
                note_id: id,
            }
        })
    }

    fn write_failed(
        &self,
        action: NoteAction,
        id: NoteId,
        actor: &Actor,
        err: RepoError,
    ) -> NoteServiceError {
        let status = match err {
            RepoError::NotFound(_) => "not_found",
            _ => "error",
        };
        warn!(
            "event=note_write module=service status={status} action={} actor={} note={} error={err}",
            action.as_str(),
            actor.user_id,
            id
        );
        err.into()
    }
}
