//! Role-based access policy for note operations.
//!
//! # Responsibility
//! - Hold the role x ownership rule table in one place.
//! - Stay independent of storage and transport so it can be tested alone.
//!
//! # Invariants
//! - Admins may read/update/soft-delete any note.
//! - Members may act only on notes they own.
//! - Restore and permanent delete require the admin role regardless of
//!   ownership.

use crate::model::identity::{Actor, UserId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Operation being authorized, used for error reporting and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    View,
    Update,
    Delete,
    Restore,
    PermanentDelete,
}

impl NoteAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::PermanentDelete => "permanently delete",
        }
    }
}

/// Caller lacks the role or ownership an action requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDenied {
    pub action: NoteAction,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "You don't have permission to {} this note",
            self.action.as_str()
        )
    }
}

impl Error for AccessDenied {}

/// Applies the ownership rule table to one note.
///
/// | Role   | Owns note | Result  |
/// |--------|-----------|---------|
/// | admin  | any       | allowed |
/// | member | yes       | allowed |
/// | member | no        | denied  |
pub fn authorize_note_access(
    actor: &Actor,
    owner_id: UserId,
    action: NoteAction,
) -> Result<(), AccessDenied> {
    if actor.is_admin() || actor.user_id == owner_id {
        Ok(())
    } else {
        Err(AccessDenied { action })
    }
}

/// Requires the admin role for `action`, independent of ownership.
pub fn require_admin(actor: &Actor, action: NoteAction) -> Result<(), AccessDenied> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AccessDenied { action })
    }
}

/// Owner restriction for listing and scoped writes.
///
/// `None` means every owner's rows are in scope (admins); members are limited
/// to their own id.
pub fn owner_scope(actor: &Actor) -> Option<UserId> {
    if actor.is_admin() {
        None
    } else {
        Some(actor.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{authorize_note_access, owner_scope, require_admin, AccessDenied, NoteAction};
    use crate::model::identity::Actor;
    use uuid::Uuid;

    #[test]
    fn admin_may_access_any_note() {
        let admin = Actor::admin(Uuid::new_v4());
        assert!(authorize_note_access(&admin, Uuid::new_v4(), NoteAction::Update).is_ok());
        assert!(authorize_note_access(&admin, admin.user_id, NoteAction::View).is_ok());
    }

    #[test]
    fn member_may_access_only_owned_notes() {
        let member = Actor::member(Uuid::new_v4());
        assert!(authorize_note_access(&member, member.user_id, NoteAction::Delete).is_ok());
        assert_eq!(
            authorize_note_access(&member, Uuid::new_v4(), NoteAction::Delete),
            Err(AccessDenied {
                action: NoteAction::Delete
            })
        );
    }

    #[test]
    fn admin_only_actions_ignore_ownership() {
        let member = Actor::member(Uuid::new_v4());
        let admin = Actor::admin(Uuid::new_v4());
        assert!(require_admin(&member, NoteAction::Restore).is_err());
        assert!(require_admin(&admin, NoteAction::PermanentDelete).is_ok());
    }

    #[test]
    fn owner_scope_is_unrestricted_only_for_admins() {
        let member = Actor::member(Uuid::new_v4());
        assert_eq!(owner_scope(&member), Some(member.user_id));
        assert_eq!(owner_scope(&Actor::admin(Uuid::new_v4())), None);
    }

    #[test]
    fn denial_message_names_the_action() {
        let err = AccessDenied {
            action: NoteAction::Update,
        };
        assert_eq!(
            err.to_string(),
            "You don't have permission to update this note"
        );
    }
}
