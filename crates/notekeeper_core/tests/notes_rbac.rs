use notekeeper_core::db::open_db_in_memory;
use notekeeper_core::{
    Actor, CreateNoteInput, NoteAction, NoteListOptions, NotePatch, NoteService,
    NoteServiceError, NoteStatus, NoteValidationError, Role, SqliteNoteRepository,
    SqliteUserRepository, User, UserRepository,
};
use rusqlite::{params, Connection};

struct Accounts {
    admin: User,
    alice: User,
    bob: User,
}

fn seed_accounts(conn: &Connection) -> Accounts {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    let accounts = Accounts {
        admin: User::new("Admin User", "admin@example.com", Role::Admin, 0),
        alice: User::new("Member One", "member1@example.com", Role::Member, 0),
        bob: User::new("Member Two", "member2@example.com", Role::Member, 0),
    };
    for user in [&accounts.admin, &accounts.alice, &accounts.bob] {
        users.create_user(user).unwrap();
    }
    accounts
}

fn include_deleted() -> NoteListOptions {
    NoteListOptions {
        include_deleted: true,
    }
}

fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_stamps_owner_from_actor_and_defaults_status() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    // A client-supplied owner is dropped during decoding.
    let input: CreateNoteInput = serde_json::from_value(serde_json::json!({
        "title": "Shopping list",
        "userId": accounts.bob.id.to_string(),
    }))
    .unwrap();

    let note = service.create(input, &accounts.alice.actor()).unwrap();
    assert_eq!(note.user_id, accounts.alice.id);
    assert_eq!(note.status, NoteStatus::Active);
    assert!(note.deleted_at.is_none());
    assert!(note.updated_at.is_none());
}

#[test]
fn create_rejects_empty_title_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let err = service
        .create(CreateNoteInput::new(""), &accounts.alice.actor())
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::EmptyTitle)
    ));

    let err = service
        .create(CreateNoteInput::new("x".repeat(257)), &accounts.alice.actor())
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::TitleTooLong { .. })
    ));
    assert_eq!(row_count(&conn), 0);
}

#[test]
fn list_is_scoped_by_role() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    service
        .create(CreateNoteInput::new("Shopping list"), &accounts.alice.actor())
        .unwrap();

    let as_alice = service
        .list(&accounts.alice.actor(), NoteListOptions::default())
        .unwrap();
    assert_eq!(as_alice.len(), 1);
    assert_eq!(as_alice[0].note.title, "Shopping list");
    let owner = as_alice[0].owner.as_ref().unwrap();
    assert_eq!(owner.id, accounts.alice.id);
    assert_eq!(owner.email, "member1@example.com");

    let as_bob = service
        .list(&accounts.bob.actor(), NoteListOptions::default())
        .unwrap();
    assert!(as_bob.is_empty());

    let as_admin = service
        .list(&accounts.admin.actor(), NoteListOptions::default())
        .unwrap();
    assert_eq!(as_admin.len(), 1);
    let owner = as_admin[0].owner.as_ref().expect("admin sees owner");
    assert_eq!(owner, &accounts.alice.summary());
}

#[test]
fn member_list_never_contains_other_members_notes() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    for idx in 0..3 {
        service
            .create(
                CreateNoteInput::new(format!("alice {idx}")),
                &accounts.alice.actor(),
            )
            .unwrap();
        service
            .create(
                CreateNoteInput::new(format!("bob {idx}")),
                &accounts.bob.actor(),
            )
            .unwrap();
    }

    let listed = service
        .list(&accounts.alice.actor(), include_deleted())
        .unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed
        .iter()
        .all(|view| view.note.user_id == accounts.alice.id));

    let all = service
        .list(&accounts.admin.actor(), NoteListOptions::default())
        .unwrap();
    assert_eq!(all.len(), 6);
}

#[test]
fn list_orders_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let actor = accounts.alice.actor();

    let older = service.create(CreateNoteInput::new("older"), &actor).unwrap();
    let newer = service.create(CreateNoteInput::new("newer"), &actor).unwrap();

    conn.execute(
        "UPDATE notes SET created_at = 1000 WHERE id = ?1;",
        params![older.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE notes SET created_at = 2000 WHERE id = ?1;",
        params![newer.id.to_string()],
    )
    .unwrap();

    let listed = service.list(&actor, NoteListOptions::default()).unwrap();
    let ids: Vec<_> = listed.iter().map(|view| view.note.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[test]
fn get_by_id_follows_rule_table() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service
        .create(CreateNoteInput::new("Learning Resources"), &accounts.alice.actor())
        .unwrap();

    let own = service.get_by_id(note.id, &accounts.alice.actor()).unwrap();
    assert_eq!(own.note, note);
    assert_eq!(own.owner, Some(accounts.alice.summary()));

    let err = service
        .get_by_id(note.id, &accounts.bob.actor())
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Forbidden {
            action: NoteAction::View,
            ..
        }
    ));

    let as_admin = service.get_by_id(note.id, &accounts.admin.actor()).unwrap();
    assert_eq!(as_admin.note.id, note.id);

    let missing = service
        .get_by_id(uuid::Uuid::new_v4(), &accounts.admin.actor())
        .unwrap_err();
    assert!(matches!(missing, NoteServiceError::NotFound(_)));
}

#[test]
fn update_applies_only_present_fields() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let actor = accounts.alice.actor();

    let note = service
        .create(
            CreateNoteInput {
                title: "Feature Implementation Ideas".to_string(),
                content: Some("push notifications".to_string()),
                status: Some(NoteStatus::Draft),
            },
            &actor,
        )
        .unwrap();

    let updated = service
        .update(
            note.id,
            NotePatch {
                status: Some(NoteStatus::Archived),
                ..NotePatch::default()
            },
            &actor,
        )
        .unwrap();
    assert_eq!(updated.title, note.title);
    assert_eq!(updated.content, note.content);
    assert_eq!(updated.status, NoteStatus::Archived);
    assert_eq!(updated.user_id, note.user_id);
    assert_eq!(updated.created_at, note.created_at);
    assert!(updated.updated_at.is_some());
}

#[test]
fn member_cannot_update_another_members_note() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service
        .create(CreateNoteInput::new("mine"), &accounts.alice.actor())
        .unwrap();

    let err = service
        .update(
            note.id,
            NotePatch {
                title: Some("hijacked".to_string()),
                ..NotePatch::default()
            },
            &accounts.bob.actor(),
        )
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Forbidden { .. }));

    let unchanged = service.get_by_id(note.id, &accounts.alice.actor()).unwrap();
    assert_eq!(unchanged.note, note);
}

#[test]
fn admin_may_update_any_note() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service
        .create(CreateNoteInput::new("draft"), &accounts.alice.actor())
        .unwrap();

    let updated = service
        .update(
            note.id,
            NotePatch {
                title: Some("reviewed".to_string()),
                ..NotePatch::default()
            },
            &accounts.admin.actor(),
        )
        .unwrap();
    assert_eq!(updated.title, "reviewed");
    assert_eq!(updated.user_id, accounts.alice.id);
}

#[test]
fn update_validates_title_before_lookup() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let err = service
        .update(
            uuid::Uuid::new_v4(),
            NotePatch {
                title: Some(String::new()),
                ..NotePatch::default()
            },
            &accounts.alice.actor(),
        )
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Validation(_)));
}

#[test]
fn soft_delete_hides_note_from_default_reads() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let actor = accounts.alice.actor();
    let note = service.create(CreateNoteInput::new("temp"), &actor).unwrap();

    let deleted = service.soft_delete(note.id, &actor).unwrap();
    assert!(deleted.deleted_at.is_some());

    assert!(service
        .list(&actor, NoteListOptions::default())
        .unwrap()
        .is_empty());
    let with_deleted = service.list(&actor, include_deleted()).unwrap();
    assert_eq!(with_deleted.len(), 1);
    assert!(with_deleted[0].note.deleted_at.is_some());

    for caller in [actor, accounts.admin.actor()] {
        let err = service.get_by_id(note.id, &caller).unwrap_err();
        assert!(matches!(err, NoteServiceError::NotFound(id) if id == note.id));
    }

    // Already deleted reads as not found, for owner and admin alike.
    let again = service.soft_delete(note.id, &accounts.admin.actor()).unwrap_err();
    assert!(matches!(again, NoteServiceError::NotFound(_)));
    let update = service
        .update(note.id, NotePatch::default(), &actor)
        .unwrap_err();
    assert!(matches!(update, NoteServiceError::NotFound(_)));
    assert_eq!(row_count(&conn), 1);
}

#[test]
fn member_cannot_soft_delete_another_members_note() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service
        .create(CreateNoteInput::new("keep"), &accounts.alice.actor())
        .unwrap();

    let err = service
        .soft_delete(note.id, &accounts.bob.actor())
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Forbidden { .. }));

    let deleted = service
        .soft_delete(note.id, &accounts.admin.actor())
        .unwrap();
    assert!(deleted.deleted_at.is_some());
}

#[test]
fn restore_is_admin_only_and_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let actor = accounts.alice.actor();
    let note = service.create(CreateNoteInput::new("restore me"), &actor).unwrap();
    service.soft_delete(note.id, &actor).unwrap();

    let err = service.restore(note.id, &actor).unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Forbidden {
            action: NoteAction::Restore,
            ..
        }
    ));

    // Role is checked before lookup: unknown ids are still Forbidden.
    let err = service
        .restore(uuid::Uuid::new_v4(), &actor)
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Forbidden { .. }));

    let admin = accounts.admin.actor();
    let restored = service.restore(note.id, &admin).unwrap();
    assert!(restored.deleted_at.is_none());

    let visible = service.get_by_id(note.id, &actor).unwrap();
    assert!(visible.note.deleted_at.is_none());

    let first = service.restore(note.id, &admin).unwrap();
    let second = service.restore(note.id, &admin).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, restored);
}

#[test]
fn restore_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let err = service
        .restore(uuid::Uuid::new_v4(), &accounts.admin.actor())
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NotFound(_)));
}

#[test]
fn permanent_delete_removes_row_for_good() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service
        .create(CreateNoteInput::new("Code Review Feedback"), &accounts.bob.actor())
        .unwrap();

    let err = service
        .permanent_delete(note.id, &accounts.bob.actor())
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Forbidden {
            action: NoteAction::PermanentDelete,
            ..
        }
    ));

    let admin = accounts.admin.actor();
    let removed = service.permanent_delete(note.id, &admin).unwrap();
    assert_eq!(removed, note);
    assert_eq!(row_count(&conn), 0);

    let restore = service.restore(note.id, &admin).unwrap_err();
    assert!(matches!(restore, NoteServiceError::NotFound(_)));
    let purge = service.permanent_delete(note.id, &admin).unwrap_err();
    assert!(matches!(purge, NoteServiceError::NotFound(_)));
}

#[test]
fn permanent_delete_accepts_soft_deleted_notes() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let note = service
        .create(CreateNoteInput::new("gone"), &accounts.alice.actor())
        .unwrap();
    service
        .soft_delete(note.id, &accounts.alice.actor())
        .unwrap();

    let removed = service
        .permanent_delete(note.id, &accounts.admin.actor())
        .unwrap();
    assert!(removed.deleted_at.is_some());
    assert_eq!(row_count(&conn), 0);
}

#[test]
fn deleting_owner_cascades_to_notes() {
    let conn = open_db_in_memory().unwrap();
    let accounts = seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    service
        .create(CreateNoteInput::new("alice"), &accounts.alice.actor())
        .unwrap();
    service
        .create(CreateNoteInput::new("bob"), &accounts.bob.actor())
        .unwrap();

    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .delete_user(accounts.alice.id)
        .unwrap();

    let remaining = service
        .list(&accounts.admin.actor(), include_deleted())
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].note.user_id, accounts.bob.id);
}

#[test]
fn create_for_unknown_identity_fails() {
    let conn = open_db_in_memory().unwrap();
    seed_accounts(&conn);
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let stranger = Actor::member(uuid::Uuid::new_v4());
    let err = service
        .create(CreateNoteInput::new("orphan"), &stranger)
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::Repo(_)));
    assert_eq!(row_count(&conn), 0);
}
