//! RPC dispatch onto the note service.
//!
//! # Responsibility
//! - Resolve the session against the local identity table.
//! - Enforce session presence and method access tiers.
//! - Decode params, call the note service, encode the result envelope.
//!
//! # Invariants
//! - Never panics; every failure becomes an `RpcResponse` with `ok = false`.
//! - Unknown identities are `UNAUTHORIZED`; the stored role is authoritative.
//! - Malformed params and ids are rejected before any note storage access.
//! - Internal failures are logged in full but surfaced with a generic message.

use crate::protocol::{
    AccessTier, CreateParams, IdParams, ListParams, Method, RpcError, RpcErrorCode, RpcRequest,
    RpcResponse, Session, UpdateParams,
};
use log::{error, info, warn};
use notekeeper_core::model::note::parse_note_id;
use notekeeper_core::{
    Actor, CreateNoteInput, NoteId, NoteListOptions, NotePatch, NoteService, NoteServiceError,
    NoteValidationError, SqliteNoteRepository, SqliteUserRepository, UserRepository,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

type NotesService<'conn> = NoteService<SqliteNoteRepository<'conn>>;

/// Serves RPC calls against one migrated connection.
pub struct RpcHandler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> RpcHandler<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Handles one decoded request on behalf of `session`.
    ///
    /// `None` means the identity collaborator found no valid session.
    pub fn handle(&self, session: Option<&Session>, request: &RpcRequest) -> RpcResponse {
        let started_at = Instant::now();
        let result = self.dispatch(session, request);
        let status = match &result {
            Ok(_) => "ok",
            Err(err) => err.code.as_str(),
        };
        info!(
            "event=rpc_call module=rpc status={status} method={} duration_ms={}",
            request.method,
            started_at.elapsed().as_millis()
        );

        match result {
            Ok(data) => RpcResponse::success(data),
            Err(err) => RpcResponse::failure(err),
        }
    }

    /// Decodes a JSON request line, handles it and encodes the response.
    pub fn handle_json(&self, session: Option<&Session>, raw: &str) -> String {
        let response = match serde_json::from_str::<RpcRequest>(raw) {
            Ok(request) => self.handle(session, &request),
            Err(err) => RpcResponse::failure(RpcError::bad_request(
                "request",
                format!("malformed request: {err}"),
            )),
        };
        encode_response(&response)
    }

    fn dispatch(&self, session: Option<&Session>, request: &RpcRequest) -> Result<Value, RpcError> {
        let method = Method::parse(&request.method).ok_or_else(|| {
            RpcError::new(
                RpcErrorCode::MethodNotFound,
                format!("no such method `{}`", request.method),
            )
        })?;
        let session = session.ok_or_else(|| {
            RpcError::new(RpcErrorCode::Unauthorized, "authentication required")
        })?;
        let actor = self.resolve_actor(session)?;
        check_tier(method, &actor)?;

        match method {
            Method::Create => {
                let params: CreateParams = decode_params(&request.params)?;
                let input = CreateNoteInput::try_from(params).map_err(invalid_input)?;
                let service = self.service()?;
                to_data(service.create(input, &actor))
            }
            Method::List => {
                let params: ListParams = if request.params.is_null() {
                    ListParams::default()
                } else {
                    decode_params(&request.params)?
                };
                let options = NoteListOptions {
                    include_deleted: params.include_deleted,
                };
                let service = self.service()?;
                to_data(service.list(&actor, options))
            }
            Method::ById => {
                let id = decode_id(&request.params)?;
                to_data(self.service()?.get_by_id(id, &actor))
            }
            Method::Update => {
                let params: UpdateParams = decode_params(&request.params)?;
                let id = parse_note_id(&params.id).map_err(invalid_input)?;
                let patch = NotePatch::try_from(params.data).map_err(invalid_input)?;
                to_data(self.service()?.update(id, patch, &actor))
            }
            Method::Delete => {
                let id = decode_id(&request.params)?;
                to_data(self.service()?.soft_delete(id, &actor))
            }
            Method::Restore => {
                let id = decode_id(&request.params)?;
                to_data(self.service()?.restore(id, &actor))
            }
            Method::PermanentDelete => {
                let id = decode_id(&request.params)?;
                to_data(self.service()?.permanent_delete(id, &actor))
            }
        }
    }

    /// Maps the session claim onto the stored identity row.
    fn resolve_actor(&self, session: &Session) -> Result<Actor, RpcError> {
        let user = SqliteUserRepository::try_new(self.conn)
            .and_then(|users| users.get_user(session.user_id))
            .map_err(|err| {
                error!("event=rpc_session module=rpc status=error error={err}");
                internal_error()
            })?;
        let Some(user) = user else {
            warn!(
                "event=rpc_session module=rpc status=unknown_user user_id={}",
                session.user_id
            );
            return Err(RpcError::new(
                RpcErrorCode::Unauthorized,
                "session does not match a known user",
            ));
        };

        if user.role != session.role {
            warn!(
                "event=rpc_session module=rpc status=role_mismatch user_id={} claimed={} stored={}",
                user.id, session.role, user.role
            );
        }
        Ok(user.actor())
    }

    fn service(&self) -> Result<NotesService<'conn>, RpcError> {
        let repo = SqliteNoteRepository::try_new(self.conn).map_err(|err| {
            error!("event=rpc_repo_init module=rpc status=error error={err}");
            internal_error()
        })?;
        Ok(NoteService::new(repo))
    }
}

/// Rejects callers whose role does not meet the method's tier.
fn check_tier(method: Method, actor: &Actor) -> Result<(), RpcError> {
    match method.access_tier() {
        AccessTier::Authenticated | AccessTier::Member => Ok(()),
        AccessTier::Admin if actor.is_admin() => Ok(()),
        AccessTier::Admin => Err(RpcError::new(
            RpcErrorCode::Forbidden,
            format!("`{}` requires the admin role", method.name()),
        )),
    }
}

fn decode_params<T: DeserializeOwned>(params: &Value) -> Result<T, RpcError> {
    serde_json::from_value(params.clone())
        .map_err(|err| RpcError::bad_request("params", format!("invalid params: {err}")))
}

fn decode_id(params: &Value) -> Result<NoteId, RpcError> {
    let params: IdParams = decode_params(params)?;
    parse_note_id(&params.id).map_err(invalid_input)
}

fn invalid_input(err: NoteValidationError) -> RpcError {
    RpcError::bad_request(err.field(), err.to_string())
}

fn to_data<T: Serialize>(result: Result<T, NoteServiceError>) -> Result<Value, RpcError> {
    let value = result.map_err(map_service_error)?;
    serde_json::to_value(value).map_err(|err| {
        error!("event=rpc_encode module=rpc status=error error={err}");
        internal_error()
    })
}

fn map_service_error(err: NoteServiceError) -> RpcError {
    match err {
        NoteServiceError::Validation(invalid) => invalid_input(invalid),
        NoteServiceError::NotFound(_) => RpcError::new(RpcErrorCode::NotFound, "Note not found"),
        forbidden @ NoteServiceError::Forbidden { .. } => {
            RpcError::new(RpcErrorCode::Forbidden, forbidden.to_string())
        }
        other => {
            error!("event=rpc_call module=rpc status=internal_error error={other}");
            internal_error()
        }
    }
}

fn internal_error() -> RpcError {
    RpcError::new(RpcErrorCode::InternalServerError, "internal error")
}

fn encode_response(response: &RpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        error!("event=rpc_encode module=rpc status=error error={err}");
        r#"{"ok":false,"error":{"code":"INTERNAL_SERVER_ERROR","message":"internal error"}}"#
            .to_string()
    })
}
