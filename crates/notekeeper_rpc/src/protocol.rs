//! Wire types for the notes RPC surface.
//!
//! # Responsibility
//! - Name every callable operation and its access tier.
//! - Define request params, the response envelope and error codes.
//!
//! # Invariants
//! - Params and payloads use camelCase keys.
//! - Error codes are stable strings callers can branch on.

use notekeeper_core::{
    CreateNoteInput, NotePatch, NoteStatus, NoteValidationError, Role, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// Identity claim handed over by the transport from the caller's session.
///
/// The claim is resolved against the local `users` table before dispatch; the
/// stored role wins when the two disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
}

/// One RPC call: `{"method": "notes.byId", "params": {"id": "..."}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Who may call a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    /// Any authenticated session.
    Authenticated,
    /// Sessions with a member or admin role.
    Member,
    /// Admin sessions only.
    Admin,
}

/// Callable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Create,
    List,
    ById,
    Update,
    Delete,
    Restore,
    PermanentDelete,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Create,
        Method::List,
        Method::ById,
        Method::Update,
        Method::Delete,
        Method::Restore,
        Method::PermanentDelete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Create => "notes.create",
            Self::List => "notes.list",
            Self::ById => "notes.byId",
            Self::Update => "notes.update",
            Self::Delete => "notes.delete",
            Self::Restore => "notes.restore",
            Self::PermanentDelete => "notes.permanentDelete",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }

    pub fn access_tier(self) -> AccessTier {
        match self {
            Self::Create => AccessTier::Member,
            Self::List | Self::ById | Self::Update | Self::Delete => AccessTier::Authenticated,
            Self::Restore | Self::PermanentDelete => AccessTier::Admin,
        }
    }
}

/// `notes.list` params. The whole object is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub include_deleted: bool,
}

/// `notes.byId`, `notes.delete`, `notes.restore`, `notes.permanentDelete`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdParams {
    pub id: String,
}

/// `notes.create` params.
///
/// `title` and `status` stay textual here so a missing title or an unknown
/// status is reported against its own field. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateParams {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<CreateParams> for CreateNoteInput {
    type Error = NoteValidationError;

    fn try_from(params: CreateParams) -> Result<Self, Self::Error> {
        Ok(CreateNoteInput {
            title: params.title,
            content: params.content,
            status: parse_status(params.status.as_deref())?,
        })
    }
}

/// `data` of `notes.update`; absent keys leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PatchParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<PatchParams> for NotePatch {
    type Error = NoteValidationError;

    fn try_from(params: PatchParams) -> Result<Self, Self::Error> {
        Ok(NotePatch {
            title: params.title,
            content: params.content,
            status: parse_status(params.status.as_deref())?,
        })
    }
}

/// `notes.update` params.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateParams {
    pub id: String,
    #[serde(default)]
    pub data: PatchParams,
}

fn parse_status(value: Option<&str>) -> Result<Option<NoteStatus>, NoteValidationError> {
    value.map(str::parse::<NoteStatus>).transpose()
}

/// Stable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotFound,
    InternalServerError,
}

impl RpcErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotFound => "METHOD_NOT_FOUND",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Error body of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
    /// Offending input field for `BAD_REQUEST`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field: Option<String>,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn bad_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: RpcErrorCode::BadRequest,
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl Display for RpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.field.as_deref() {
            Some(field) => write!(f, "{} ({field}): {}", self.code.as_str(), self.message),
            None => write!(f, "{}: {}", self.code.as_str(), self.message),
        }
    }
}

impl std::error::Error for RpcError {}

/// Response envelope; exactly one of `data`/`error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: RpcError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn error_code(&self) -> Option<RpcErrorCode> {
        self.error.as_ref().map(|error| error.code)
    }
}
