//! Request handlers and their wire types.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use meetpoll_ledger::{
    NewSession, NewTimeslot, PollError, PollService, SessionView, TimeslotView, VoteView,
};
use meetpoll_store::PollStore;
use meetpoll_types::{
    DynamicConfig, SessionId, SessionKind, Timeslot, TimeslotId, Timestamp, VoteItem,
};
use serde::{Deserialize, Serialize};

use crate::RpcError;

// ── Session ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SpanRequest {
    pub start_utc: Timestamp,
    pub end_utc: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    pub creator_name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub dynamic_config: Option<DynamicConfig>,
    #[serde(default)]
    pub timeslots: Vec<SpanRequest>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: SessionId,
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub title: String,
    pub creator_name: String,
    pub created_at_utc: Timestamp,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_config: Option<DynamicConfig>,
    pub timeslots: Vec<TimeslotResponse>,
}

#[derive(Debug, Serialize)]
pub struct TimeslotResponse {
    pub id: TimeslotId,
    pub session_id: SessionId,
    pub start_utc: Timestamp,
    pub end_utc: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub has_password: bool,
    pub votes: Vec<VoteResponse>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub voter_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at_utc: Timestamp,
}

impl From<VoteView> for VoteResponse {
    fn from(v: VoteView) -> Self {
        Self {
            voter_name: v.voter_name,
            note: v.note,
            created_at_utc: v.created_at,
        }
    }
}

impl TimeslotResponse {
    fn from_view(session_id: &SessionId, view: TimeslotView) -> Self {
        Self {
            id: view.id,
            session_id: session_id.clone(),
            start_utc: view.start,
            end_utc: view.end,
            created_by: view.created_by,
            has_password: view.protected,
            votes: view.votes.into_iter().map(VoteResponse::from).collect(),
        }
    }
}

impl From<Timeslot> for TimeslotResponse {
    fn from(ts: Timeslot) -> Self {
        Self {
            has_password: ts.password.is_some(),
            id: ts.id,
            session_id: ts.session_id,
            start_utc: ts.start,
            end_utc: ts.end,
            created_by: ts.created_by,
            votes: Vec::new(),
        }
    }
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        let id = view.id;
        Self {
            timeslots: view
                .timeslots
                .into_iter()
                .map(|ts| TimeslotResponse::from_view(&id, ts))
                .collect(),
            id,
            title: view.title,
            creator_name: view.creator_name,
            created_at_utc: view.created_at,
            kind: view.kind,
            dynamic_config: view.dynamic_config,
        }
    }
}

// ── Vote ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VoteRequest {
    pub voter_name: String,
    #[serde(default)]
    pub password: Option<String>,
    pub votes: Vec<VoteItem>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// ── Timeslot ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTimeslotRequest {
    pub start_utc: Timestamp,
    pub end_utc: Timestamp,
    #[serde(default)]
    pub created_by: Option<String>,
    /// Guards deletion of the slot.
    #[serde(default)]
    pub password: Option<String>,
    /// Authorizes the self-vote as `created_by`.
    #[serde(default)]
    pub voter_password: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct DeleteTimeslotRequest {
    #[serde(default)]
    pub password: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| RpcError::InvalidRequest(rejection.body_text()))
}

/// Run a core operation on the blocking pool.
async fn blocking<S, T, F>(service: PollService<S>, op: F) -> Result<T, RpcError>
where
    S: PollStore + 'static,
    T: Send + 'static,
    F: FnOnce(&PollService<S>) -> Result<T, PollError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| RpcError::Internal(e.to_string()))?
        .map_err(RpcError::from)
}

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

pub async fn create_session<S: PollStore + 'static>(
    State(service): State<PollService<S>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), RpcError> {
    let req = body(payload)?;
    let kind: SessionKind = req.kind.parse().map_err(PollError::from)?;
    let request = NewSession {
        title: req.title,
        creator_name: req.creator_name,
        kind,
        dynamic_config: req.dynamic_config,
        timeslots: req
            .timeslots
            .into_iter()
            .map(|span| (span.start_utc, span.end_utc))
            .collect(),
    };
    let created = blocking(service, move |s| s.create_session(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            id: created.id,
            link: created.link,
        }),
    ))
}

pub async fn get_session<S: PollStore + 'static>(
    State(service): State<PollService<S>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, RpcError> {
    let id = SessionId::new(id);
    let view = blocking(service, move |s| s.get_session(&id)).await?;
    Ok(Json(view.into()))
}

pub async fn submit_vote<S: PollStore + 'static>(
    State(service): State<PollService<S>>,
    Path(id): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, RpcError> {
    let req = body(payload)?;
    let id = SessionId::new(id);
    blocking(service, move |s| {
        s.submit_vote(&id, &req.voter_name, req.password.as_deref(), &req.votes)
    })
    .await?;
    Ok(Json(StatusResponse { status: "ok" }))
}

pub async fn create_timeslot<S: PollStore + 'static>(
    State(service): State<PollService<S>>,
    Path(id): Path<String>,
    payload: Result<Json<CreateTimeslotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TimeslotResponse>), RpcError> {
    let req = body(payload)?;
    let id = SessionId::new(id);
    let request = NewTimeslot {
        start: req.start_utc,
        end: req.end_utc,
        created_by: req.created_by,
        voter_password: req.voter_password,
        deletion_password: req.password,
    };
    let timeslot = blocking(service, move |s| s.create_timeslot(&id, request)).await?;
    Ok((StatusCode::CREATED, Json(timeslot.into())))
}

pub async fn delete_timeslot<S: PollStore + 'static>(
    State(service): State<PollService<S>>,
    Path((id, timeslot_id)): Path<(String, String)>,
    payload: Option<Json<DeleteTimeslotRequest>>,
) -> Result<StatusCode, RpcError> {
    let req = payload.map(|Json(inner)| inner).unwrap_or_default();
    let id = SessionId::new(id);
    let timeslot_id = TimeslotId::new(timeslot_id);
    blocking(service, move |s| {
        s.delete_timeslot(&id, &timeslot_id, req.password.as_deref())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
