//! Ambient HTTP transcoding of the five RPCs (spec §6), fronting the
//! `Messenger`. Per spec §1 this is explicitly NOT a wire-schema
//! deliverable — it exists only so the crate runs as a service, built with
//! Rocket because that is the teacher's transport crate. Route bodies are
//! a 1:1 JSON transcoding, not a hand-designed protocol.

use crate::error::CoreError;
use crate::messenger::Messenger;
use crate::metrics_layer::{self, RequestRecorder};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Request, State, catch, catchers, get, post, routes};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Shared route state: the domain core plus the per-request deadline
/// (spec §5) every backend call is wrapped in.
pub struct AppState {
    pub messenger: Arc<Messenger>,
    pub request_timeout: Duration,
}

#[derive(Serialize)]
pub struct ErrorBody {
    error: &'static str,
}

fn error_response(err: CoreError) -> (Status, Json<ErrorBody>) {
    let (status, label) = match &err {
        CoreError::InvalidSession | CoreError::InvalidChat => (Status::BadRequest, "invalid_argument"),
        CoreError::UserDoesNotExist | CoreError::ChatNotFound => (Status::NotFound, "not_found"),
        CoreError::Prohibited => (Status::Forbidden, "permission_denied"),
        CoreError::DeadlineExceeded => (Status::ServiceUnavailable, "deadline_exceeded"),
        CoreError::Internal(_) => (Status::InternalServerError, "internal"),
    };
    (status, Json(ErrorBody { error: label }))
}

/// Runs `fut` against the request's configured deadline, translating a
/// timeout into the same `CoreError` path every other failure takes.
async fn with_deadline<T>(
    state: &AppState,
    fut: impl std::future::Future<Output = Result<T, CoreError>>,
) -> Result<T, CoreError> {
    match tokio::time::timeout(state.request_timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::DeadlineExceeded),
    }
}

#[get("/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
pub struct InitSessionResponse {
    session: String,
}

#[post("/sessions")]
pub async fn init_session(
    state: &State<AppState>,
) -> Result<Json<InitSessionResponse>, (Status, Json<ErrorBody>)> {
    let recorder = RequestRecorder::start("InitSession");
    match with_deadline(state, async { Ok(state.messenger.init_session().await) }).await {
        Ok(session) => {
            metrics_layer::record_user_registered();
            recorder.finish_ok(&session.to_string());
            Ok(Json(InitSessionResponse {
                session: session.to_string(),
            }))
        }
        Err(err) => {
            let (status, body) = error_response(err);
            recorder.finish_err("*", status_label(status));
            Err((status, body))
        }
    }
}

#[derive(Deserialize)]
pub struct CreateChatRequest {
    session: String,
    ttl: i64,
    read_only: bool,
}

#[derive(Serialize)]
pub struct CreateChatResponse {
    chat: String,
}

#[post("/chats", data = "<req>")]
pub async fn create_chat(
    state: &State<AppState>,
    req: Json<CreateChatRequest>,
) -> Result<Json<CreateChatResponse>, (Status, Json<ErrorBody>)> {
    let recorder = RequestRecorder::start("CreateChat");
    match with_deadline(
        state,
        state.messenger.create_chat(&req.session, req.ttl, req.read_only),
    )
    .await
    {
        Ok(chat) => {
            metrics_layer::record_chat_ttl(req.ttl);
            recorder.finish_ok(&chat.to_string());
            Ok(Json(CreateChatResponse {
                chat: chat.to_string(),
            }))
        }
        Err(err) => {
            let (status, body) = error_response(err);
            recorder.finish_err(&req.session, status_label(status));
            Err((status, body))
        }
    }
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    session: String,
    text: String,
}

#[post("/chats/<chat>/messages", data = "<req>")]
pub async fn send_message(
    state: &State<AppState>,
    chat: &str,
    req: Json<SendMessageRequest>,
) -> Result<Status, (Status, Json<ErrorBody>)> {
    let recorder = RequestRecorder::start("SendMessage");
    match with_deadline(
        state,
        state
            .messenger
            .send_message(&req.session, chat, req.text.clone().into_bytes()),
    )
    .await
    {
        Ok(()) => {
            metrics_layer::record_message_sent(chat);
            recorder.finish_ok(chat);
            Ok(Status::NoContent)
        }
        Err(err) => {
            let (status, body) = error_response(err);
            recorder.finish_err(chat, status_label(status));
            Err((status, body))
        }
    }
}

#[derive(Serialize)]
pub struct MessageView {
    session: String,
    message: String,
    text: String,
}

#[get("/chats/<chat>/history")]
pub async fn get_history(
    state: &State<AppState>,
    chat: &str,
) -> Result<Json<Vec<MessageView>>, (Status, Json<ErrorBody>)> {
    let recorder = RequestRecorder::start("GetHistory");
    match with_deadline(state, state.messenger.get_history(chat)).await {
        Ok(messages) => {
            recorder.finish_ok(chat);
            Ok(Json(
                messages
                    .into_iter()
                    .map(|m| MessageView {
                        session: m.author.to_string(),
                        message: m.message.to_string(),
                        text: String::from_utf8_lossy(&m.text).into_owned(),
                    })
                    .collect(),
            ))
        }
        Err(err) => {
            let (status, body) = error_response(err);
            recorder.finish_err(chat, status_label(status));
            Err((status, body))
        }
    }
}

#[derive(Serialize)]
pub struct ActiveChatView {
    chat: String,
    session: String,
    ttl: i64,
    read_only: bool,
}

#[get("/chats")]
pub async fn get_active_chats(
    state: &State<AppState>,
) -> Result<Json<Vec<ActiveChatView>>, (Status, Json<ErrorBody>)> {
    let recorder = RequestRecorder::start("GetActiveChats");
    match with_deadline(state, async { Ok(state.messenger.get_active_chats().await) }).await {
        Ok(chats) => {
            recorder.finish_ok("*");
            Ok(Json(
                chats
                    .into_iter()
                    .map(|c| ActiveChatView {
                        chat: c.chat.to_string(),
                        session: c.creator.to_string(),
                        ttl: c.ttl_secs,
                        read_only: c.read_only,
                    })
                    .collect(),
            ))
        }
        Err(err) => {
            let (status, body) = error_response(err);
            recorder.finish_err("*", status_label(status));
            Err((status, body))
        }
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::BadRequest => "invalid_argument",
        Status::NotFound => "not_found",
        Status::Forbidden => "permission_denied",
        Status::ServiceUnavailable => "deadline_exceeded",
        _ => "internal",
    }
}

#[catch(404)]
fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody { error: "not_found" })
}

#[catch(500)]
fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody { error: "internal" })
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> Json<ErrorBody> {
    let _ = status;
    Json(ErrorBody { error: "internal" })
}

pub fn mount(build: rocket::Rocket<rocket::Build>, state: AppState) -> rocket::Rocket<rocket::Build> {
    build
        .manage(state)
        .register("/", catchers![not_found, internal_error, default_catcher])
        .mount(
            "/",
            routes![
                health,
                init_session,
                create_chat,
                send_message,
                get_history,
                get_active_chats,
            ],
        )
}
