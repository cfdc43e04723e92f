use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;
use warp::http::header::{HeaderMap, HeaderName, HeaderValue};
use warp::http::StatusCode;
use warp::{reply, Filter, Rejection, Reply};

use log::{debug, error};

use super::types::*;
use crate::coaching::{coach_reply, translate_sql};
use crate::error_handling::types::SessionError;
use crate::scenarios;
use crate::session_management::session_manager::{SessionManager, StartRequest};

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> reply::Response {
    reply::with_status(reply::json(body), status).into_response()
}

fn message_reply(message: impl Into<String>, status: StatusCode) -> reply::Response {
    json_reply(
        &ApiError {
            message: message.into(),
        },
        status,
    )
}

/// Maps session errors onto HTTP statuses. Storage failures are logged and
/// reported without internals.
fn error_reply(err: &SessionError) -> reply::Response {
    match err {
        SessionError::Validation(_) | SessionError::ScenarioNotSet => {
            message_reply(err.to_string(), StatusCode::BAD_REQUEST)
        }
        SessionError::NoActiveSession => message_reply(err.to_string(), StatusCode::NOT_FOUND),
        SessionError::StorageError(e) => {
            error!("Session storage failure: {}", e);
            message_reply("Failed to access session storage", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn with_session_id(mut response: reply::Response, session_id: &str) -> reply::Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    response
}

/// Session id from the request header. A value that is not visible ASCII
/// counts as no id rather than rejecting the request.
fn session_id_header() -> impl Filter<Extract = (Option<String>,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(|headers: HeaderMap| session_id_from(&headers))
}

fn session_id_from(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(SESSION_HEADER)?;
    match value.to_str() {
        Ok(id) => Some(id.trim().to_string()).filter(|id| !id.is_empty()),
        Err(_) => {
            debug!("Ignoring non-ASCII {} header", SESSION_HEADER);
            None
        }
    }
}

fn json_body<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// POST /roleplay/start
pub fn start_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("roleplay" / "start")
        .and(warp::post())
        .and(session_id_header())
        .and(json_body::<StartRequest>())
        .and_then(move |session_id: Option<String>, request: StartRequest| {
            let manager = manager.clone();
            async move {
                let session_id = session_id.unwrap_or_else(|| {
                    let minted = Uuid::new_v4().to_string();
                    debug!("Minted session id {}", minted);
                    minted
                });
                let response = match manager.start(&session_id, request).await {
                    Ok(session) => json_reply(&session, StatusCode::OK),
                    Err(e) => error_reply(&e),
                };
                Ok::<_, Rejection>(with_session_id(response, &session_id))
            }
        })
}

/// POST /roleplay/respond
pub fn respond_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("roleplay" / "respond")
        .and(warp::post())
        .and(session_id_header())
        .and(json_body::<RespondRequest>())
        .and_then(move |session_id: Option<String>, request: RespondRequest| {
            let manager = manager.clone();
            async move {
                let session_id = match session_id {
                    Some(id) => id,
                    None => return Ok::<_, Rejection>(error_reply(&SessionError::NoActiveSession)),
                };
                let response = match manager.respond(&session_id, &request.content).await {
                    Ok(session) => json_reply(&session, StatusCode::OK),
                    Err(e) => error_reply(&e),
                };
                Ok::<_, Rejection>(with_session_id(response, &session_id))
            }
        })
}

/// GET /roleplay/session
pub fn get_session_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("roleplay" / "session")
        .and(warp::get())
        .and(session_id_header())
        .and_then(move |session_id: Option<String>| {
            let manager = manager.clone();
            async move {
                let session_id = match session_id {
                    Some(id) => id,
                    None => {
                        return Ok::<_, Rejection>(json_reply(
                            &crate::session_management::Session::default(),
                            StatusCode::OK,
                        ))
                    }
                };
                let response = match manager.get(&session_id) {
                    Ok(session) => json_reply(&session, StatusCode::OK),
                    Err(e) => error_reply(&e),
                };
                Ok::<_, Rejection>(with_session_id(response, &session_id))
            }
        })
}

/// DELETE /roleplay/session
pub fn delete_session_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("roleplay" / "session")
        .and(warp::delete())
        .and(session_id_header())
        .and_then(move |session_id: Option<String>| {
            let manager = manager.clone();
            async move {
                let session_id = match session_id {
                    Some(id) => id,
                    None => {
                        return Ok::<_, Rejection>(json_reply(
                            &DeleteResponse { deleted: false },
                            StatusCode::OK,
                        ))
                    }
                };
                let response = match manager.reset(&session_id).await {
                    Ok(deleted) => json_reply(&DeleteResponse { deleted }, StatusCode::OK),
                    Err(e) => error_reply(&e),
                };
                Ok::<_, Rejection>(with_session_id(response, &session_id))
            }
        })
}

/// POST /roleplay/end
pub fn end_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("roleplay" / "end")
        .and(warp::post())
        .and(session_id_header())
        .and_then(move |session_id: Option<String>| {
            let manager = manager.clone();
            async move {
                let session_id = match session_id {
                    Some(id) => id,
                    None => return Ok::<_, Rejection>(error_reply(&SessionError::NoActiveSession)),
                };
                let response = match manager.end(&session_id).await {
                    Ok(summary) => json_reply(&summary, StatusCode::OK),
                    Err(e) => error_reply(&e),
                };
                Ok::<_, Rejection>(with_session_id(response, &session_id))
            }
        })
}

/// GET /scenarios
pub fn list_scenarios_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("scenarios")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| reply::json(&scenarios::all()))
}

/// POST /chat
pub fn chat_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("chat")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body::<ChatBody>())
        .and_then(move |body: ChatBody| {
            let collaborator = manager.collaborator();
            async move {
                if !body.messages.iter().any(|m| m.role == "user" && !m.content.trim().is_empty()) {
                    return Ok::<_, Rejection>(message_reply(
                        "messages are required",
                        StatusCode::BAD_REQUEST,
                    ));
                }
                let answer = coach_reply(collaborator.as_ref(), &body.messages).await;
                Ok::<_, Rejection>(json_reply(&answer, StatusCode::OK))
            }
        })
}

/// POST /sql/translate
pub fn sql_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("sql" / "translate")
        .and(warp::post())
        .and(json_body::<SqlBody>())
        .and_then(move |body: SqlBody| {
            let collaborator = manager.collaborator();
            async move {
                if body.question.trim().is_empty() {
                    return Ok::<_, Rejection>(message_reply(
                        "question is required",
                        StatusCode::BAD_REQUEST,
                    ));
                }
                let translation = translate_sql(collaborator.as_ref(), &body.question).await;
                Ok::<_, Rejection>(json_reply(&translation, StatusCode::OK))
            }
        })
}

/// GET /health
pub fn health_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || match manager.get_active_session_count() {
            Ok(sessions) => json_reply(
                &HealthResponse {
                    status: "ok",
                    sessions,
                },
                StatusCode::OK,
            ),
            Err(e) => error_reply(&e),
        })
}

/// Turns warp rejections into JSON errors.
pub async fn handle_rejection(err: Rejection) -> Result<reply::Response, Infallible> {
    let response = if err.is_not_found() {
        message_reply("Not found", StatusCode::NOT_FOUND)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        message_reply(format!("Invalid request body: {}", e), StatusCode::BAD_REQUEST)
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        message_reply(
            format!("Invalid header `{}`", e.name()),
            StatusCode::BAD_REQUEST,
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        message_reply("Request body too large", StatusCode::PAYLOAD_TOO_LARGE)
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        message_reply("Expected a JSON body", StatusCode::UNSUPPORTED_MEDIA_TYPE)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        message_reply("Method not allowed", StatusCode::METHOD_NOT_ALLOWED)
    } else {
        error!("Unhandled rejection: {:?}", err);
        message_reply("Internal server error", StatusCode::INTERNAL_SERVER_ERROR)
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        assert_eq!(
            error_reply(&SessionError::Validation("scenarioId is required".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_reply(&SessionError::NoActiveSession).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_reply(&SessionError::StorageError(
                crate::error_handling::types::StorageError::ReadFailed
            ))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn session_id_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from(&headers), None);

        headers.insert(SESSION_HEADER, HeaderValue::from_static("  abc  "));
        assert_eq!(session_id_from(&headers).as_deref(), Some("abc"));

        headers.insert(SESSION_HEADER, HeaderValue::from_static("   "));
        assert_eq!(session_id_from(&headers), None);

        headers.insert(SESSION_HEADER, HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap());
        assert_eq!(session_id_from(&headers), None);
    }

    #[test]
    fn session_id_is_echoed_when_valid() {
        let response = with_session_id(message_reply("x", StatusCode::OK), "abc-123");
        assert_eq!(response.headers().get(SESSION_HEADER).unwrap(), "abc-123");

        let response = with_session_id(message_reply("x", StatusCode::OK), "bad\nid");
        assert!(response.headers().get(SESSION_HEADER).is_none());
    }
}
