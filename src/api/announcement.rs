use crate::auth::AuthUser;
use crate::engine::{AnnouncementError, AnnouncementService};
use crate::store::AnnouncementStore;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures_util::stream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct AnnouncementText {
    #[schema(example = "Staff meeting moved to 15:00.")]
    pub text: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BoardQuery {
    #[schema(example = 1)]
    /// Pagination page number for the unpinned set (start with 1)
    pub page: Option<u32>,
}

fn error_response(err: AnnouncementError) -> HttpResponse {
    match &err {
        AnnouncementError::NotFound => {
            HttpResponse::NotFound().json(json!({ "message": err.to_string() }))
        }
        AnnouncementError::Unauthorized => {
            HttpResponse::Forbidden().json(json!({ "message": err.to_string() }))
        }
        AnnouncementError::Backend(reason) => {
            tracing::error!(%reason, "announcement backend failure");
            HttpResponse::ServiceUnavailable().json(json!({
                "message": "Announcements are temporarily unavailable"
            }))
        }
    }
}

/// Post a new announcement (head teacher)
#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = AnnouncementText,
    responses(
        (status = 200, description = "Announcement posted", body = crate::model::announcement::Announcement),
        (status = 400, description = "Empty announcement text"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcements"
)]
pub async fn post_announcement<S: AnnouncementStore>(
    auth: AuthUser,
    service: web::Data<AnnouncementService<S>>,
    payload: web::Json<AnnouncementText>,
) -> actix_web::Result<impl Responder> {
    auth.require_head_teacher()?;

    if payload.text.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Announcement text cannot be empty"
        })));
    }

    match service.post(auth.user_id, &payload.text, Utc::now()).await {
        Ok(announcement) => Ok(HttpResponse::Ok().json(announcement)),
        Err(e) => Ok(error_response(e)),
    }
}

/// Edit an announcement you created
#[utoipa::path(
    put,
    path = "/api/announcements/{id}",
    params(
        ("id" = u64, Path, description = "Announcement to edit")
    ),
    request_body = AnnouncementText,
    responses(
        (status = 200, description = "Announcement updated", body = crate::model::announcement::Announcement),
        (status = 400, description = "Empty announcement text"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Announcement does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcements"
)]
pub async fn edit_announcement<S: AnnouncementStore>(
    auth: AuthUser,
    service: web::Data<AnnouncementService<S>>,
    path: web::Path<u64>,
    payload: web::Json<AnnouncementText>,
) -> actix_web::Result<impl Responder> {
    if payload.text.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Announcement text cannot be empty"
        })));
    }

    let id = path.into_inner();
    match service.edit(auth.user_id, id, &payload.text, Utc::now()).await {
        Ok(announcement) => Ok(HttpResponse::Ok().json(announcement)),
        Err(e) => Ok(error_response(e)),
    }
}

/// Delete an announcement you created
#[utoipa::path(
    delete,
    path = "/api/announcements/{id}",
    params(
        ("id" = u64, Path, description = "Announcement to delete")
    ),
    responses(
        (status = 200, description = "Announcement deleted", body = Object, example = json!({
            "message": "Announcement deleted"
        })),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Announcement does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcements"
)]
pub async fn delete_announcement<S: AnnouncementStore>(
    auth: AuthUser,
    service: web::Data<AnnouncementService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    match service.delete(auth.user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "message": "Announcement deleted" }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Pin or unpin an announcement you created
#[utoipa::path(
    put,
    path = "/api/announcements/{id}/pin",
    params(
        ("id" = u64, Path, description = "Announcement to pin or unpin")
    ),
    responses(
        (status = 200, description = "Pin state toggled", body = Object, example = json!({
            "message": "Announcement pinned",
            "pinned": true
        })),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Announcement does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcements"
)]
pub async fn toggle_pin<S: AnnouncementStore>(
    auth: AuthUser,
    service: web::Data<AnnouncementService<S>>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    match service.toggle_pin(auth.user_id, path.into_inner()).await {
        Ok(pinned) => Ok(HttpResponse::Ok().json(json!({
            "message": if pinned { "Announcement pinned" } else { "Announcement unpinned" },
            "pinned": pinned
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Board view: every pinned announcement plus one page of unpinned ones
#[utoipa::path(
    get,
    path = "/api/announcements",
    params(BoardQuery),
    responses(
        (status = 200, description = "Announcement board", body = crate::engine::AnnouncementBoard),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcements"
)]
pub async fn board<S: AnnouncementStore>(
    _auth: AuthUser,
    service: web::Data<AnnouncementService<S>>,
    query: web::Query<BoardQuery>,
) -> actix_web::Result<impl Responder> {
    match service.board(query.page.unwrap_or(1)).await {
        Ok(board) => Ok(HttpResponse::Ok().json(board)),
        Err(e) => Ok(error_response(e)),
    }
}

/// Live change feed over server-sent events; one `data:` frame per
/// confirmed board write. Stands in for the document store's push
/// listeners so clients reconcile instead of polling.
#[utoipa::path(
    get,
    path = "/api/announcements/stream",
    responses(
        (status = 200, description = "text/event-stream of board changes"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcements"
)]
pub async fn stream_board<S: AnnouncementStore>(
    _auth: AuthUser,
    store: web::Data<S>,
) -> actix_web::Result<impl Responder> {
    let events = store.watch_announcements();

    let body = stream::unfold(events, |mut events| async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    let frame = web::Bytes::from(format!("data: {}\n\n", payload));
                    return Some((Ok::<_, actix_web::Error>(frame), events));
                }
                // A slow consumer skips missed frames and picks the feed
                // back up; the next one-shot fetch reconciles the gap.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-cache"))
        .content_type("text/event-stream")
        .streaming(body))
}
