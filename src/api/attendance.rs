use crate::auth::AuthUser;
use crate::engine::{AttendanceEngine, AttendanceError, PageRequest, RecordFilter};
use crate::store::{AttendanceStore, Cursor};
use actix_web::{web, HttpResponse, Responder};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 5)]
    /// Pagination per page number
    pub per_page: Option<u32>,
    #[schema(example = "2026-08-08:41")]
    /// Cursor of the last seen record, for forward pagination
    pub after: Option<String>,
    /// Bypass pagination up to the hard cap
    pub all: Option<bool>,
    #[schema(example = "2026-08-01", format = "date", value_type = String)]
    /// Inclusive range filter, applied to the fetched window
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-08-31", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
}

pub(crate) fn error_response(err: AttendanceError) -> HttpResponse {
    match &err {
        AttendanceError::Backend(reason) => {
            tracing::error!(%reason, "attendance backend failure");
            HttpResponse::ServiceUnavailable().json(json!({
                "message": "Attendance service is temporarily unavailable"
            }))
        }
        _ => HttpResponse::BadRequest().json(json!({ "message": err.to_string() })),
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Outside the check-in window or already checked in today"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Backend unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in<S: AttendanceStore>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();

    match engine.check_in(auth.user_id, now).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "message": "Checked in successfully",
            "record": record
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "Outside the check-out window, not checked in, or already checked out"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Backend unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out<S: AttendanceStore>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
) -> actix_web::Result<impl Responder> {
    let now = Local::now().naive_local();

    match engine.check_out(auth.user_id, now).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "message": "Checked out successfully",
            "record": record
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Paginated attendance projection. Teachers always see their own
/// records; head teachers see every teacher's.
#[utoipa::path(
    get,
    path = "/api/attendance/records",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "One page of the attendance projection",
         body = crate::engine::RecordPage),
        (status = 400, description = "Malformed cursor or date range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_records<S: AttendanceStore>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "start_date cannot be after end_date"
            })));
        }
    }

    let scope = if auth.is_teacher() {
        Some(auth.user_id)
    } else {
        None
    };
    let filter = RecordFilter {
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let per_page = query.per_page.unwrap_or(engine.policy().page_size);
    let page = query.page.unwrap_or(1).max(1);

    let request = if query.all.unwrap_or(false) {
        PageRequest::All
    } else if let Some(after) = query.after.as_deref() {
        let cursor: Cursor = match after.parse() {
            Ok(c) => c,
            Err(e) => {
                return Ok(HttpResponse::BadRequest().json(json!({ "message": e })));
            }
        };
        PageRequest::Forward {
            per_page,
            after: Some(cursor),
        }
    } else if page > 1 {
        PageRequest::Position { page, per_page }
    } else {
        PageRequest::Forward {
            per_page,
            after: None,
        }
    };

    match engine.list_page(scope, &filter, request).await {
        Ok(page) => Ok(HttpResponse::Ok().json(page)),
        Err(e) => Ok(error_response(e)),
    }
}
