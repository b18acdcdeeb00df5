use crate::api::attendance::error_response;
use crate::auth::AuthUser;
use crate::engine::{AttendanceEngine, PageRequest, RecordFilter};
use crate::store::{AttendanceStore, UserStore};
use crate::utils::name_cache;
use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    #[schema(example = "2026-08-01", format = "date", value_type = String)]
    /// Inclusive range filter over the exported projection
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-08-31", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Late / on-time tallies and per-day check-in counts (head teacher)
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(ReportQuery),
    responses(
        (status = 200, description = "Aggregated attendance figures",
         body = crate::engine::AttendanceSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn summary<S: AttendanceStore>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_head_teacher()?;

    let filter = RecordFilter {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    match engine.summary(None, &filter).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(summary)),
        Err(e) => Ok(error_response(e)),
    }
}

/// CSV export of the attendance projection (head teacher). PDF rendering
/// stays with the client-side report generator; it consumes the same
/// projection this endpoint serializes.
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "attendance_report.csv attachment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Backend unavailable; export disabled on the cached view")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn export_csv<S: AttendanceStore + UserStore>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    store: web::Data<S>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_head_teacher()?;

    let filter = RecordFilter {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let page = match engine.list_page(None, &filter, PageRequest::All).await {
        Ok(page) => page,
        Err(e) => return Ok(error_response(e)),
    };

    // Exports are authoritative documents; the degraded cached view is
    // good enough for the screen but not for a report.
    if page.from_cache {
        return Ok(HttpResponse::ServiceUnavailable().json(json!({
            "message": "Export is unavailable while the backend is unreachable"
        })));
    }

    let mut csv = String::from("Teacher Name,Date,Check-In,Check-Out,Late Arrival\n");
    for record in &page.records {
        let name = name_cache::resolve(store.get_ref(), record.teacher_id).await;
        let check_out = record
            .check_out_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "Not checked out".to_string());
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&name),
            record.date.format("%Y-%m-%d"),
            record.check_in_time,
            csv_field(&check_out),
            if record.is_late { "Yes" } else { "No" },
        ));
    }

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"attendance_report.csv\"",
        ))
        .body(csv))
}
