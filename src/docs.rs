use crate::api::announcement::{AnnouncementText, BoardQuery};
use crate::api::attendance::AttendanceQuery;
use crate::api::report::ReportQuery;
use crate::api::user::{NotificationToken, UpdateName, UpdateRole, UserListResponse, UserSummary};
use crate::engine::attendance::{AttendanceSummary, DailyCheckIns, RecordPage};
use crate::engine::AnnouncementBoard;
use crate::model::announcement::Announcement;
use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::UserProfile;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{openapi, Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Attendance Management API",
        version = "1.0.0",
        description = r#"
## School Attendance Management Service

This API powers a role-based school attendance and communication system.

### 🔹 Key Features
- **Attendance**
  - Daily check-in and check-out inside fixed time windows, with lateness tracking
  - Paginated, filterable attendance history with a show-all mode
- **Announcements**
  - Post, edit, pin, and delete board announcements (author-gated)
  - Live change feed over server-sent events
- **Role Management**
  - Head teachers manage the teacher roster and roles
- **Reports**
  - CSV export and per-day analytics over the same attendance projection

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication** issued by the
external identity provider. Head-teacher-only operations check the role claim.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    modifiers(&SecurityAddon),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_records,

        crate::api::report::summary,
        crate::api::report::export_csv,

        crate::api::announcement::post_announcement,
        crate::api::announcement::edit_announcement,
        crate::api::announcement::delete_announcement,
        crate::api::announcement::toggle_pin,
        crate::api::announcement::board,
        crate::api::announcement::stream_board,

        crate::api::user::list_users,
        crate::api::user::update_role,
        crate::api::user::get_profile,
        crate::api::user::update_profile,
        crate::api::user::set_notification_token
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceQuery,
            RecordPage,
            AttendanceSummary,
            DailyCheckIns,
            ReportQuery,
            Announcement,
            AnnouncementText,
            AnnouncementBoard,
            BoardQuery,
            Role,
            UserProfile,
            UserSummary,
            UserListResponse,
            UpdateRole,
            UpdateName,
            NotificationToken
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in/check-out and attendance history APIs"),
        (name = "Announcements", description = "Announcement board APIs"),
        (name = "Users", description = "Roster, role and profile APIs"),
        (name = "Reports", description = "Attendance reporting APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
