use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One ledger entry. At most one exists per `(teacher_id, date)`;
/// `check_out_time` is set at most once and never cleared.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub teacher_id: u64,
    #[schema(example = "2026-08-08", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "07:12:04", value_type = String)]
    pub check_in_time: NaiveTime,
    #[schema(example = "14:31:48", value_type = String)]
    pub check_out_time: Option<NaiveTime>,
    /// Computed once at check-in against the lateness threshold.
    pub is_late: bool,
}
