use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Board post. Mutable by its author only; `date` doubles as the sort
/// key and is refreshed on every edit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Announcement {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Staff meeting moved to 15:00.")]
    pub text: String,
    #[schema(example = "2026-08-08T06:45:00Z", format = "date-time", value_type = String)]
    pub date: DateTime<Utc>,
    #[schema(example = 1000)]
    pub author_id: u64,
    pub pinned: bool,
}
