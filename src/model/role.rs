use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// The role field on the profile is the sole authorization input.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum Role {
    #[strum(serialize = "teacher")]
    #[serde(rename = "teacher")]
    Teacher,
    #[strum(serialize = "headTeacher")]
    #[serde(rename = "headTeacher")]
    HeadTeacher,
}

impl Role {
    /// Lenient parse used on stored profile rows; unknown strings fall
    /// back to the default role, matching how profiles are seeded.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or(Role::Teacher)
    }
}
