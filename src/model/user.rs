use crate::model::role::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    #[schema(example = 1000)]
    pub id: u64,
    #[schema(example = "Amina Rahman")]
    pub name: String,
    pub role: Role,
    /// Push-channel registration token parked on the profile; delivery
    /// itself belongs to the external messaging platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
}
