use serde::{Deserialize, Serialize};

/// Bearer token claims. Tokens are minted by the external identity
/// provider with the shared secret; this service only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Display name of the user.
    pub sub: String,
    /// Role string: "teacher" or "headTeacher".
    pub role: String,
    pub exp: usize,
    pub jti: String,
}
