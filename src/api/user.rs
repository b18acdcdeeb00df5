use crate::auth::AuthUser;
use crate::model::role::Role;
use crate::store::UserStore;
use crate::utils::name_cache;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UserSummary {
    #[schema(example = 1000)]
    pub id: u64,
    #[schema(example = "Amina Rahman")]
    pub name: String,
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserSummary>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRole {
    #[schema(example = "headTeacher")]
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateName {
    #[schema(example = "Amina Rahman")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct NotificationToken {
    #[schema(example = "fcm-registration-token")]
    pub token: String,
}

/// Roster for the manage-teachers view (head teacher)
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All profiles ordered by name", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users<S: UserStore>(
    auth: AuthUser,
    store: web::Data<S>,
) -> actix_web::Result<impl Responder> {
    auth.require_head_teacher()?;

    let users = store.list_users().await.map_err(|e| {
        error!(error = %e, "Failed to fetch users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users
            .into_iter()
            .map(|u| UserSummary {
                id: u.id,
                name: u.name,
                role: u.role,
            })
            .collect(),
    }))
}

/// Change a user's role (head teacher)
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(
        ("id" = u64, Path, description = "Profile to change")
    ),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = Object, example = json!({
            "message": "User role updated to headTeacher"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_role<S: UserStore>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
    payload: web::Json<UpdateRole>,
) -> actix_web::Result<impl Responder> {
    auth.require_head_teacher()?;

    let user_id = path.into_inner();
    let updated = store.set_role(user_id, payload.role).await.map_err(|e| {
        error!(error = %e, user_id, "Failed to update role");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !updated {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User role updated to {}", payload.role)
    })))
}

/// Own profile; created with the default role on first touch
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Own profile", body = crate::model::user::UserProfile),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_profile<S: UserStore>(
    auth: AuthUser,
    store: web::Data<S>,
) -> actix_web::Result<impl Responder> {
    let profile = store
        .upsert_user(auth.user_id, auth.name.clone())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to load profile");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Update own display name
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateName,
    responses(
        (status = 200, description = "Name updated", body = Object, example = json!({
            "message": "Name updated successfully"
        })),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Profile not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_profile<S: UserStore>(
    auth: AuthUser,
    store: web::Data<S>,
    payload: web::Json<UpdateName>,
) -> actix_web::Result<impl Responder> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Please enter a valid name"
        })));
    }

    let updated = store
        .set_name(auth.user_id, name.to_string())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to update name");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !updated {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Profile not found" })));
    }

    name_cache::rename(auth.user_id, name).await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Name updated successfully" })))
}

/// Park the push-channel registration token on the profile
#[utoipa::path(
    put,
    path = "/api/profile/notification-token",
    request_body = NotificationToken,
    responses(
        (status = 200, description = "Token stored", body = Object, example = json!({
            "message": "Notification token stored"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn set_notification_token<S: UserStore>(
    auth: AuthUser,
    store: web::Data<S>,
    payload: web::Json<NotificationToken>,
) -> actix_web::Result<impl Responder> {
    // First touch may land here before the profile exists; create it.
    store
        .upsert_user(auth.user_id, auth.name.clone())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to ensure profile");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    store
        .set_fcm_token(auth.user_id, payload.token.clone())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to store notification token");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Notification token stored" })))
}
