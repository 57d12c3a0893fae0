//! `/user` routes.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::extract::{blocking, JsonBody};
use super::Message;
use crate::application::{Caller, LoginRequest, ProfileUpdate, RegisterRequest, Services};
use crate::domain::UserProfile;

pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/getuser/:id", get(get_user))
        .route("/getallusers", get(list_users))
        .route("/updateprofile", put(update_profile))
        .route("/deleteuser", delete(delete_user))
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: &'static str,
    pub token: String,
}

/// Body naming a target user, as sent by admin endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdBody {
    #[serde(default)]
    pub user_id: Option<String>,
}

async fn register(
    State(services): State<Services>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = blocking(move || services.accounts.register(request)).await?;
    Ok(Json(UserResponse {
        message: "User registered successfully",
        user,
    }))
}

async fn login(
    State(services): State<Services>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let token = blocking(move || services.accounts.login(request)).await?;
    Ok(Json(TokenResponse {
        message: "Login successful",
        token,
    }))
}

async fn get_user(
    State(services): State<Services>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    blocking(move || services.accounts.get_user(&id)).await.map(Json)
}

async fn list_users(
    State(services): State<Services>,
    _caller: Caller,
) -> ApiResult<Json<Vec<UserProfile>>> {
    blocking(move || services.accounts.list_users()).await.map(Json)
}

async fn update_profile(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> ApiResult<Json<UserResponse>> {
    let user = blocking(move || services.accounts.update_profile(&caller, update)).await?;
    Ok(Json(UserResponse {
        message: "Profile updated successfully",
        user,
    }))
}

async fn delete_user(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(body): JsonBody<UserIdBody>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.accounts.delete_user(&caller, body.user_id.as_deref())).await?;
    Ok(Message::json("User deleted successfully"))
}
