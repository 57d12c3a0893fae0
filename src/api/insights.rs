//! `/symptom`, `/analytics` and `/notification` routes.

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use super::error::ApiResult;
use super::extract::{blocking, JsonBody};
use super::Message;
use crate::application::{Caller, Dashboard, Services};
use crate::domain::{triage, Notification, SymptomQuery, TriageReport};

pub(super) fn symptom_routes() -> Router<Services> {
    Router::new().route("/check", post(check_symptoms))
}

pub(super) fn analytics_routes() -> Router<Services> {
    Router::new().route("/dashboard", get(dashboard))
}

pub(super) fn notification_routes() -> Router<Services> {
    Router::new()
        .route("/getallnotifications", get(list_notifications))
        .route("/deleteall", delete(clear_notifications))
}

async fn check_symptoms(JsonBody(query): JsonBody<SymptomQuery>) -> Json<TriageReport> {
    Json(triage(&query))
}

async fn dashboard(
    State(services): State<Services>,
    _caller: Caller,
) -> ApiResult<Json<Dashboard>> {
    blocking(move || services.analytics.dashboard()).await.map(Json)
}

async fn list_notifications(
    State(services): State<Services>,
    caller: Caller,
) -> ApiResult<Json<Vec<Notification>>> {
    blocking(move || services.notifications.list(caller.id()))
        .await
        .map(Json)
}

async fn clear_notifications(
    State(services): State<Services>,
    caller: Caller,
) -> ApiResult<Json<Message>> {
    let cleared = blocking(move || services.notifications.clear(caller.id())).await?;
    tracing::debug!("Cleared {} notification(s)", cleared);
    Ok(Message::json("All notifications cleared"))
}
