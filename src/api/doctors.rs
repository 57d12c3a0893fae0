//! `/doctor` routes.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::Value;

use super::error::ApiResult;
use super::extract::{blocking, JsonBody, QueryParams};
use super::users::UserIdBody;
use super::Message;
use crate::application::{AvailabilityUpdate, Caller, DecisionRequest, DoctorQuery, Services};
use crate::domain::DoctorListing;

pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/applyfordoctor", post(apply))
        .route("/getalldoctors", get(list_doctors))
        .route("/getdoctor/:id", get(get_doctor))
        .route("/getnotdoctors", get(list_applications))
        .route("/acceptdoctor", put(accept))
        .route("/rejectdoctor", put(reject))
        .route("/deletedoctor", put(remove))
        .route("/updateavailability", put(update_availability))
}

async fn apply(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.doctors.apply(&caller, body)).await?;
    Ok(Message::json("Application submitted successfully"))
}

async fn list_doctors(
    State(services): State<Services>,
    QueryParams(query): QueryParams<DoctorQuery>,
) -> ApiResult<Json<Vec<DoctorListing>>> {
    blocking(move || services.doctors.list_doctors(&query)).await.map(Json)
}

async fn get_doctor(
    State(services): State<Services>,
    Path(id): Path<String>,
) -> ApiResult<Json<DoctorListing>> {
    blocking(move || services.doctors.get_doctor(&id)).await.map(Json)
}

async fn list_applications(
    State(services): State<Services>,
    _caller: Caller,
) -> ApiResult<Json<Vec<DoctorListing>>> {
    blocking(move || services.doctors.list_applications()).await.map(Json)
}

async fn accept(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(request): JsonBody<DecisionRequest>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.doctors.accept(&caller, &request)).await?;
    Ok(Message::json("Doctor application accepted"))
}

async fn reject(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(request): JsonBody<DecisionRequest>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.doctors.reject(&caller, &request)).await?;
    Ok(Message::json("Doctor application rejected"))
}

async fn remove(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(body): JsonBody<UserIdBody>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.doctors.remove(&caller, body.user_id.as_deref())).await?;
    Ok(Message::json("Doctor removed successfully"))
}

async fn update_availability(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(update): JsonBody<AvailabilityUpdate>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.doctors.update_availability(&caller, update)).await?;
    Ok(Message::json("Availability updated successfully"))
}
