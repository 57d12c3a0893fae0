//! `/appointment` and `/review` routes.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::extract::{blocking, JsonBody, QueryParams};
use super::Message;
use crate::application::{BookingRequest, Caller, CompletionRequest, ReviewRequest, Services};
use crate::domain::{AppointmentDetails, Review};

pub(super) fn appointment_routes() -> Router<Services> {
    Router::new()
        .route("/bookappointment", post(book))
        .route("/getallappointments", get(list))
        .route("/completed", put(complete))
        .route("/cancel/:id", put(cancel))
}

pub(super) fn review_routes() -> Router<Services> {
    Router::new()
        .route("/addreview", post(add_review))
        .route("/getreviews/:doctor_id", get(reviews_for_doctor))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub message: &'static str,
    pub appointment_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentSearch {
    /// A user id matched against either participant
    #[serde(default)]
    pub search: Option<String>,
}

async fn book(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(request): JsonBody<BookingRequest>,
) -> ApiResult<Json<BookingResponse>> {
    let appointment_id = blocking(move || services.appointments.book(&caller, request)).await?;
    Ok(Json(BookingResponse {
        message: "Appointment booked successfully",
        appointment_id,
    }))
}

async fn list(
    State(services): State<Services>,
    _caller: Caller,
    QueryParams(query): QueryParams<AppointmentSearch>,
) -> ApiResult<Json<Vec<AppointmentDetails>>> {
    let participant = query.search.filter(|s| !s.is_empty());
    blocking(move || services.appointments.list(participant.as_deref()))
        .await
        .map(Json)
}

async fn complete(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(request): JsonBody<CompletionRequest>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.appointments.complete(&caller, &request)).await?;
    Ok(Message::json("Appointment marked as completed"))
}

async fn cancel(
    State(services): State<Services>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.appointments.cancel(&caller, &id)).await?;
    Ok(Message::json("Appointment cancelled successfully"))
}

async fn add_review(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> ApiResult<Json<Message>> {
    blocking(move || services.reviews.add(&caller, request)).await?;
    Ok(Message::json("Review added successfully"))
}

async fn reviews_for_doctor(
    State(services): State<Services>,
    Path(doctor_id): Path<String>,
) -> ApiResult<Json<Vec<Review>>> {
    blocking(move || services.reviews.for_doctor(&doctor_id)).await.map(Json)
}
