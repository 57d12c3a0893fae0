//! `/prescription` and `/medicalrecord` routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::error::ApiResult;
use super::extract::{blocking, JsonBody};
use crate::application::{Caller, PrescriptionRequest, RecordRequest, Services};
use crate::domain::{MedicalRecord, PrescriptionDetails};

pub(super) fn prescription_routes() -> Router<Services> {
    Router::new()
        .route("/create", post(create_prescription))
        .route("/getprescriptions", get(list_prescriptions))
        .route("/:id", get(get_prescription))
}

pub(super) fn record_routes() -> Router<Services> {
    Router::new()
        .route("/create", post(create_record))
        .route("/getrecords/:patient_id", get(records_for_patient))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionCreated {
    pub message: &'static str,
    pub prescription_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCreated {
    pub message: &'static str,
    pub record_id: String,
}

async fn create_prescription(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(request): JsonBody<PrescriptionRequest>,
) -> ApiResult<Json<PrescriptionCreated>> {
    let prescription_id =
        blocking(move || services.prescriptions.create(&caller, request)).await?;
    Ok(Json(PrescriptionCreated {
        message: "Prescription created successfully",
        prescription_id,
    }))
}

async fn list_prescriptions(
    State(services): State<Services>,
    caller: Caller,
) -> ApiResult<Json<Vec<PrescriptionDetails>>> {
    blocking(move || services.prescriptions.list(&caller)).await.map(Json)
}

async fn get_prescription(
    State(services): State<Services>,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<PrescriptionDetails>> {
    blocking(move || services.prescriptions.get(&id)).await.map(Json)
}

async fn create_record(
    State(services): State<Services>,
    caller: Caller,
    JsonBody(request): JsonBody<RecordRequest>,
) -> ApiResult<Json<RecordCreated>> {
    let record_id = blocking(move || services.records.create(&caller, request)).await?;
    Ok(Json(RecordCreated {
        message: "Medical record created successfully",
        record_id,
    }))
}

async fn records_for_patient(
    State(services): State<Services>,
    _caller: Caller,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<Vec<MedicalRecord>>> {
    blocking(move || services.records.for_patient(&patient_id))
        .await
        .map(Json)
}
