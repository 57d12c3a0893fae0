//! HTTP surface.
//!
//! Thin axum handlers over [`Services`]. Every route lives under `/api`
//! except the banner at `/`. Handlers authenticate with the [`Caller`]
//! extractor and hand the synchronous service call to the blocking pool.
//!
//! [`Caller`]: crate::application::Caller

mod appointments;
mod clinical;
mod doctors;
pub mod error;
pub mod extract;
mod insights;
mod users;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::Services;

pub use error::{ApiError, ApiResult};

/// `{"message": ...}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn json(message: &'static str) -> Json<Self> {
        Json(Self { message })
    }
}

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

async fn banner() -> Json<Banner> {
    Json(Banner {
        message: "Welcome to DoctorOnCall API",
        version: env!("CARGO_PKG_VERSION"),
        status: "Running",
    })
}

/// Build the application router.
pub fn router(services: Services) -> Router {
    let api = Router::new()
        .nest("/user", users::routes())
        .nest("/doctor", doctors::routes())
        .nest("/appointment", appointments::appointment_routes())
        .nest("/review", appointments::review_routes())
        .nest("/prescription", clinical::prescription_routes())
        .nest("/medicalrecord", clinical::record_routes())
        .nest("/symptom", insights::symptom_routes())
        .nest("/analytics", insights::analytics_routes())
        .nest("/notification", insights::notification_routes());

    Router::new()
        .route("/", get(banner))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(services)
}
