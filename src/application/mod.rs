//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application. Every service is synchronous
//! and cheap to clone; callers on an async runtime run them on a blocking
//! thread.

use std::sync::Arc;

use crate::ports::{CredentialStore, Repositories};

mod accounts;
mod analytics;
mod appointments;
mod credentialing;
mod notifications;
mod prescriptions;
mod records;
mod reviews;

#[cfg(test)]
pub(crate) mod testing;

pub use accounts::{AccountService, Caller, LoginRequest, ProfileUpdate, RegisterRequest};
pub use analytics::{AnalyticsService, AppointmentStats, Dashboard, MonthlyCount};
pub use appointments::{AppointmentService, BookingRequest, CompletionRequest};
pub use credentialing::{AvailabilityUpdate, DecisionRequest, DoctorQuery, DoctorService};
pub use notifications::NotificationService;
pub use prescriptions::{PrescriptionRequest, PrescriptionService};
pub use records::{RecordRequest, RecordService};
pub use reviews::{ReviewRequest, ReviewService};

/// All services, wired over one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub doctors: DoctorService,
    pub appointments: AppointmentService,
    pub reviews: ReviewService,
    pub prescriptions: PrescriptionService,
    pub records: RecordService,
    pub notifications: NotificationService,
    pub analytics: AnalyticsService,
}

impl Services {
    #[must_use]
    pub fn new(repos: Repositories, credentials: Arc<dyn CredentialStore>) -> Self {
        let notifications = NotificationService::new(repos.notifications.clone());

        Self {
            accounts: AccountService::new(repos.clone(), credentials),
            doctors: DoctorService::new(repos.clone(), notifications.clone()),
            appointments: AppointmentService::new(repos.clone(), notifications.clone()),
            reviews: ReviewService::new(repos.clone()),
            prescriptions: PrescriptionService::new(repos.clone(), notifications.clone()),
            records: RecordService::new(repos.clone()),
            analytics: AnalyticsService::new(repos),
            notifications,
        }
    }
}
