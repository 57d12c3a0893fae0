//! Analytics service: dashboard counts over the whole store.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::AppointmentStatus;
use crate::ports::Repositories;
use crate::Result;

const MONTH_BUCKETS: i64 = 6;
const BUCKET_DAYS: i64 = 30;

/// Appointments by status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentStats {
    pub completed: usize,
    pub pending: usize,
    pub cancelled: usize,
}

/// Appointments created in one 30-day window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// Abbreviated month of the window's end, e.g. "Jan"
    pub name: String,
    pub appointments: usize,
}

/// `GET /analytics/dashboard` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_users: usize,
    pub total_doctors: usize,
    pub total_appointments: usize,
    pub pending_applications: usize,
    pub appointment_stats: AppointmentStats,
    /// Oldest window first
    pub monthly_data: Vec<MonthlyCount>,
}

/// Service for dashboard statistics. Open to any authenticated user.
#[derive(Clone)]
pub struct AnalyticsService {
    repos: Repositories,
}

impl AnalyticsService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// # Errors
    /// Returns error if a count fails.
    pub fn dashboard(&self) -> Result<Dashboard> {
        self.dashboard_at(Utc::now())
    }

    /// Dashboard as seen at `now`. Window `i` (0 = oldest) covers
    /// `[now - (6-i)*30d, now - (5-i)*30d)`.
    ///
    /// # Errors
    /// Returns error if a count fails.
    pub fn dashboard_at(&self, now: DateTime<Utc>) -> Result<Dashboard> {
        let appointments = &self.repos.appointments;

        let monthly_data = (0..MONTH_BUCKETS)
            .rev()
            .map(|back| {
                let start = now - Duration::days((back + 1) * BUCKET_DAYS);
                let end = now - Duration::days(back * BUCKET_DAYS);
                Ok(MonthlyCount {
                    name: end.format("%b").to_string(),
                    appointments: appointments.count_created_between(start, end)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Dashboard {
            total_users: self.repos.users.count()?,
            total_doctors: self.repos.doctors.count(true)?,
            total_appointments: appointments.count(None)?,
            pending_applications: self.repos.doctors.count(false)?,
            appointment_stats: AppointmentStats {
                completed: appointments.count(Some(AppointmentStatus::Completed))?,
                pending: appointments.count(Some(AppointmentStatus::Pending))?,
                cancelled: appointments.count(Some(AppointmentStatus::Cancelled))?,
            },
            monthly_data,
        })
    }
}
