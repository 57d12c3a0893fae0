//! Review service: posting reviews and re-deriving the doctor's rating.

use serde::Deserialize;

use super::accounts::{Caller, LIST_LIMIT};
use crate::domain::{RatingSummary, Review};
use crate::ports::Repositories;
use crate::Result;

const REVIEW_PAGE_LIMIT: usize = 100;

/// `POST /review/addreview` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// The doctor's user id
    pub doctor_id: String,
    pub rating: i64,
    pub comment: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
}

/// Service for reviews.
#[derive(Clone)]
pub struct ReviewService {
    repos: Repositories,
}

impl ReviewService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Store the review, then recompute the doctor's rating from every
    /// review on record and write it onto their profile.
    ///
    /// The read and the write are separate calls. Two reviews posted at once
    /// can both aggregate the same review set, and the later write wins.
    ///
    /// # Errors
    /// Returns error if a store call fails.
    pub fn add(&self, caller: &Caller, request: ReviewRequest) -> Result<Review> {
        let review = Review::new(
            caller.id(),
            caller.user.full_name(),
            caller.profile().pic.clone(),
            request.doctor_id,
            request.rating,
            request.comment,
            request.appointment_id,
        );
        self.repos.reviews.insert(&review)?;

        let reviews = self.repos.reviews.for_doctor(&review.doctor_id, LIST_LIMIT)?;
        if let Some(summary) = RatingSummary::from_reviews(&reviews) {
            self.repos.doctors.set_rating(&review.doctor_id, &summary)?;
            tracing::info!(
                "Doctor {} rated {:.1} over {} review(s)",
                review.doctor_id,
                summary.rating,
                summary.total_reviews
            );
        }

        Ok(review)
    }

    /// Newest first, up to 100.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn for_doctor(&self, doctor_id: &str) -> Result<Vec<Review>> {
        Ok(self.repos.reviews.for_doctor(doctor_id, REVIEW_PAGE_LIMIT)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::adapters::SqliteStorage;
    use crate::application::testing::{fixture, fixture_with};
    use crate::ports::{ReviewRepository, StorageResult};

    fn review(doctor_id: &str, rating: i64) -> ReviewRequest {
        ReviewRequest {
            doctor_id: doctor_id.to_string(),
            rating,
            comment: "ok".into(),
            appointment_id: None,
        }
    }

    #[test]
    fn test_rating_follows_review_set() {
        let fx = fixture();
        let (doctor, profile) = fx.doctor("Grace", "Hopper", "grace@example.com", "Neurology");
        let patient = fx.caller(&fx.register("Pat", "Ient", "pat@example.com"));

        for rating in [4, 5, 3] {
            fx.services
                .reviews
                .add(&patient, review(doctor.id(), rating))
                .expect("Should add");
        }
        let stored = fx.repos.doctors.find(&profile.id).expect("Should find").expect("Should exist");
        assert_eq!(stored.rating, 4.0);
        assert_eq!(stored.total_reviews, 3);

        fx.services
            .reviews
            .add(&patient, review(doctor.id(), 2))
            .expect("Should add");
        let stored = fx.repos.doctors.find(&profile.id).expect("Should find").expect("Should exist");
        assert_eq!(stored.rating, 3.5);
        assert_eq!(stored.total_reviews, 4);
    }

    #[test]
    fn test_review_carries_reviewer_identity() {
        let fx = fixture();
        let patient = fx.caller(&fx.register("Pat", "Ient", "pat@example.com"));

        let stored = fx
            .services
            .reviews
            .add(&patient, review("doc", 5))
            .expect("Should add");
        assert_eq!(stored.user_name, "Pat Ient");
        assert_eq!(stored.user_pic, patient.profile().pic);

        let listed = fx.services.reviews.for_doctor("doc").expect("Should list");
        assert_eq!(listed, vec![stored]);
    }

    #[test]
    fn test_review_without_profile_is_kept() {
        let fx = fixture();
        let patient = fx.caller(&fx.register("Pat", "Ient", "pat@example.com"));

        fx.services
            .reviews
            .add(&patient, review("no-profile", 1))
            .expect("Missing profile is a silent no-op");
        assert_eq!(fx.services.reviews.for_doctor("no-profile").expect("Should list").len(), 1);
    }

    /// The first `for_doctor` call reports that it has read, then waits for
    /// a release signal before returning its (now stale) result.
    struct StalledReviews {
        inner: Arc<SqliteStorage>,
        stall: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    }

    impl ReviewRepository for StalledReviews {
        fn insert(&self, review: &Review) -> StorageResult<()> {
            ReviewRepository::insert(self.inner.as_ref(), review)
        }

        fn for_doctor(&self, doctor_id: &str, limit: usize) -> StorageResult<Vec<Review>> {
            let result = self.inner.for_doctor(doctor_id, limit);
            let stall = self.stall.lock().expect("Stall lock").take();
            if let Some((reached, release)) = stall {
                reached.send(()).expect("Test should be listening");
                release.recv().expect("Test should release");
            }
            result
        }
    }

    #[test]
    fn test_concurrent_reviews_lose_an_update() {
        let store = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let (reached_tx, reached_rx) = channel();
        let (release_tx, release_rx) = channel();

        let mut repos = Repositories::from_store(store.clone());
        repos.reviews = Arc::new(StalledReviews {
            inner: store,
            stall: Mutex::new(Some((reached_tx, release_rx))),
        });
        let fx = fixture_with(repos);

        let (doctor, profile) = fx.doctor("Grace", "Hopper", "grace@example.com", "Neurology");
        let first = fx.caller(&fx.register("First", "Patient", "first@example.com"));
        let second = fx.caller(&fx.register("Second", "Patient", "second@example.com"));

        std::thread::scope(|scope| {
            let reviews = fx.services.reviews.clone();
            let doctor_id = doctor.id().to_string();
            let stalled = scope.spawn(move || reviews.add(&first, review(&doctor_id, 4)));

            // First writer has read [4] and is parked before its write.
            reached_rx.recv().expect("First writer should reach the read");

            fx.services
                .reviews
                .add(&second, review(doctor.id(), 2))
                .expect("Should add");
            let stored = fx.repos.doctors.find(&profile.id).expect("Should find").expect("Should exist");
            assert_eq!(stored.rating, 3.0);
            assert_eq!(stored.total_reviews, 2);

            release_tx.send(()).expect("Should release");
            stalled.join().expect("Thread should not panic").expect("Should add");
        });

        // The stale aggregate overwrote the fresh one.
        let stored = fx.repos.doctors.find(&profile.id).expect("Should find").expect("Should exist");
        assert_eq!(stored.rating, 4.0);
        assert_eq!(stored.total_reviews, 1);
        assert_eq!(fx.services.reviews.for_doctor(doctor.id()).expect("Should list").len(), 2);
    }
}
