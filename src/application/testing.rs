//! Shared fixtures for service tests.

use std::sync::Arc;

use serde_json::json;

use super::{Caller, DecisionRequest, RegisterRequest, Services};
use crate::adapters::{LocalCredentialStore, PasswordCost, SqliteStorage, TokenSeed};
use crate::domain::{DoctorProfile, User};
use crate::ports::{CredentialStore, Repositories};

pub(crate) struct Fixture {
    pub services: Services,
    pub repos: Repositories,
    pub credentials: Arc<LocalCredentialStore>,
}

/// Services over a fresh in-memory store.
pub(crate) fn fixture() -> Fixture {
    let store = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
    fixture_with(Repositories::from_store(store))
}

/// Services over caller-supplied repositories.
pub(crate) fn fixture_with(repos: Repositories) -> Fixture {
    let credentials = Arc::new(
        LocalCredentialStore::new(
            &TokenSeed::generate(),
            PasswordCost::cheap(),
            chrono::Duration::hours(1),
        )
        .expect("Should build credential store"),
    );
    let services = Services::new(repos.clone(), credentials.clone());

    Fixture {
        services,
        repos,
        credentials,
    }
}

impl Fixture {
    /// Password of every account the fixture creates.
    pub const PASSWORD: &'static str = "correct horse battery staple";

    /// Register through the account service and return the stored user.
    pub fn register(&self, firstname: &str, lastname: &str, email: &str) -> User {
        let profile = self
            .services
            .accounts
            .register(RegisterRequest {
                firstname: firstname.into(),
                lastname: lastname.into(),
                email: email.into(),
                password: Self::PASSWORD.into(),
                pic: None,
            })
            .expect("Should register");
        self.stored(&profile.id)
    }

    /// A caller whose token carries the user's own role flags.
    pub fn caller(&self, user: &User) -> Caller {
        self.caller_with_claims(user, user.profile.is_admin)
    }

    /// A caller whose token says `is_admin` regardless of the stored flag.
    pub fn caller_with_claims(&self, user: &User, is_admin: bool) -> Caller {
        let token = self
            .credentials
            .issue_token(user.id(), is_admin, user.profile.is_doctor)
            .expect("Should issue token");
        let claims = self.credentials.verify_token(&token).expect("Should verify token");

        Caller {
            user: user.clone(),
            claims,
        }
    }

    /// Insert an admin account directly; registration cannot create one.
    pub fn admin(&self) -> Caller {
        let digest = self
            .credentials
            .hash_password(Self::PASSWORD)
            .expect("Should hash");
        let mut user = User::new("Site", "Admin", "admin@example.com", digest, None);
        user.profile.is_admin = true;
        self.repos.users.insert(&user).expect("Should insert admin");
        self.caller(&user)
    }

    /// Register, apply and get accepted. Returns the refreshed user and
    /// their credentialed profile.
    pub fn doctor(
        &self,
        firstname: &str,
        lastname: &str,
        email: &str,
        specialization: &str,
    ) -> (User, DoctorProfile) {
        let user = self.register(firstname, lastname, email);
        let profile = self
            .services
            .doctors
            .apply(
                &self.caller(&user),
                json!({"specialization": specialization, "fees": "300"}),
            )
            .expect("Should apply");

        let request = DecisionRequest {
            id: Some(profile.id.clone()),
            user_id: Some(user.id().to_string()),
        };
        self.services
            .doctors
            .accept(&self.admin(), &request)
            .expect("Should accept");

        let profile = self
            .repos
            .doctors
            .find(&profile.id)
            .expect("Should find")
            .expect("Should exist");
        (self.stored(user.id()), profile)
    }

    fn stored(&self, id: &str) -> User {
        self.repos
            .users
            .find(id)
            .expect("Should find")
            .expect("Should exist")
    }
}
