use super::{
    login::{self, LoginError},
    profile::{self, ProfileError, ProfileUpdate, UserProfile},
};
use crate::Client;

/// Subclient containing auth functionality.
#[derive(Clone)]
pub struct AuthClient {
    pub(crate) client: Client,
}

impl AuthClient {
    /// Constructs a new `AuthClient` with the given `Client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Exchange credentials for a session. Returns the user profile when the server includes it.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, LoginError> {
        login::login(&self.client, username, password).await
    }

    /// End the session and forget the cached profile.
    pub async fn logout(&self) {
        login::logout(&self.client).await
    }

    #[allow(missing_docs)]
    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// Fetch the profile from the server, refreshing the cached copy.
    pub async fn profile(&self) -> Result<UserProfile, ProfileError> {
        profile::get_profile(&self.client).await
    }

    #[allow(missing_docs)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ProfileError> {
        profile::update_profile(&self.client, update).await
    }

    /// The profile stored at the last login or profile fetch, without a network call.
    pub async fn cached_profile(&self) -> Option<UserProfile> {
        profile::cached_profile(&self.client).await
    }
}
