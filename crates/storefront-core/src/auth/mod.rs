//! Authentication module
//!
//! Session storage, token renewal and the login/profile endpoints.

mod auth_client;
#[allow(missing_docs)]
pub mod login;
#[allow(missing_docs)]
pub mod profile;
#[allow(missing_docs)]
pub mod renew;
pub mod renewal;
pub mod session;

pub use auth_client::AuthClient;
pub use login::LoginError;
pub use profile::{ProfileError, ProfileUpdate, UserProfile};
pub use renew::RenewError;
pub use session::{Session, SessionStore};
