//! The authenticated request pipeline.

mod fetcher;
mod middleware;

pub use fetcher::{FetchError, Fetcher};
pub use middleware::{SessionExpiredError, SessionMiddleware};
