use std::{sync::Arc, time::Duration};

use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use crate::{favorites::FavoritesManager, item::ResourceItem};

/// Best-effort push of the favorites when the host is shutting down.
#[derive(Debug, Clone)]
pub struct UnloadSync {
    favorites: Arc<FavoritesManager>,
    timeout: Duration,
}

impl UnloadSync {
    #[allow(missing_docs)]
    pub fn new(favorites: Arc<FavoritesManager>, timeout: Duration) -> Self {
        Self { favorites, timeout }
    }

    /// Start sending the current favorites and return immediately.
    ///
    /// The send is abandoned once the timeout elapses. Returns `None` when there is nothing to do:
    /// no session, or no Tokio runtime to run the send on.
    pub fn flush(&self) -> Option<JoinHandle<()>> {
        if !self.favorites.is_authenticated() {
            return None;
        }
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Skipping favorites sync on unload: {e}");
                return None;
            }
        };

        let items: Arc<[ResourceItem]> = self.favorites.items();
        let favorites = Arc::clone(&self.favorites);
        let timeout = self.timeout;
        Some(runtime.spawn(async move {
            match tokio::time::timeout(timeout, favorites.push(&items)).await {
                Ok(Ok(_)) => debug!(count = items.len(), "Favorites synced on unload"),
                Ok(Err(e)) => warn!("Favorites sync on unload failed: {e}"),
                Err(_) => warn!("Favorites sync on unload timed out after {timeout:?}"),
            }
        }))
    }
}
