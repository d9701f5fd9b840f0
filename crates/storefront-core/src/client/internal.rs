use std::sync::Arc;

use storefront_state::{SettingItem, repository::Repository};

use crate::{auth::session::SessionStore, client::ClientSettings, http::Fetcher};

#[allow(missing_docs)]
pub struct InternalClient {
    pub(crate) settings: ClientSettings,
    pub(crate) session: Arc<SessionStore>,
    pub(crate) fetcher: Fetcher,
    pub(crate) state: Arc<dyn Repository<SettingItem>>,
}

impl std::fmt::Debug for InternalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalClient")
            .field("settings", &self.settings)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
