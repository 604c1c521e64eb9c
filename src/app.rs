//! Application state container.
//!
//! Everything the views need is created once here and handed out by clone.
//! The store starts empty; nothing resets it implicitly.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::notify::Notifier;
use crate::remote::BackendClient;
use crate::settings::Settings;
use crate::store::Store;
use crate::students::Students;
use crate::sync::ListSync;
use crate::tracker::OperationTracker;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub notifier: Notifier,
    pub tracker: OperationTracker,
    pub students: Students,
    pub settings: Settings,
    pub list: Arc<ListSync>,
}

impl AppState {
    /// Build the state for `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let client = BackendClient::with_timeout(&config.backend_url, config.request_timeout)?;
        Ok(Self::with_client(client, config))
    }

    /// Build the state around an existing client.
    pub fn with_client(client: BackendClient, config: &Config) -> Self {
        let store = Store::new();
        let notifier = Notifier::new();
        let tracker = OperationTracker::new(store.clone());
        let students = Students::new(
            client.clone(),
            store.clone(),
            tracker.clone(),
            notifier.clone(),
        );
        let settings = Settings::new(client, notifier.clone());
        let list = Arc::new(ListSync::new(
            students.clone(),
            config.page_size,
            config.search_debounce,
        ));

        Self {
            store,
            notifier,
            tracker,
            students,
            settings,
            list,
        }
    }
}
