use std::sync::Arc;

use crate::config::SourcesConfig;
use crate::db::Store;

pub mod analytics;
pub mod assistant;

use analytics::AnalyticsService;
use assistant::AssistantService;

// A container for all services to be injected into routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub assistant: Arc<AssistantService>,
    pub analytics: Arc<AnalyticsService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, sources: SourcesConfig) -> Self {
        // One reqwest client shared by every external source
        let http = reqwest::Client::new();

        Self {
            assistant: Arc::new(AssistantService::new(store.clone(), sources, http)),
            analytics: Arc::new(AnalyticsService::new(store.clone())),
            store,
        }
    }
}
