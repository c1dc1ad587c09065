pub mod ai;
pub mod assessment;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod events;
pub mod report;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use ai::SharedModel;
use config::ServerConfig;
use events::EventBroadcaster;
use storage::Storage;

/// Shared application state passed to every REST handler and background task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// Pushes platform events (`assessment.saved`, `report.generated`, ...)
    /// to SSE subscribers.
    pub events: Arc<EventBroadcaster>,
    /// AI model used for report prose. `StaticModel` when no API key is set.
    pub model: SharedModel,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<ServerConfig>, storage: Arc<Storage>, model: SharedModel) -> Self {
        Self {
            config,
            storage,
            events: Arc::new(EventBroadcaster::new()),
            model,
            started_at: std::time::Instant::now(),
        }
    }
}
