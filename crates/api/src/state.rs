use std::sync::Arc;

use caseload_services::Services;
use caseload_store::Store;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is an `Arc` or a handle around one.
#[derive(Clone)]
pub struct AppState {
    /// Every business service, sharing one store and clock.
    pub services: Arc<Services>,
    /// Storage handle, used by the health check and shutdown.
    pub store: Store,
    pub config: Arc<ServerConfig>,
}
