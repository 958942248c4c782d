use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tools;
use crate::state::AppState;

/// Tool routes mounted at `/tools`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tools::list_tools))
        .route("/{name}", post(tools::call_tool))
}
