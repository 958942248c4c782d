pub mod health;
pub mod tools;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// GET  /tools          list tool names
/// POST /tools/{name}   invoke a tool with a JSON object of arguments
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/tools", tools::router())
}
