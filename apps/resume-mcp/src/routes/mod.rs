pub mod health;
pub mod preview;

use axum::{middleware, routing::get, Router};

use crate::auth::{auth_middleware, AuthState};
use crate::mcp::http::{mcp_handler, method_not_allowed};
use crate::state::AppState;

/// Preview routes are always served. `/mcp` is mounted only behind auth.
pub fn build_router(state: AppState, auth: Option<AuthState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/resume/preview/:session_id", get(preview::preview_handler))
        .route("/resume/download/:session_id", get(preview::download_handler));

    if let Some(auth) = auth {
        let mcp = Router::new()
            .route(
                "/mcp",
                get(method_not_allowed)
                    .post(mcp_handler)
                    .delete(method_not_allowed),
            )
            .layer(middleware::from_fn_with_state(auth, auth_middleware));
        router = router.merge(mcp);
    }

    router.with_state(state)
}
