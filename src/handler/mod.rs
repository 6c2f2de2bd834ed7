pub(crate) mod allowlist;
pub(crate) mod errors;
pub(crate) mod fetch;
pub(crate) mod middleware;
pub(crate) mod proxy;
pub(crate) mod state;
pub(crate) mod upstream;
pub(crate) mod validate;

use axum::{middleware as axum_middleware, routing::get, Router};

use crate::handler::state::ProxyState;

/// Builds the service router. The CORS layer is added last so it is the
/// outermost middleware: it short-circuits OPTIONS preflights before any
/// routing and stamps the CORS header set onto every response, error
/// responses and unmatched routes included.
pub(crate) fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/", get(proxy::index))
        .route("/img", get(proxy::image))
        .layer(axum_middleware::from_fn(middleware::metrics))
        .layer(axum_middleware::from_fn(middleware::cors))
        .with_state(state)
}
