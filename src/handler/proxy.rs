use super::errors::ProxyError;
use super::state::ProxyState;
use super::{fetch, upstream, validate};

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

fn uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Landing page: usage line plus the configured allow-list.
pub(crate) async fn index(State(state): State<ProxyState>) -> String {
    format!(
        "Image proxy is up.\nUse: /img?url=<URL-ENCODED-IMAGE-URL>\nAllowed hosts: {}",
        state.allowed_hosts.listing()
    )
}

#[derive(Deserialize, Debug)]
pub(crate) struct ImageParams {
    url: Option<String>,
}

/// The proxy pipeline: validate the target URL, authorize its host, fetch
/// with retries, relay body and content type. Errors surface through
/// [`ProxyError`]'s response mapping; CORS headers are stamped on by
/// middleware either way.
#[instrument(skip_all, err, level = tracing::Level::DEBUG, fields(request_id = uuid()))]
pub(crate) async fn image(
    State(state): State<ProxyState>,
    Query(params): Query<ImageParams>,
) -> Result<impl IntoResponse, ProxyError> {
    let target = validate::parse_target(params.url.as_deref())?;

    let hostname = target.host_str().unwrap_or_default();
    if !state.allowed_hosts.is_allowed(hostname) {
        return Err(ProxyError::HostNotAllowed);
    }

    tracing::debug!(%target, "Fetching upstream image");

    let fetched = fetch::fetch(
        &state.http_client,
        &target,
        &state.config.upstream_referer,
    )
    .await?;

    let content_type = fetched
        .content_type
        .unwrap_or_else(|| upstream::DEFAULT_CONTENT_TYPE.to_string());

    tracing::info!(%target, content_type, bytes = fetched.body.len(), "Relaying upstream image");

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                upstream::RELAY_CACHE_CONTROL.to_string(),
            ),
        ],
        fetched.body,
    ))
}
