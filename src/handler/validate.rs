use reqwest::Url;

use crate::handler::errors::ProxyError;

/// Purely syntactic validation of the client-supplied target URL. No DNS
/// resolution, no reachability check.
pub(crate) fn parse_target(raw: Option<&str>) -> Result<Url, ProxyError> {
    let raw = raw
        .filter(|value| !value.is_empty())
        .ok_or(ProxyError::MissingParameter)?;
    let target = Url::parse(raw).map_err(|_| ProxyError::MalformedUrl)?;
    // Opaque schemes like mailto: parse but carry no host.
    if target.host_str().is_none() {
        return Err(ProxyError::MalformedUrl);
    }
    Ok(target)
}
