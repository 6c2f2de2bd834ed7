use crate::config::ProxyConfig;
use crate::handler::allowlist::AllowedHostSet;

#[derive(Clone)]
pub(crate) struct ProxyState {
    pub(crate) config: ProxyConfig,
    pub(crate) allowed_hosts: AllowedHostSet,
    pub(crate) http_client: reqwest::Client,
}
