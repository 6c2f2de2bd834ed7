use std::time::Duration;

/// Hosts that are always fetchable, before any configuration is applied.
pub(crate) const DEFAULT_ALLOWED_HOSTS: [&str; 2] =
    ["ppr.im-cdn.it", "image.immobiliare.it"];

pub(crate) const DEFAULT_REFERER: &str = "https://gestionale.immobiliare.it/";

// Some CDNs refuse requests that don't look like they come from a browser.
pub(crate) const IMPERSONATION_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";
pub(crate) const IMPERSONATION_ACCEPT: &str =
    "image/avif,image/webp,image/*,*/*;q=0.8";

pub(crate) const FETCH_ATTEMPTS: usize = 3;
pub(crate) const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const BACKOFF_STEP: Duration = Duration::from_millis(500);

pub(crate) const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
pub(crate) const RELAY_CACHE_CONTROL: &str = "public, max-age=86400";
