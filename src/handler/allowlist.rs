use std::collections::BTreeSet;

use crate::handler::upstream;

/// The exact-match set of hostnames the proxy may fetch from. Built once at
/// startup from the default hosts plus the configured extras; read-only for
/// the process lifetime.
#[derive(Clone, Debug)]
pub(crate) struct AllowedHostSet {
    hosts: BTreeSet<String>,
}

impl AllowedHostSet {
    pub(crate) fn new<I, S>(extra_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // DNS hostnames are case-insensitive: normalize everything to
        // lowercase at load time so lookups are a plain membership test.
        let hosts = upstream::DEFAULT_ALLOWED_HOSTS
            .iter()
            .copied()
            .map(str::to_string)
            .chain(extra_hosts.into_iter().map(|host| host.as_ref().to_string()))
            .map(|host| host.trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        AllowedHostSet { hosts }
    }

    /// Exact hostname membership. No wildcard or suffix matching.
    pub(crate) fn is_allowed(&self, hostname: &str) -> bool {
        self.hosts.contains(&hostname.to_ascii_lowercase())
    }

    /// Sorted, comma-separated listing for the landing page.
    pub(crate) fn listing(&self) -> String {
        self.hosts.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
