//! Public IP address lookup over HTTP

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Resolves the host's public IP address
#[async_trait]
pub trait PublicIpLookup: Send + Sync {
    /// Returns `None` when the address cannot be determined
    async fn lookup(&self) -> Option<String>;
}

/// Plain-text IP echo service client (e.g. api.ipify.org, ifconfig.me)
#[derive(Debug, Clone)]
pub struct HttpIpLookup {
    url: String,
    timeout: Duration,
}

impl HttpIpLookup {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl PublicIpLookup for HttpIpLookup {
    async fn lookup(&self) -> Option<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .ok()?;

        let response = match client.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("IP lookup against {} failed: {}", self.url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("IP lookup returned status {}", response.status());
            return None;
        }

        let body = response.text().await.ok()?;
        parse_ip_body(&body)
    }
}

/// Accept the first line of the body if it looks like an address
fn parse_ip_body(body: &str) -> Option<String> {
    let candidate = body.lines().next()?.trim();
    let looks_like_ip = !candidate.is_empty()
        && candidate.len() <= 45
        && candidate
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':');
    looks_like_ip.then(|| candidate.to_string())
}
