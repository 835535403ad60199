//! Proxy resolution and connectivity checks.

use serde::Deserialize;
use tracing::info;

use crate::browser::{scripts, BrowserError, PageSession};

/// Echo service reporting the caller's public address as `{"origin": ...}`.
pub const IP_ECHO_URL: &str = "http://httpbin.org/ip";

/// Page loaded to confirm the browser can reach the internet at all.
pub const REACHABILITY_URL: &str = "https://www.google.com";

/// Proxy configured in the environment, if any.
pub fn env_proxy() -> Option<String> {
    ["HTTP_PROXY", "http_proxy"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Build `http://host:port`, or `None` when either part is blank.
pub fn proxy_from_parts(host: &str, port: &str) -> Option<String> {
    let host = host.trim();
    let port = port.trim();
    if host.is_empty() || port.is_empty() {
        return None;
    }
    Some(format!("http://{}:{}", host, port))
}

#[derive(Debug, Deserialize)]
struct IpEcho {
    origin: String,
}

/// Public address from an IP echo response body.
pub fn parse_origin(body: &str) -> Option<String> {
    serde_json::from_str::<IpEcho>(body.trim())
        .ok()
        .map(|echo| echo.origin)
}

/// Endpoints used by [`check_connectivity`].
#[derive(Debug, Clone)]
pub struct ConnectivityCheck {
    pub ip_echo_url: String,
    pub reachability_url: String,
}

impl Default for ConnectivityCheck {
    fn default() -> Self {
        Self {
            ip_echo_url: IP_ECHO_URL.to_string(),
            reachability_url: REACHABILITY_URL.to_string(),
        }
    }
}

/// Confirm the session can reach the internet, through the proxy if one is set.
///
/// Returns the public address seen by the echo service when proxied.
pub async fn check_connectivity<S>(
    session: &mut S,
    check: &ConnectivityCheck,
    proxied: bool,
) -> Result<Option<String>, BrowserError>
where
    S: PageSession + ?Sized,
{
    let mut public_ip = None;

    if proxied {
        session.navigate(&check.ip_echo_url).await?;
        let body = session.run_script(scripts::pre_text()).await?;
        let origin = body.as_str().and_then(parse_origin).ok_or_else(|| {
            BrowserError::Script(format!(
                "Proxy test failed: unexpected response from {}",
                check.ip_echo_url
            ))
        })?;
        info!("Proxy connection successful. Public IP: {}", origin);
        public_ip = Some(origin);
    }

    session.navigate(&check.reachability_url).await?;
    info!("Internet connection test successful");

    Ok(public_ip)
}
