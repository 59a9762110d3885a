use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("CatClient/", env!("CARGO_PKG_VERSION"));

/// Bounds applied to every request so no call can block forever.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

pub fn build_http_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .build()
}

/// Client used for runtime archives: same connect bound, a much longer
/// overall bound since archives are tens of megabytes.
pub fn build_download_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request.max(Duration::from_secs(600)))
        .build()
}
