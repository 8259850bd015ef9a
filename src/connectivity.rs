use reqwest::blocking::Client as HttpClient;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Short-timeout reachability probe run once before any transfer.
///
/// The host must answer with a success status: a transport failure (DNS,
/// refused connection, timeout, TLS) or a 4xx/5xx answer is an
/// [`Error::Connectivity`]. Redirects are followed. `verify: false` accepts
/// invalid certificates, as the transfers do.
pub fn check_connection(probe_url: &str, timeout: Duration, verify: bool) -> Result<bool> {
    let connectivity_error = |source| Error::Connectivity {
        url: probe_url.to_string(),
        source,
    };

    let http = HttpClient::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify)
        .build()
        .map_err(connectivity_error)?;

    let resp = http
        .get(probe_url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .map_err(connectivity_error)?;
    debug!(url = probe_url, status = %resp.status(), "connectivity probe answered");
    Ok(true)
}
