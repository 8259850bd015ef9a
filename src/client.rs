use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::auth::Credentials;
use crate::config::load_config;
use crate::connectivity::check_connection;
use crate::error::{Error, Result};
use crate::query::request_url;
use crate::request::RetrievalRequest;
use crate::session::Session;
use crate::transfer::{DeliveryMode, TransferOptions, TransferOutcome, transfer};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Data host serving the subsetter, typically `https://n5eil02u.ecs.nsidc.org`.
    pub data_url: String,
    /// Earthdata Login host. Challenge credentials are only ever sent here.
    pub login_url: String,
    /// Target of the pre-flight reachability probe.
    pub probe_url: String,
    pub probe_timeout: Duration,
    /// Upper bound on a whole request, body included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Default Earthdata username, if configured.
    pub user: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_url: "https://n5eil02u.ecs.nsidc.org".to_string(),
            login_url: "https://urs.earthdata.nasa.gov".to_string(),
            probe_url: "https://n5eil01u.ecs.nsidc.org/".to_string(),
            probe_timeout: Duration::from_secs(1),
            timeout: Duration::from_secs(30 * 60),
            connect_timeout: Duration::from_secs(30),
            verify: true,
            user: None,
        }
    }
}

impl ClientConfig {
    /// Resolves the configuration from environment variables and/or `.nsidcrc`.
    pub fn from_env() -> Result<Self> {
        load_config(None, None, None)
    }

    /// Like [`ClientConfig::from_env`], with explicit values taking precedence.
    pub fn load(
        data_url: Option<String>,
        login_url: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        load_config(data_url, login_url, verify)
    }
}

/// Runs subset retrievals for one set of credentials.
///
/// The session (cookies plus Basic auth) is built once in [`Client::new`] and
/// reused by every product, strictly one after the other.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    session: Session,
    options: TransferOptions,
    fail_fast: bool,
}

impl Client {
    /// Creates a client whose endpoints come from environment variables and/or `.nsidcrc`.
    pub fn from_env(credentials: &Credentials) -> Result<Self> {
        Self::new(credentials, ClientConfig::from_env()?)
    }

    pub fn new(credentials: &Credentials, config: ClientConfig) -> Result<Self> {
        let session = Session::new(credentials, &config)?;
        Ok(Self {
            config,
            session,
            options: TransferOptions::default(),
            fail_fast: false,
        })
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.options.directory = directory.into();
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.options.mode = mode;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.options.delivery = delivery;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.options.progress = progress;
        self
    }

    /// Abort [`Client::retrieve_all`] at the first failed product instead of
    /// recording the failure and moving on.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    pub fn check_connection(&self) -> Result<bool> {
        check_connection(
            &self.config.probe_url,
            self.config.probe_timeout,
            self.config.verify,
        )
    }

    /// Encodes and transfers one request. Does not probe connectivity.
    pub fn retrieve(&self, request: &RetrievalRequest) -> Result<TransferOutcome> {
        let url = request_url(&self.config.data_url, request)?;
        transfer(&self.session, &request.product, &url, &self.options)
    }

    /// Probes connectivity once, then retrieves each request in order.
    ///
    /// A failed probe aborts before any query is built. After that, a failing
    /// product is recorded in the report and the next one runs, unless
    /// fail-fast is set.
    pub fn retrieve_all(&self, requests: &[RetrievalRequest]) -> Result<RunReport> {
        self.check_connection()?;

        let mut report = RunReport::default();
        for request in requests {
            match self.retrieve(request) {
                Ok(outcome) => {
                    info!(product = %request.product, path = %outcome.path().display(), "done");
                    report.products.push(ProductReport {
                        request: request.clone(),
                        result: Ok(outcome),
                    });
                }
                Err(e) if self.fail_fast => return Err(e),
                Err(e) => {
                    warn!(product = %request.product, error = %e, "retrieval failed");
                    report.products.push(ProductReport {
                        request: request.clone(),
                        result: Err(e),
                    });
                }
            }
        }
        Ok(report)
    }
}

/// Result of one product within a run.
#[derive(Debug)]
pub struct ProductReport {
    pub request: RetrievalRequest,
    pub result: Result<TransferOutcome>,
}

impl Serialize for ProductReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            request: &'a RetrievalRequest,
            status: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            outcome: Option<&'a TransferOutcome>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<String>,
        }

        let repr = match &self.result {
            Ok(outcome) => Repr {
                request: &self.request,
                status: "done",
                outcome: Some(outcome),
                error: None,
            },
            Err(e) => Repr {
                request: &self.request,
                status: "failed",
                outcome: None,
                error: Some(e.to_string()),
            },
        };
        repr.serialize(serializer)
    }
}

/// Per-product outcomes of [`Client::retrieve_all`], in request order.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub products: Vec<ProductReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&RetrievalRequest, &TransferOutcome)> {
        self.products
            .iter()
            .filter_map(|p| p.result.as_ref().ok().map(|o| (&p.request, o)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&RetrievalRequest, &Error)> {
        self.products
            .iter()
            .filter_map(|p| p.result.as_ref().err().map(|e| (&p.request, e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
