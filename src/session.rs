use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{
    AUTHORIZATION, HeaderMap, HeaderValue, LOCATION, USER_AGENT, WWW_AUTHENTICATE,
};
use reqwest::redirect::Policy;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{CredentialStore, Credentials, basic_authorization, parse_basic_challenge};
use crate::client::ClientConfig;
use crate::error::{Error, Result, TransferError};

/// Redirect hops followed per request before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Authenticated, cookie-persistent HTTP handle shared by every transfer of a run.
///
/// The cookie jar lives as long as the session and records the session cookie
/// handed out at the end of the Earthdata redirect chain, so later requests go
/// straight to the data. Not meant for concurrent use: one run, one thread.
///
/// Redirects are followed here rather than by reqwest so the Basic header can
/// ride along on the hop to the login host.
#[derive(Debug)]
pub struct Session {
    http: HttpClient,
    cookies: Arc<Jar>,
    store: CredentialStore,
    authorization: HeaderValue,
    data_url: Url,
}

impl Session {
    /// Builds the session. No request is sent.
    pub fn new(credentials: &Credentials, config: &ClientConfig) -> Result<Self> {
        Self::with_store(credentials, CredentialStore::new(), config)
    }

    /// Like [`Session::new`], with extra challenge-only entries in `store`.
    ///
    /// Entries under an explicit realm are used only to answer a
    /// `WWW-Authenticate: Basic` challenge naming that realm; they never get
    /// the up-front header.
    pub fn with_store(
        credentials: &Credentials,
        mut store: CredentialStore,
        config: &ClientConfig,
    ) -> Result<Self> {
        store.add(None, &config.login_url, credentials.clone())?;

        let data_url = Url::parse(&config.data_url).map_err(|e| Error::Session {
            reason: format!("invalid data url {}: {}", config.data_url, e),
            source: None,
        })?;

        let mut authorization =
            HeaderValue::from_str(&basic_authorization(credentials)).map_err(|e| Error::Session {
                reason: format!("credentials cannot be sent as a header: {}", e),
                source: None,
            })?;
        authorization.set_sensitive(true);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("nsidc-subset/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("nsidc-subset")),
        );

        let cookies = Arc::new(Jar::default());
        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .cookie_provider(Arc::clone(&cookies))
            .redirect(Policy::none())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout);

        if !config.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|e| Error::Session {
            reason: "failed to build HTTP client".to_string(),
            source: Some(e),
        })?;

        Ok(Self {
            http,
            cookies,
            store,
            authorization,
            data_url,
        })
    }

    /// Issues a GET, following redirects and answering at most one Basic
    /// challenge from a URL the credential store covers.
    ///
    /// Every hop to the data host or to a URL under the login address carries
    /// the Basic header up front: the portal does not always challenge before
    /// it expects credentials. Other hosts get no credentials unless they
    /// challenge for a realm the store knows.
    ///
    /// Non-2xx responses are returned as-is; the caller decides what they mean.
    pub fn get(&self, url: &str) -> Result<Response> {
        let mut url =
            Url::parse(url).map_err(|e| Error::parameter("url", format!("{}: {}", url, e)))?;
        let mut answer: Option<&Credentials> = None;
        let mut challenged = false;

        for _ in 0..=MAX_REDIRECTS {
            let resp = self.send(&url, answer.take())?;
            let status = resp.status();

            if is_followed_redirect(status) {
                let Some(next) = redirect_target(&resp) else {
                    return Ok(resp);
                };
                debug!(from = %resp.url(), to = %next, status = %status, "following redirect");
                url = next;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED && !challenged {
                let Some(credentials) = self.challenge_answer(&resp) else {
                    return Ok(resp);
                };
                challenged = true;
                answer = Some(credentials);
                url = resp.url().clone();
                continue;
            }

            return Ok(resp);
        }

        Err(TransferError::TooManyRedirects {
            url: url.to_string(),
            limit: MAX_REDIRECTS,
        }
        .into())
    }

    /// The `Cookie` header this session would send to `url`, if any.
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        self.cookies
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Whether `url` gets the Basic header without being asked for it.
    fn sends_credentials_to(&self, url: &Url) -> bool {
        url.origin() == self.data_url.origin() || self.store.find(None, url).is_some()
    }

    fn send(&self, url: &Url, answer: Option<&Credentials>) -> Result<Response> {
        let mut request = self.http.get(url.clone());
        if let Some(credentials) = answer {
            request = request.basic_auth(credentials.username(), Some(credentials.secret()));
        } else if self.sends_credentials_to(url) {
            request = request.header(AUTHORIZATION, self.authorization.clone());
        }
        Ok(request.send().map_err(TransferError::Http)?)
    }

    /// Credentials to answer the Basic challenge carried by `resp`, unless
    /// they were already sent with the request that drew it.
    fn challenge_answer(&self, resp: &Response) -> Option<&Credentials> {
        let challenge = resp
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(parse_basic_challenge)?;

        let Some(credentials) = self.store.find(challenge.realm.as_deref(), resp.url()) else {
            debug!(url = %resp.url(), "Basic challenge from a host without stored credentials");
            return None;
        };
        if self.sends_credentials_to(resp.url())
            && basic_authorization(credentials).as_bytes() == self.authorization.as_bytes()
        {
            debug!(url = %resp.url(), "credentials already sent were rejected");
            return None;
        }

        debug!(url = %resp.url(), realm = ?challenge.realm, "answering Basic challenge");
        Some(credentials)
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn redirect_target(resp: &Response) -> Option<Url> {
    let location = resp.headers().get(LOCATION)?.to_str().ok()?;
    resp.url().join(location).ok()
}
