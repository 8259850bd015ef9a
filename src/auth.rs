//! Credential handling for Earthdata Login.
//!
//! Two separate concerns live here:
//! - [`basic_authorization`] turns credentials into the `Authorization` header
//!   value that is attached eagerly to every outgoing request.
//! - [`CredentialStore`] answers Basic challenges, but only for the hosts (and
//!   path prefixes) it was told about, so a challenge from any other server
//!   never receives the password.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use std::fmt;

use crate::error::{Error, Result};

/// Earthdata username and password, held for the lifetime of one session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// `Basic <base64(username:secret)>`.
pub fn basic_authorization(credentials: &Credentials) -> String {
    let raw = format!("{}:{}", credentials.username, credentials.secret);
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}

#[derive(Debug, Clone)]
struct StoreEntry {
    realm: Option<String>,
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    credentials: Credentials,
}

impl StoreEntry {
    fn covers(&self, url: &Url) -> bool {
        if url.scheme() != self.scheme
            || url.host_str() != Some(self.host.as_str())
            || url.port_or_known_default() != self.port
        {
            return false;
        }
        let path = url.path();
        self.path == "/"
            || path == self.path.trim_end_matches('/')
            || path.starts_with(&self.path)
    }
}

/// Host-scoped credential lookup used on the 401 challenge path.
///
/// A `None` realm is the default realm: it answers a challenge for any realm
/// raised by a covered URL. An explicit realm only answers challenges naming it,
/// and is preferred over the default when both match.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: Vec<StoreEntry>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `credentials` for every URL under `uri` (scheme, host, port and path prefix).
    pub fn add(&mut self, realm: Option<&str>, uri: &str, credentials: Credentials) -> Result<()> {
        let url = Url::parse(uri).map_err(|e| Error::Session {
            reason: format!("invalid credential scope '{}': {}", uri, e),
            source: None,
        })?;
        let host = url.host_str().ok_or_else(|| Error::Session {
            reason: format!("credential scope '{}' has no host", uri),
            source: None,
        })?;

        let mut path = url.path().to_string();
        if !path.ends_with('/') {
            path.push('/');
        }

        self.entries.push(StoreEntry {
            realm: realm.map(str::to_string),
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port: url.port_or_known_default(),
            path,
            credentials,
        });
        Ok(())
    }

    pub fn find(&self, realm: Option<&str>, url: &Url) -> Option<&Credentials> {
        let exact = realm.and_then(|r| {
            self.entries
                .iter()
                .find(|e| e.realm.as_deref() == Some(r) && e.covers(url))
        });
        exact
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.realm.is_none() && e.covers(url))
            })
            .map(|e| &e.credentials)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed `WWW-Authenticate: Basic ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicChallenge {
    pub realm: Option<String>,
}

/// Returns the Basic challenge in a `WWW-Authenticate` value, if there is one.
pub fn parse_basic_challenge(value: &str) -> Option<BasicChallenge> {
    let value = value.trim();
    let (scheme, params) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let lower = params.to_ascii_lowercase();
    let realm = lower.find("realm=").map(|idx| {
        let rest = &params[idx + "realm=".len()..];
        if let Some(quoted) = rest.strip_prefix('"') {
            quoted.split('"').next().unwrap_or("").to_string()
        } else {
            rest.split(',').next().unwrap_or("").trim().to_string()
        }
    });
    Some(BasicChallenge { realm })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn header_is_base64_of_user_colon_secret() {
        let creds = Credentials::new("Aladdin", "open sesame");
        assert_eq!(
            basic_authorization(&creds),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn debug_hides_secret() {
        let creds = Credentials::new("user", "hunter2");
        let dbg = format!("{:?}", creds);
        assert!(dbg.contains("user"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn store_is_scoped_to_login_host() {
        let mut store = CredentialStore::new();
        store
            .add(None, "https://urs.earthdata.nasa.gov", Credentials::new("u", "p"))
            .unwrap();

        assert!(store.find(None, &url("https://urs.earthdata.nasa.gov/oauth/authorize")).is_some());
        assert!(store.find(Some("any realm"), &url("https://urs.earthdata.nasa.gov/")).is_some());

        assert!(store.find(None, &url("https://n5eil02u.ecs.nsidc.org/egi/request")).is_none());
        assert!(store.find(None, &url("http://urs.earthdata.nasa.gov/")).is_none());
        assert!(store.find(None, &url("https://urs.earthdata.nasa.gov:8443/")).is_none());
        assert!(store.find(None, &url("https://evil.urs.earthdata.nasa.gov/")).is_none());
    }

    #[test]
    fn store_respects_path_prefix_on_segment_boundary() {
        let mut store = CredentialStore::new();
        store
            .add(None, "http://127.0.0.1:9000/login", Credentials::new("u", "p"))
            .unwrap();
        assert!(store.find(None, &url("http://127.0.0.1:9000/login")).is_some());
        assert!(store.find(None, &url("http://127.0.0.1:9000/login/authorize")).is_some());
        assert!(store.find(None, &url("http://127.0.0.1:9000/loginx")).is_none());
        assert!(store.find(None, &url("http://127.0.0.1:9000/data")).is_none());
    }

    #[test]
    fn explicit_realm_wins_over_default() {
        let mut store = CredentialStore::new();
        store.add(None, "https://h/", Credentials::new("default", "p")).unwrap();
        store.add(Some("Admin"), "https://h/", Credentials::new("admin", "p")).unwrap();

        let h = url("https://h/x");
        assert_eq!(store.find(Some("Admin"), &h).unwrap().username(), "admin");
        assert_eq!(store.find(Some("Other"), &h).unwrap().username(), "default");
        assert_eq!(store.find(None, &h).unwrap().username(), "default");
    }

    #[test]
    fn bad_scope_is_session_error() {
        let mut store = CredentialStore::new();
        let err = store.add(None, "not a url", Credentials::new("u", "p")).unwrap_err();
        assert!(matches!(err, Error::Session { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn challenge_parsing() {
        assert_eq!(
            parse_basic_challenge(r#"Basic realm="Please enter your Earthdata Login credentials""#),
            Some(BasicChallenge {
                realm: Some("Please enter your Earthdata Login credentials".into())
            })
        );
        assert_eq!(
            parse_basic_challenge("basic REALM=urs, charset=UTF-8"),
            Some(BasicChallenge {
                realm: Some("urs".into())
            })
        );
        assert_eq!(
            parse_basic_challenge("Basic"),
            Some(BasicChallenge { realm: None })
        );
        assert_eq!(parse_basic_challenge(r#"Bearer realm="x""#), None);
    }
}
