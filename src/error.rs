use reqwest::StatusCode;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource host could not be reached before any work started.
    #[error("Check internet connection: cannot reach {url}")]
    Connectivity {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A request parameter (time, bounding box, mode, ...) could not be understood.
    #[error("invalid {name} parameter: {reason}")]
    Parameter { name: &'static str, reason: String },

    /// The authenticated HTTP session could not be assembled.
    #[error("failed to build session: {reason}")]
    Session {
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// The delivered archive could not be read or extracted.
    #[error("failed to extract archive {origin}: {reason}")]
    Format {
        origin: String,
        reason: String,
        #[source]
        source: Option<zip::result::ZipError>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("request failed: HTTP {status} for url ({url}){hint}")]
    Status {
        status: StatusCode,
        url: String,
        hint: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("too many redirects (more than {limit}) ending at {url}")]
    TooManyRedirects { url: String, limit: usize },

    #[error("transfer from {url} interrupted: {source}")]
    Interrupted {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Error::Parameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Transfer(TransferError::Io {
            path: path.into(),
            source,
        })
    }

    /// HTTP status carried by a transfer failure, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Transfer(TransferError::Status { status, .. }) => Some(*status),
            Error::Transfer(TransferError::Http(e)) => e.status(),
            _ => None,
        }
    }
}

/// Builds a non-2xx transfer error with a remediation hint for the statuses
/// users actually hit against Earthdata-protected endpoints.
pub(crate) fn status_error(status: StatusCode, url: &str) -> Error {
    let hint = match status {
        StatusCode::UNAUTHORIZED => "\n\nEarthdata Login rejected the credentials.\n- Check the username and password at https://urs.earthdata.nasa.gov\n- Passwords are case sensitive".to_string(),
        StatusCode::FORBIDDEN => "\n\nAccess denied by the data server.\n- Make sure the NSIDC_DATAPOOL_OPS application is authorized for your Earthdata account\n  (Earthdata profile > Applications > Authorized Apps)\n- Re-run this program after approving it".to_string(),
        StatusCode::NOT_FOUND => "\n\nSubsetting endpoint or product not found.\n- Check the product code and dataset version\n- Recommended data url: https://n5eil02u.ecs.nsidc.org".to_string(),
        _ => String::new(),
    };
    Error::Transfer(TransferError::Status {
        status,
        url: url.to_string(),
        hint,
    })
}
