//! A Rust client for the NSIDC subsetting API.
//!
//! Retrieves spatially/temporally subsetted altimetry products (ICESat/GLAS,
//! Operation IceBridge, ICESat-2/ATLAS) from NSIDC behind NASA Earthdata Login:
//! encode the subset request, send it through a cookie-persistent session that
//! carries Basic credentials, then keep the delivered zip or unpack it.
//!
//! ## Quick start
//! - Register with Earthdata Login (<https://urs.earthdata.nasa.gov>) and
//!   authorize the `NSIDC_DATAPOOL_OPS` application.
//! - Endpoints default to the production NSIDC / Earthdata hosts and can be
//!   overridden via environment variables (`NSIDC_URL`, `NSIDC_LOGIN_URL`) or a
//!   `.nsidcrc` file (current directory or home directory).
//!
//! ```no_run
//! use nsidc_subset::{Client, Credentials, DeliveryMode, RetrievalRequest};
//!
//! fn main() -> nsidc_subset::Result<()> {
//!     let credentials = Credentials::new("earthdata_user", "secret");
//!     let client = Client::from_env(&credentials)?
//!         .with_directory("icesat2")
//!         .with_delivery(DeliveryMode::Extract);
//!
//!     let request = RetrievalRequest::new("ATL06")
//!         .with_version("001")
//!         .with_bbox([-50.33333, 68.56667, -49.33333, 69.56667])
//!         .with_time_range("2018-11-23T00:00:00", "2018-11-23T23:59:59")
//!         .with_format("NetCDF4-CF");
//!
//!     let report = client.retrieve_all(&[request])?;
//!     for (request, outcome) in report.succeeded() {
//!         println!("{} -> {}", request, outcome.path().display());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod auth;
mod client;
mod config;
mod connectivity;
mod date;
mod error;
pub mod products;
mod query;
mod request;
mod session;
mod transfer;
mod util;

pub use auth::{
    BasicChallenge, CredentialStore, Credentials, basic_authorization, parse_basic_challenge,
};
pub use client::{Client, ClientConfig, ProductReport, RunReport};
pub use connectivity::check_connection;
pub use date::normalize_timestamp;
pub use error::{Error, Result, TransferError};
pub use query::{SUBSET_PATH, encode_query, request_url};
pub use request::{BoundingBox, RetrievalRequest, TimeRange};
pub use session::{MAX_REDIRECTS, Session};
pub use transfer::{
    CHUNK_SIZE, DEFAULT_MODE, DeliveryMode, TransferOptions, TransferOutcome, output_stem,
    transfer,
};
pub use util::expand_tilde;
