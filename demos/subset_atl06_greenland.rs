use anyhow::Result;
use nsidc_subset::{Client, Credentials, DeliveryMode, RetrievalRequest};

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Credentials come from the environment; endpoints from env vars or a `.nsidcrc` file.
    let credentials = Credentials::new(
        std::env::var("EARTHDATA_USERNAME")?,
        std::env::var("EARTHDATA_PASSWORD")?,
    );
    let client = Client::from_env(&credentials)?
        .with_directory("greenland")
        .with_delivery(DeliveryMode::Extract);

    let request = RetrievalRequest::new("ATL06")
        .with_version("001")
        .with_bbox([-50.33333, 68.56667, -49.33333, 69.56667])
        .with_time_range("2018-11-23T00:00:00", "2018-11-23T23:59:59")
        .with_format("NetCDF4-CF");

    let outcome = client.retrieve(&request)?;
    println!("{}", outcome.path().display());
    Ok(())
}
