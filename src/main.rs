use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use nsidc_subset::products::{self, PRODUCTS};
use nsidc_subset::{
    BoundingBox, Client, ClientConfig, Credentials, DEFAULT_MODE, DeliveryMode, RetrievalRequest,
    TimeRange, expand_tilde,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::Level;

/// Acquire subsetted altimetry data from the NSIDC subsetting API.
///
/// Example:
///   nsidc-subset -T 2018-11-23T00:00:00,2018-11-23T23:59:59
///     -B -50.33333,68.56667,-49.33333,69.56667 --version=001 -F NetCDF4-CF
///     --user=<username> -V ATL06
#[derive(Debug, Parser)]
#[command(name = "nsidc-subset")]
struct Args {
    /// Username for NASA Earthdata Login
    #[arg(short = 'U', long)]
    user: Option<String>,

    /// Working data directory
    #[arg(short = 'D', long, default_value = ".")]
    directory: String,

    /// Version of the dataset to use
    #[arg(long = "version")]
    dataset_version: Option<String>,

    /// Bounding box (lonmin,latmin,lonmax,latmax)
    #[arg(short = 'B', long, allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,

    /// Time range (comma-separated start and end)
    #[arg(short = 'T', long)]
    time: Option<TimeRange>,

    /// Output data format (TABULAR_ASCII, NetCDF4, ...)
    #[arg(short = 'F', long)]
    format: Option<String>,

    /// Permission mode of files processed (octal)
    #[arg(short = 'M', long, value_parser = parse_mode, default_value = "775")]
    mode: u32,

    /// Verbose output of processing (repeat for debug output)
    #[arg(short = 'V', long, action = ArgAction::Count)]
    verbose: u8,

    /// Unzip dataset from NSIDC subsetting service
    #[arg(short = 'Z', long)]
    unzip: bool,

    /// Stop at the first product that fails
    #[arg(long)]
    fail_fast: bool,

    /// Do not draw download progress bars
    #[arg(long)]
    no_progress: bool,

    /// Write a JSON report of every product's outcome to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Product codes to retrieve (e.g. ATL06 ATL08 GLAH12)
    products: Vec<String>,
}

fn parse_mode(s: &str) -> std::result::Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|m| *m <= 0o7777)
        .ok_or_else(|| format!("'{}' is not an octal permission mode", s))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if args.products.is_empty() {
        for (code, description) in PRODUCTS {
            println!("{}: {}", code, description);
        }
        bail!("No products listed");
    }
    for p in &args.products {
        if products::lookup(p).is_none() {
            bail!(
                "Incorrect Data Product Entered ({}); expected one of: {}",
                p,
                products::codes().collect::<Vec<_>>().join(",")
            );
        }
    }

    let config = ClientConfig::from_env().context("failed to load configuration")?;
    let login_host = reqwest::Url::parse(&config.login_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| config.login_url.clone());

    let user = match args.user.clone().or_else(|| config.user.clone()) {
        Some(u) => u,
        None => prompt_line(&format!("Username for {}: ", login_host))?,
    };
    let password = match std::env::var("EARTHDATA_PASSWORD") {
        Ok(p) => p,
        Err(_) => rpassword::prompt_password(format!("Password for {}@{}: ", user, login_host))
            .context("failed to read password")?,
    };
    let credentials = Credentials::new(user, password);

    let delivery = if args.unzip {
        DeliveryMode::Extract
    } else {
        DeliveryMode::Archive
    };
    let client = Client::new(&credentials, config)?
        .with_directory(expand_tilde(&args.directory))
        .with_mode(args.mode)
        .with_delivery(delivery)
        .with_progress(!args.no_progress)
        .with_fail_fast(args.fail_fast);

    let requests: Vec<RetrievalRequest> = args
        .products
        .iter()
        .map(|p| RetrievalRequest {
            product: p.clone(),
            version: args.dataset_version.clone(),
            bbox: args.bbox,
            time_range: args.time.clone(),
            format: args.format.clone(),
        })
        .collect();

    let report = client.retrieve_all(&requests)?;

    if let Some(path) = &args.report {
        let json = report.to_json().context("failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }

    let failed: Vec<_> = report.failed().collect();
    if !failed.is_empty() {
        for (request, err) in &failed {
            eprintln!("{}: {}", request, err);
        }
        bail!(
            "{} of {} product(s) failed",
            failed.len(),
            report.products.len()
        );
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{}", prompt)?;
    stderr.flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read username")?;
    let line = line.trim().to_string();
    if line.is_empty() {
        bail!("an Earthdata username is required");
    }
    Ok(line)
}
