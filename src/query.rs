use crate::date::normalize_timestamp;
use crate::error::{Error, Result};
use crate::request::{BoundingBox, RetrievalRequest};
use crate::util::urljoin;

/// Path of the subsetting endpoint on the data host.
pub const SUBSET_PATH: &str = "egi/request";

/// Encodes a request as the query string (without the leading `?`).
///
/// Components appear in a fixed order: `short_name`, `version`,
/// `bounding_box`, `bbox`, `time`, `format`. The spatial filter is sent under
/// both keys because the portal has accepted either over time.
pub fn encode_query(request: &RetrievalRequest) -> Result<String> {
    let mut params: Vec<(&str, String)> = vec![("short_name", request.product.clone())];

    if let Some(version) = &request.version {
        params.push(("version", version.clone()));
    }

    if let Some(bbox) = &request.bbox {
        let bounds = format_bbox(bbox)?;
        params.push(("bounding_box", bounds.clone()));
        params.push(("bbox", bounds));
    }

    if let Some(range) = &request.time_range {
        let start = normalize_timestamp(&range.start)?;
        let end = normalize_timestamp(&range.end)?;
        params.push(("time", format!("{},{}", start, end)));
    }

    if let Some(format) = &request.format {
        params.push(("format", format.clone()));
    }

    Ok(params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Full subsetting URL for `request` against the data host `base_url`.
pub fn request_url(base_url: &str, request: &RetrievalRequest) -> Result<String> {
    Ok(format!(
        "{}?{}",
        urljoin(base_url, SUBSET_PATH),
        encode_query(request)?
    ))
}

// Fixed-point with six decimals, never scientific notation.
fn format_bbox(bbox: &BoundingBox) -> Result<String> {
    let values = bbox.as_array();
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(Error::parameter(
            "bbox",
            format!("{} is not a finite coordinate", bad),
        ));
    }
    Ok(values
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(","))
}
