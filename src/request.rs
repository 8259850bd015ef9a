use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Spatial filter: `lon_min, lat_min, lon_max, lat_max` in degrees.
///
/// Ordering of the corners is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.lon_min, self.lat_min, self.lon_max, self.lat_max]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl FromStr for BoundingBox {
    type Err = Error;

    /// Parses `lonmin,latmin,lonmax,latmax`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(Error::parameter(
                "bbox",
                format!("expected 4 comma-separated values, got {}", parts.len()),
            ));
        }
        let mut v = [0.0f64; 4];
        for (slot, raw) in v.iter_mut().zip(&parts) {
            *slot = raw
                .parse::<f64>()
                .map_err(|_| Error::parameter("bbox", format!("'{}' is not a number", raw)))?;
        }
        Ok(v.into())
    }
}

/// Temporal filter. Both ends are kept as supplied and normalized to ISO-8601
/// when the query is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    /// Parses `start,end`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(',') {
            Some((start, end)) if !end.contains(',') => Ok(Self::new(start.trim(), end.trim())),
            _ => Err(Error::parameter(
                "time",
                format!("expected 'start,end', got '{}'", s),
            )),
        }
    }
}

/// One subset request for one product. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalRequest {
    pub product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl RetrievalRequest {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            version: None,
            bbox: None,
            time_range: None,
            format: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_bbox(mut self, bbox: impl Into<BoundingBox>) -> Self {
        self.bbox = Some(bbox.into());
        self
    }

    pub fn with_time_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.time_range = Some(TimeRange::new(start, end));
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

impl fmt::Display for RetrievalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.product)?;
        if let Some(v) = &self.version {
            write!(f, " v{}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_parses_four_values() {
        let b: BoundingBox = "-50.33333, 68.56667,-49.33333,69.56667".parse().unwrap();
        assert_eq!(b.as_array(), [-50.33333, 68.56667, -49.33333, 69.56667]);
    }

    #[test]
    fn bbox_rejects_wrong_arity_and_text() {
        assert!(matches!(
            "1,2,3".parse::<BoundingBox>(),
            Err(Error::Parameter { name: "bbox", .. })
        ));
        assert!(matches!(
            "1,2,x,4".parse::<BoundingBox>(),
            Err(Error::Parameter { name: "bbox", .. })
        ));
    }

    #[test]
    fn time_range_splits_on_single_comma() {
        let t: TimeRange = "2018-11-23T00:00:00,2018-11-23T23:59:59".parse().unwrap();
        assert_eq!(t.start, "2018-11-23T00:00:00");
        assert_eq!(t.end, "2018-11-23T23:59:59");
        assert!("2018-11-23".parse::<TimeRange>().is_err());
        assert!("a,b,c".parse::<TimeRange>().is_err());
    }

    #[test]
    fn display_names_product_and_version() {
        let r = RetrievalRequest::new("ATL06").with_version("006");
        assert_eq!(r.to_string(), "ATL06 v006");
    }
}
