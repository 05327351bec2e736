//! Cache keys
//!
//! `<namespace>_<year>_<month>_<region>_<lat>_<lon>` with the region's spaces
//! replaced by underscores and coordinates at one decimal place. Requests
//! without a location use the literal `default` in place of `<lat>_<lon>`.

use panchang_common::{AlmanacMonth, GeoCoordinate, MonthRequest, Region};
use std::fmt;

/// Location component used when a request carries no coordinate
pub const NO_LOCATION_TOKEN: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    key: String,
    year: i32,
    month: u32,
    region: Region,
}

impl CacheKey {
    pub fn new(
        namespace: &str,
        year: i32,
        month: u32,
        region: Region,
        location: Option<GeoCoordinate>,
    ) -> Self {
        let location = location
            .map(|c| c.coarse_key())
            .unwrap_or_else(|| NO_LOCATION_TOKEN.to_string());
        let key = format!(
            "{}_{}_{}_{}_{}",
            namespace,
            year,
            month,
            region.key_component(),
            location
        );
        Self {
            namespace: namespace.to_string(),
            key,
            year,
            month,
            region,
        }
    }

    pub fn for_request(namespace: &str, request: &MonthRequest) -> Self {
        Self::new(
            namespace,
            request.year,
            request.month,
            request.region,
            request.location,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// True when `month` is the month this key names
    pub fn describes(&self, month: &AlmanacMonth) -> bool {
        month.year == self.year && month.month == self.month && month.region == self.region
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format_with_location() {
        let coord = GeoCoordinate::new(28.6139, 77.209).unwrap();
        let key = CacheKey::new("panchang_cache_v1", 2024, 1, Region::NorthIndian, Some(coord));
        assert_eq!(key.as_str(), "panchang_cache_v1_2024_1_North_Indian_(Hindi)_28.6_77.2");
        assert_eq!(key.namespace(), "panchang_cache_v1");
    }

    #[test]
    fn test_key_format_without_location() {
        let key = CacheKey::new("panchang_cache_v1", 2023, 12, Region::Malayalam, None);
        assert_eq!(key.to_string(), "panchang_cache_v1_2023_12_Malayalam_default");
    }

    #[test]
    fn test_describes_checks_year_month_and_region() {
        let key = CacheKey::new("ns", 2024, 2, Region::Tamil, None);
        let mut month = AlmanacMonth {
            month: 2,
            year: 2024,
            region: Region::Tamil,
            days: Vec::new(),
        };
        assert!(key.describes(&month));

        month.region = Region::Telugu;
        assert!(!key.describes(&month));
        month.region = Region::Tamil;
        month.year = 2023;
        assert!(!key.describes(&month));
    }

    #[test]
    fn test_nearby_coordinates_share_a_key() {
        let a = GeoCoordinate::new(9.931, 76.267).unwrap();
        let b = GeoCoordinate::new(9.949, 76.241).unwrap();
        assert_eq!(
            CacheKey::new("ns", 2024, 5, Region::Tamil, Some(a)),
            CacheKey::new("ns", 2024, 5, Region::Tamil, Some(b))
        );
    }
}
