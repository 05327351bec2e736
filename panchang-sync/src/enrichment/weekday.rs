//! Offline provider filling the two timing windows from weekday tables
//!
//! Rahu and Gulika Kaalam are fixed 1.5-hour slots per weekday on a
//! 06:00-18:00 day. No festivals or holidays are produced.

use super::{EnrichmentError, EnrichmentPayload, EnrichmentProvider, SkeletonMonth};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::json;

/// Indexed by days from Sunday
const RAHU_KAALAM: [&str; 7] = [
    "16:30 - 18:00",
    "07:30 - 09:00",
    "15:00 - 16:30",
    "12:00 - 13:30",
    "13:30 - 15:00",
    "10:30 - 12:00",
    "09:00 - 10:30",
];

/// Indexed by days from Sunday
const GULIKA_KAALAM: [&str; 7] = [
    "15:00 - 16:30",
    "13:30 - 15:00",
    "12:00 - 13:30",
    "10:30 - 12:00",
    "09:00 - 10:30",
    "07:30 - 09:00",
    "06:00 - 07:30",
];

pub fn rahu_kaalam(date: NaiveDate) -> &'static str {
    RAHU_KAALAM[date.weekday().num_days_from_sunday() as usize]
}

pub fn gulika_kaalam(date: NaiveDate) -> &'static str {
    GULIKA_KAALAM[date.weekday().num_days_from_sunday() as usize]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayTimingsProvider;

#[async_trait]
impl EnrichmentProvider for WeekdayTimingsProvider {
    fn name(&self) -> &'static str {
        "weekday-timings"
    }

    async fn enrich(&self, skeleton: &SkeletonMonth) -> Result<EnrichmentPayload, EnrichmentError> {
        let days = skeleton
            .days
            .iter()
            .map(|day| {
                json!({
                    "rahuKaalam": rahu_kaalam(day.date),
                    "gulikaKaalam": gulika_kaalam(day.date),
                })
            })
            .collect();

        Ok(EnrichmentPayload { days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::merge;
    use panchang_common::engine::skeleton_month;
    use panchang_common::{GeoCoordinate, Region};

    #[test]
    fn test_known_weekdays() {
        // 2024-01-14 was a Sunday, 2024-01-15 a Monday
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(rahu_kaalam(sunday), "16:30 - 18:00");
        assert_eq!(gulika_kaalam(sunday), "15:00 - 16:30");
        assert_eq!(rahu_kaalam(monday), "07:30 - 09:00");
        assert_eq!(gulika_kaalam(monday), "13:30 - 15:00");
    }

    #[tokio::test]
    async fn test_payload_merges_into_complete_month() {
        let skeleton = SkeletonMonth {
            year: 2024,
            month: 4,
            region: Region::Bengali,
            days: skeleton_month(2024, 4, Region::Bengali, GeoCoordinate::reference(), 330),
        };
        let payload = WeekdayTimingsProvider.enrich(&skeleton).await.unwrap();
        let month = merge(&skeleton, payload).unwrap();

        assert!(month.is_complete());
        assert!(month.days.iter().all(|d| d.advisory.rahu_kaalam.is_some()));
        assert!(month.days.iter().all(|d| d.advisory.festivals.is_empty()));
    }
}
