//! Merge of provider payloads onto computed skeletons
//!
//! Skeleton fields are copied from the computed month, never from the
//! payload. Advisory fields are read per field: a day that is not an
//! object, or a field of the wrong type, contributes nothing.

use super::{EnrichmentError, EnrichmentPayload, SkeletonMonth};
use panchang_common::model::AdvisoryFields;
use panchang_common::{AlmanacMonth, EnrichedDay};
use serde_json::Value;
use tracing::debug;

/// Combine `skeleton` with `payload`
///
/// Fails only when the payload's day count differs from the skeleton's.
pub fn merge(skeleton: &SkeletonMonth, payload: EnrichmentPayload) -> Result<AlmanacMonth, EnrichmentError> {
    if payload.days.len() != skeleton.days.len() {
        return Err(EnrichmentError::DayCountMismatch {
            expected: skeleton.days.len(),
            actual: payload.days.len(),
        });
    }

    let days = skeleton
        .days
        .iter()
        .zip(payload.days.iter())
        .map(|(computed, raw)| EnrichedDay {
            skeleton: computed.clone(),
            advisory: advisory_from_value(raw),
        })
        .collect();

    Ok(AlmanacMonth {
        month: skeleton.month,
        year: skeleton.year,
        region: skeleton.region,
        days,
    })
}

/// Advisory fields of one provider day
pub fn advisory_from_value(raw: &Value) -> AdvisoryFields {
    let Some(obj) = raw.as_object() else {
        debug!("Provider day is not an object, using empty advisory fields");
        return AdvisoryFields::default();
    };

    AdvisoryFields {
        festivals: festivals(obj.get("festivals")),
        regional_month_name: text(obj.get("regionalMonthName")),
        public_holiday: text(obj.get("publicHoliday")),
        rahu_kaalam: text(obj.get("rahuKaalam")),
        gulika_kaalam: text(obj.get("gulikaKaalam")),
        auspicious_time: text(obj.get("auspiciousTime")),
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn festivals(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| text(Some(item)))
            .collect(),
        // A lone string is a single festival
        Some(v @ Value::String(_)) => text(Some(v)).into_iter().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panchang_common::engine::skeleton_month;
    use panchang_common::{GeoCoordinate, Region};
    use serde_json::json;

    fn january() -> SkeletonMonth {
        SkeletonMonth {
            year: 2024,
            month: 1,
            region: Region::Malayalam,
            days: skeleton_month(2024, 1, Region::Malayalam, GeoCoordinate::reference(), 330),
        }
    }

    #[test]
    fn test_day_count_mismatch_fails_whole_month() {
        let skeleton = january();
        let payload = EnrichmentPayload {
            days: vec![json!({}); 30],
        };
        let err = merge(&skeleton, payload).unwrap_err();
        assert!(matches!(
            err,
            EnrichmentError::DayCountMismatch { expected: 31, actual: 30 }
        ));
    }

    #[test]
    fn test_provider_cannot_override_computed_fields() {
        let skeleton = january();
        let days = (0..31)
            .map(|_| {
                json!({
                    "date": "1999-12-31",
                    "lunarDay": "Invented",
                    "mansion": "Nowhere",
                    "sunrise": "00:00",
                    "isFullMoon": true,
                    "festivals": ["Makara Sankranti"],
                })
            })
            .collect();

        let month = merge(&skeleton, EnrichmentPayload { days }).unwrap();
        for (merged, computed) in month.days.iter().zip(skeleton.days.iter()) {
            assert_eq!(&merged.skeleton, computed);
            assert_eq!(merged.advisory.festivals, vec!["Makara Sankranti".to_string()]);
        }
    }

    #[test]
    fn test_per_field_parse_failures_default_to_empty() {
        let advisory = advisory_from_value(&json!({
            "festivals": "Pongal",
            "regionalMonthName": 42,
            "publicHoliday": "  ",
            "rahuKaalam": "07:30 - 09:00",
        }));
        assert_eq!(advisory.festivals, vec!["Pongal".to_string()]);
        assert_eq!(advisory.regional_month_name, None);
        assert_eq!(advisory.public_holiday, None);
        assert_eq!(advisory.rahu_kaalam.as_deref(), Some("07:30 - 09:00"));

        assert!(advisory_from_value(&json!("not an object")).is_empty());
        assert!(advisory_from_value(&Value::Null).is_empty());
    }
}
