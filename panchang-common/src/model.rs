//! Almanac data model
//!
//! - [`AlmanacDay`]: the computed skeleton of one day (write-once)
//! - [`AdvisoryFields`]: provider-supplied narrative fields
//! - [`EnrichedDay`]: skeleton + advisory, flattened into one JSON object
//! - [`AlmanacMonth`]: every day of one month for one region

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::region::Region;
use crate::{Error, Result};

/// Reference point used when no coordinate is supplied (geographic centre of India)
pub const DEFAULT_LATITUDE: f64 = 20.59;
pub const DEFAULT_LONGITUDE: f64 = 78.96;

/// Shortest month length; anything shorter is never a valid month
pub const MIN_MONTH_DAYS: usize = 28;

/// Latitude/longitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Validated constructor. Rejects non-finite values and out-of-range degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidInput(format!(
                "Latitude out of range: {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidInput(format!(
                "Longitude out of range: {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The fixed reference point
    pub const fn reference() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
        }
    }

    /// Coordinate rounded to one decimal place, as `<lat>_<lon>`
    pub fn coarse_key(&self) -> String {
        format!("{:.1}_{:.1}", self.latitude, self.longitude)
    }
}

impl Default for GeoCoordinate {
    fn default() -> Self {
        Self::reference()
    }
}

/// Half-month phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waxing,
    Waning,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Waxing => "waxing",
            Phase::Waning => "waning",
        }
    }
}

/// Computed skeleton of a single day
///
/// These eleven fields are ground truth. Nothing downstream of the engine
/// may change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlmanacDay {
    /// Civil date
    pub date: NaiveDate,
    /// Day of month (1-based)
    pub day_number: u32,
    /// Lunar-day name
    pub lunar_day: String,
    /// Waxing or waning half
    pub phase: Phase,
    /// Regional lunar-mansion name
    pub mansion: String,
    /// Local sunrise, `HH:MM`
    pub sunrise: String,
    /// Local sunset, `HH:MM`
    pub sunset: String,
    pub is_full_moon: bool,
    pub is_new_moon: bool,
    /// 11th lunar day of either half
    pub is_eleventh: bool,
    /// 8th lunar day of either half
    pub is_eighth: bool,
}

/// Advisory fields from the enrichment provider
///
/// Every field defaults to empty so a partially filled provider day still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvisoryFields {
    pub festivals: Vec<String>,
    pub regional_month_name: Option<String>,
    pub public_holiday: Option<String>,
    pub rahu_kaalam: Option<String>,
    pub gulika_kaalam: Option<String>,
    pub auspicious_time: Option<String>,
}

impl AdvisoryFields {
    pub fn is_empty(&self) -> bool {
        *self == AdvisoryFields::default()
    }
}

/// A skeleton day plus its advisory fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDay {
    #[serde(flatten)]
    pub skeleton: AlmanacDay,
    #[serde(flatten)]
    pub advisory: AdvisoryFields,
}

impl EnrichedDay {
    /// Day with no advisory content
    pub fn bare(skeleton: AlmanacDay) -> Self {
        Self {
            skeleton,
            advisory: AdvisoryFields::default(),
        }
    }
}

/// One month of enriched days for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlmanacMonth {
    pub month: u32,
    pub year: i32,
    pub region: Region,
    pub days: Vec<EnrichedDay>,
}

impl AlmanacMonth {
    /// True when the month covers every calendar day exactly once, in order.
    /// An incomplete month must never be persisted.
    pub fn is_complete(&self) -> bool {
        let Some(expected) = days_in_month(self.year, self.month) else {
            return false;
        };
        self.days.len() >= MIN_MONTH_DAYS
            && self.days.len() == expected as usize
            && self
                .days
                .iter()
                .enumerate()
                .all(|(i, d)| d.skeleton.day_number as usize == i + 1)
    }

    /// Entry for a specific date, if it falls in this month
    pub fn day_for(&self, date: NaiveDate) -> Option<&EnrichedDay> {
        self.days.iter().find(|d| d.skeleton.date == date)
    }

    /// Day to focus on when presenting the month: `today` if it falls in the
    /// month, otherwise the first day.
    pub fn focus_day(&self, today: NaiveDate) -> Option<&EnrichedDay> {
        self.day_for(today).or_else(|| self.days.first())
    }
}

/// A single-month request as issued by a caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthRequest {
    pub year: i32,
    pub month: u32,
    pub region: Region,
    pub location: Option<GeoCoordinate>,
    pub force: bool,
}

impl MonthRequest {
    pub fn new(year: i32, month: u32, region: Region) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidInput(format!("Month out of range: {}", month)));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::InvalidInput(format!("Year out of range: {}", year)));
        }
        Ok(Self {
            year,
            month,
            region,
            location: None,
            force: false,
        })
    }

    pub fn with_location(mut self, location: Option<GeoCoordinate>) -> Self {
        self.location = location;
        self
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// The same request moved `delta` months, crossing year boundaries.
    /// Never forced.
    pub fn shifted(&self, delta: i32) -> Self {
        let (year, month) = shift_month(self.year, self.month, delta);
        Self {
            year,
            month,
            region: self.region,
            location: self.location,
            force: false,
        }
    }

    /// Location to compute with: the supplied one or `fallback`
    pub fn resolved_location(&self, fallback: GeoCoordinate) -> GeoCoordinate {
        self.location.unwrap_or(fallback)
    }
}

/// Number of days in a month, `None` for an invalid month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Move (year, month) by `delta` months
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32)
}

/// Dates of every day in a month
pub fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(count) = days_in_month(year, month) else {
        return Vec::new();
    };
    (1..=count)
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .collect()
}

/// Short weekday label (Sun, Mon, ...)
pub fn weekday_label(date: NaiveDate) -> &'static str {
    const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    WEEKDAYS[date.weekday().num_days_from_sunday() as usize]
}
