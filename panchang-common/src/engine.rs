//! Astronomical computation engine
//!
//! Derives lunar day, half-month phase, lunar mansion and sunrise/sunset for a
//! civil date and a location. Pure and total: no I/O, no state, no error path.
//!
//! The model is low order:
//! - mean solar and mean lunar longitudes from cubic polynomials in Julian
//!   centuries since J2000 (no perturbation terms)
//! - sidereal longitude via a linear-in-years precession correction
//! - solar declination from one sinusoid in day-of-year
//!
//! Accuracy is adequate for day-level classification between roughly 1900 and 2100.

use chrono::{Datelike, NaiveDate};
use std::fmt;

use crate::model::{month_dates, AlmanacDay, GeoCoordinate, Phase};
use crate::names::{lunar_day_name, mansion_name, LUNAR_DAY_COUNT, MANSION_COUNT};
use crate::region::Region;

/// Julian Day of J2000.0 (2000-01-01 12:00 TT)
pub const J2000_JD: f64 = 2_451_545.0;

/// Julian Day of 2000-01-01 00:00 UTC
const JD_2000_MIDNIGHT: f64 = 2_451_544.5;

pub const DAYS_PER_CENTURY: f64 = 36_525.0;
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Width of one lunar day in Moon-minus-Sun elongation (degrees)
pub const LUNAR_DAY_SPAN_DEG: f64 = 12.0;

/// Width of one lunar mansion, 13°20′
pub const MANSION_SPAN_DEG: f64 = 360.0 / 27.0;

/// Local clock hour representing "the day as experienced at sunrise"
pub const REFERENCE_HOUR: u32 = 6;

/// Indian Standard Time, +05:30
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Precession correction at J2000 and its yearly drift. Pinned values: cached
/// months were computed with them.
pub const PRECESSION_AT_J2000_DEG: f64 = 23.85;
pub const PRECESSION_RATE_DEG_PER_YEAR: f64 = 0.013_969;

/// Maximum solar declination used by the sunrise model
const OBLIQUITY_DEG: f64 = 23.44;

const MINUTES_PER_DAY: i64 = 1440;

/// A civil date at the fixed reference time of day in a given timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilInstant {
    pub date: NaiveDate,
    /// Offset of local civil time from UTC, in minutes
    pub utc_offset_minutes: i32,
}

impl CivilInstant {
    pub fn new(date: NaiveDate, utc_offset_minutes: i32) -> Self {
        Self {
            date,
            utc_offset_minutes,
        }
    }

    /// Continuous Julian Day (UTC) of `REFERENCE_HOUR:00` local time on `date`
    pub fn julian_day(&self) -> f64 {
        let days = self
            .date
            .signed_duration_since(epoch_2000())
            .num_days() as f64;
        let local_minutes = (REFERENCE_HOUR * 60) as f64;
        let utc_minutes = local_minutes - self.utc_offset_minutes as f64;
        JD_2000_MIDNIGHT + days + utc_minutes / MINUTES_PER_DAY as f64
    }
}

fn epoch_2000() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// Local clock time with minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    /// Floors fractional minutes and wraps into one day
    pub fn from_fractional_minutes(minutes: f64) -> Self {
        let whole = minutes.floor() as i64;
        Self {
            minutes: whole.rem_euclid(MINUTES_PER_DAY) as u16,
        }
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.minutes
    }

    pub fn hour(&self) -> u16 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u16 {
        self.minutes % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Everything the engine derives for one instant and location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlmanacFacts {
    /// Lunar day, 1..=30
    pub lunar_day: u8,
    pub phase: Phase,
    /// Lunar day within the half-month, 1..=15
    pub lunar_day_in_phase: u8,
    /// Lunar mansion, 1..=27
    pub mansion: u8,
    pub sunrise: ClockTime,
    pub sunset: ClockTime,
    pub is_full_moon: bool,
    pub is_new_moon: bool,
    pub is_eleventh: bool,
    pub is_eighth: bool,
    /// Intermediate angles, kept for diagnostics and tests
    pub solar_longitude: f64,
    pub lunar_longitude: f64,
    pub sidereal_lunar_longitude: f64,
}

/// Normalize an angle to `[0, 360)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `360.0`; callers
/// that bucket the result must clamp.
pub fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Julian centuries since J2000
pub fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000_JD) / DAYS_PER_CENTURY
}

/// Mean ecliptic longitude of the Sun (degrees)
pub fn mean_solar_longitude(t: f64) -> f64 {
    normalize_degrees(
        280.466_456_7 + 36_000.769_827_79 * t + 0.000_303_202_8 * t * t + t * t * t / 49_931_000.0,
    )
}

/// Mean ecliptic longitude of the Moon (degrees)
pub fn mean_lunar_longitude(t: f64) -> f64 {
    normalize_degrees(
        218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t * t + t * t * t / 538_841.0,
    )
}

/// Precession correction (tropical minus sidereal) for a Julian Day
pub fn precession_correction(jd: f64) -> f64 {
    let years = (jd - J2000_JD) / DAYS_PER_YEAR;
    PRECESSION_AT_J2000_DEG + PRECESSION_RATE_DEG_PER_YEAR * years
}

/// Lunar-day index from Moon-minus-Sun elongation, clamped to 1..=30
pub fn lunar_day_index(elongation_deg: f64) -> u8 {
    let raw = (normalize_degrees(elongation_deg) / LUNAR_DAY_SPAN_DEG).floor() as i64 + 1;
    raw.clamp(1, LUNAR_DAY_COUNT as i64) as u8
}

/// Mansion index from sidereal lunar longitude, clamped to 1..=27
///
/// The clamp covers a normalized longitude of exactly 360.0 (see
/// [`normalize_degrees`]) and quotients that round up to 27.0.
pub fn mansion_index(sidereal_deg: f64) -> u8 {
    let raw = (sidereal_deg / MANSION_SPAN_DEG).floor() as i64 + 1;
    raw.clamp(1, MANSION_COUNT as i64) as u8
}

/// Phase and index within the half-month for a lunar day
pub fn phase_of(lunar_day: u8) -> (Phase, u8) {
    if lunar_day <= 15 {
        (Phase::Waxing, lunar_day)
    } else {
        (Phase::Waning, lunar_day - 15)
    }
}

/// Solar declination (degrees) from day-of-year
pub fn solar_declination(day_of_year: u32) -> f64 {
    let angle = (360.0 / 365.0) * (day_of_year as f64 + 10.0);
    -OBLIQUITY_DEG * angle.to_radians().cos()
}

/// Half-day arc of the Sun in degrees of hour angle.
///
/// `cos H` is clamped to [-1, 1]: polar day saturates to 180° (24 h of
/// daylight), polar night to 0°.
pub fn sunrise_hour_angle(latitude_deg: f64, declination_deg: f64) -> f64 {
    let cos_h = -latitude_deg.to_radians().tan() * declination_deg.to_radians().tan();
    let cos_h = if cos_h.is_nan() { 1.0 } else { cos_h.clamp(-1.0, 1.0) };
    cos_h.acos().to_degrees()
}

/// Local sunrise and sunset for a date and location
pub fn sun_times(date: NaiveDate, coord: GeoCoordinate, utc_offset_minutes: i32) -> (ClockTime, ClockTime) {
    let declination = solar_declination(date.ordinal());
    let hour_angle = sunrise_hour_angle(coord.latitude, declination);

    // 4 minutes of clock time per degree of longitude / hour angle
    let solar_noon = 720.0 - 4.0 * coord.longitude + utc_offset_minutes as f64;
    let sunrise = solar_noon - 4.0 * hour_angle;
    let sunset = solar_noon + 4.0 * hour_angle;

    (
        ClockTime::from_fractional_minutes(sunrise),
        ClockTime::from_fractional_minutes(sunset),
    )
}

/// Compute all almanac facts for an instant and location
pub fn compute(instant: &CivilInstant, coord: GeoCoordinate) -> AlmanacFacts {
    let jd = instant.julian_day();
    let t = centuries_since_j2000(jd);

    let solar = mean_solar_longitude(t);
    let lunar = mean_lunar_longitude(t);

    let lunar_day = lunar_day_index(lunar - solar);
    let (phase, lunar_day_in_phase) = phase_of(lunar_day);

    let sidereal = normalize_degrees(lunar - precession_correction(jd));
    let mansion = mansion_index(sidereal);

    let (sunrise, sunset) = sun_times(instant.date, coord, instant.utc_offset_minutes);

    AlmanacFacts {
        lunar_day,
        phase,
        lunar_day_in_phase,
        mansion,
        sunrise,
        sunset,
        is_full_moon: lunar_day == 15,
        is_new_moon: lunar_day == 30,
        is_eleventh: lunar_day_in_phase == 11,
        is_eighth: lunar_day_in_phase == 8,
        solar_longitude: solar,
        lunar_longitude: lunar,
        sidereal_lunar_longitude: sidereal,
    }
}

/// Skeleton day for a date: computed facts with names resolved from the
/// region's tables
pub fn skeleton_day(
    date: NaiveDate,
    coord: GeoCoordinate,
    region: Region,
    utc_offset_minutes: i32,
) -> AlmanacDay {
    let facts = compute(&CivilInstant::new(date, utc_offset_minutes), coord);

    AlmanacDay {
        date,
        day_number: date.day(),
        lunar_day: lunar_day_name(facts.lunar_day).to_string(),
        phase: facts.phase,
        mansion: mansion_name(region, facts.mansion).to_string(),
        sunrise: facts.sunrise.to_string(),
        sunset: facts.sunset.to_string(),
        is_full_moon: facts.is_full_moon,
        is_new_moon: facts.is_new_moon,
        is_eleventh: facts.is_eleventh,
        is_eighth: facts.is_eighth,
    }
}

/// Skeleton days for every day of a month, empty for an invalid month
pub fn skeleton_month(
    year: i32,
    month: u32,
    region: Region,
    coord: GeoCoordinate,
    utc_offset_minutes: i32,
) -> Vec<AlmanacDay> {
    month_dates(year, month)
        .into_iter()
        .map(|date| skeleton_day(date, coord, region, utc_offset_minutes))
        .collect()
}
