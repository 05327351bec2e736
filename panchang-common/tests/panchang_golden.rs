//! Golden and property tests for the computation engine
//!
//! Reference values are published day panchangs for New Delhi (28.6°N, 77.2°E),
//! read at 06:00 IST.

use chrono::NaiveDate;
use panchang_common::engine::{compute, skeleton_day, skeleton_month, CivilInstant};
use panchang_common::model::GeoCoordinate;
use panchang_common::names::{lunar_day_name, mansion_name};
use panchang_common::{Phase, Region};

const IST: i32 = 330;

fn delhi() -> GeoCoordinate {
    GeoCoordinate::new(28.6, 77.2).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_golden_2024_01_15_new_delhi() {
    let facts = compute(&CivilInstant::new(date(2024, 1, 15), IST), delhi());

    // Paush Shukla Chaturthi, Shatabhisha
    assert_eq!(facts.lunar_day, 4);
    assert_eq!(lunar_day_name(facts.lunar_day), "Chaturthi");
    assert_eq!(facts.phase, Phase::Waxing);
    assert_eq!(facts.lunar_day_in_phase, 4);
    assert_eq!(facts.mansion, 24);
    assert_eq!(mansion_name(Region::NorthIndian, facts.mansion), "Shatabhisha");
    assert_eq!(facts.sunrise.to_string(), "07:10");
    assert_eq!(facts.sunset.to_string(), "17:32");
}

#[test]
fn test_golden_skeleton_day_uses_regional_names() {
    let hindi = skeleton_day(date(2024, 1, 15), delhi(), Region::NorthIndian, IST);
    let malayalam = skeleton_day(date(2024, 1, 15), delhi(), Region::Malayalam, IST);

    assert_eq!(hindi.lunar_day, "Chaturthi");
    assert_eq!(hindi.mansion, "Shatabhisha");
    assert_eq!(malayalam.mansion, "Chathayam");
    assert_eq!(hindi.day_number, 15);
    assert_eq!(hindi.sunrise, malayalam.sunrise);
}

#[test]
fn test_golden_full_and_new_moons() {
    // Paush Purnima
    let full = compute(&CivilInstant::new(date(2024, 1, 25), IST), delhi());
    assert_eq!(full.lunar_day, 15);
    assert!(full.is_full_moon);
    assert!(!full.is_new_moon);

    // Mauni Amavasya
    let new = compute(&CivilInstant::new(date(2024, 2, 9), IST), delhi());
    assert_eq!(new.lunar_day, 30);
    assert!(new.is_new_moon);
    assert_eq!(new.phase, Phase::Waning);

    // Diwali (Kartika Amavasya)
    let diwali = compute(&CivilInstant::new(date(2024, 11, 1), IST), delhi());
    assert!(diwali.is_new_moon);

    // Vijaya Dashami
    let dussehra = compute(&CivilInstant::new(date(2023, 10, 24), IST), delhi());
    assert_eq!(dussehra.lunar_day, 10);
    assert_eq!(dussehra.phase, Phase::Waxing);
}

#[test]
fn test_compute_is_deterministic() {
    let instant = CivilInstant::new(date(2031, 8, 3), IST);
    let coord = GeoCoordinate::new(12.97, 77.59).unwrap();
    let a = compute(&instant, coord);
    let b = compute(&instant, coord);
    assert_eq!(a, b);
    assert_eq!(a.lunar_longitude.to_bits(), b.lunar_longitude.to_bits());
    assert_eq!(a.sidereal_lunar_longitude.to_bits(), b.sidereal_lunar_longitude.to_bits());
}

#[test]
fn test_indices_and_flags_hold_across_two_centuries() {
    let coords = [
        delhi(),
        GeoCoordinate::new(8.52, 76.94).unwrap(),
        GeoCoordinate::new(-33.87, 151.21).unwrap(),
        GeoCoordinate::new(69.65, 18.96).unwrap(),
    ];
    let mut day = date(1900, 1, 1);
    let end = date(2100, 12, 31);

    while day <= end {
        for coord in coords {
            let f = compute(&CivilInstant::new(day, IST), coord);

            assert!((1..=30).contains(&f.lunar_day), "lunar day {} on {}", f.lunar_day, day);
            assert!((1..=27).contains(&f.mansion), "mansion {} on {}", f.mansion, day);
            assert_eq!(f.phase == Phase::Waxing, f.lunar_day <= 15);
            assert_eq!(f.is_full_moon, f.lunar_day == 15);
            assert_eq!(f.is_new_moon, f.lunar_day == 30);
            assert!(!(f.is_full_moon && f.is_new_moon));
            assert_eq!(f.is_eleventh, f.lunar_day == 11 || f.lunar_day == 26);
            assert_eq!(f.is_eighth, f.lunar_day == 8 || f.lunar_day == 23);
        }
        // Step by a prime number of days to sample every lunar phase
        day += chrono::Duration::days(7);
    }
}

#[test]
fn test_polar_latitudes_clamp_without_domain_error() {
    let arctic = GeoCoordinate::new(89.0, 0.0).unwrap();
    let antarctic = GeoCoordinate::new(-89.0, 0.0).unwrap();

    for d in [date(2024, 6, 21), date(2024, 12, 21)] {
        for coord in [arctic, antarctic, GeoCoordinate::new(90.0, 0.0).unwrap()] {
            let f = compute(&CivilInstant::new(d, 0), coord);
            assert!(f.sunrise.minutes_since_midnight() < 1440);
            assert!(f.sunset.minutes_since_midnight() < 1440);
        }
    }

    // Midnight sun: a full day of daylight wraps sunrise and sunset onto midnight
    let summer = compute(&CivilInstant::new(date(2024, 6, 21), 0), arctic);
    assert_eq!(summer.sunrise.to_string(), "00:00");
    assert_eq!(summer.sunset.to_string(), "00:00");

    // Polar night: zero-length day collapses onto solar noon
    let winter = compute(&CivilInstant::new(date(2024, 12, 21), 0), arctic);
    assert_eq!(winter.sunrise, winter.sunset);
    assert_eq!(winter.sunrise.to_string(), "12:00");
}

#[test]
fn test_leap_february_has_29_skeleton_days() {
    let days = skeleton_month(2024, 2, Region::Telugu, delhi(), IST);
    assert_eq!(days.len(), 29);
    assert_eq!(days.last().unwrap().date, date(2024, 2, 29));
    for (i, d) in days.iter().enumerate() {
        assert_eq!(d.day_number as usize, i + 1);
    }
}
