//! Tabular export of a month
//!
//! One header row, then one row per day. Data cells are always quoted with
//! embedded quotes doubled. Pure: reads the month only.

use panchang_common::model::weekday_label;
use panchang_common::{AlmanacMonth, EnrichedDay};

pub const CSV_HEADERS: [&str; 12] = [
    "Date",
    "Day",
    "Month(Reg)",
    "Tithi",
    "Paksha",
    "Nakshatra",
    "Sunrise",
    "Sunset",
    "Rahu Kaalam",
    "Gulika Kaalam",
    "Festivals",
    "Holiday",
];

const MISSING: &str = "N/A";

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn or_missing(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING)
}

/// Cells of one day, in [`CSV_HEADERS`] order
pub fn row(day: &EnrichedDay) -> [String; 12] {
    let s = &day.skeleton;
    let a = &day.advisory;
    let festivals = if a.festivals.is_empty() {
        "None".to_string()
    } else {
        a.festivals.join(" | ")
    };

    [
        s.date.format("%Y-%m-%d").to_string(),
        weekday_label(s.date).to_string(),
        or_missing(&a.regional_month_name).to_string(),
        s.lunar_day.clone(),
        s.phase.as_str().to_string(),
        s.mansion.clone(),
        s.sunrise.clone(),
        s.sunset.clone(),
        or_missing(&a.rahu_kaalam).to_string(),
        or_missing(&a.gulika_kaalam).to_string(),
        festivals,
        a.public_holiday.clone().unwrap_or_else(|| "No".to_string()),
    ]
}

/// Render `month` as CSV
pub fn to_csv(month: &AlmanacMonth) -> String {
    let mut lines = Vec::with_capacity(month.days.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for day in &month.days {
        let cells: Vec<String> = row(day).iter().map(|c| quote(c)).collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

/// Suggested download name, e.g. `Panchang_North_Indian_(Hindi)_2024_1.csv`
pub fn file_name(month: &AlmanacMonth) -> String {
    format!(
        "Panchang_{}_{}_{}.csv",
        month.region.key_component(),
        month.year,
        month.month
    )
}
