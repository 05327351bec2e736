//! Static name tables for lunar days and lunar mansions
//!
//! Names are never computed: the engine produces 1-based indices and these
//! ordered tables resolve them. That is what lets the merge stage treat the
//! names as ground truth.

use crate::region::Region;

/// Number of lunar days in a synodic month
pub const LUNAR_DAY_COUNT: usize = 30;

/// Number of lunar mansions
pub const MANSION_COUNT: usize = 27;

/// Lunar-day names, index 0 = first day of the waxing half
pub const LUNAR_DAY_NAMES: [&str; LUNAR_DAY_COUNT] = [
    "Pratipada", "Dvitiya", "Tritiya", "Chaturthi", "Panchami",
    "Shashthi", "Saptami", "Ashtami", "Navami", "Dashami",
    "Ekadashi", "Dvadashi", "Trayodashi", "Chaturdashi", "Purnima",
    "Pratipada", "Dvitiya", "Tritiya", "Chaturthi", "Panchami",
    "Shashthi", "Saptami", "Ashtami", "Navami", "Dashami",
    "Ekadashi", "Dvadashi", "Trayodashi", "Chaturdashi", "Amavasya",
];

const MALAYALAM_MANSIONS: [&str; MANSION_COUNT] = [
    "Ashwathi", "Bharani", "Karthika", "Rohini", "Makayiram",
    "Thiruvathira", "Punartham", "Pooyam", "Ayilyam", "Makam",
    "Pooram", "Uthram", "Atham", "Chithira", "Chothi",
    "Vishakham", "Anizham", "Thrikketta", "Moolam", "Pooradam",
    "Uthradam", "Thiruvonam", "Avittam", "Chathayam", "Pooruruttathi",
    "Uthrattathi", "Revathi",
];

const TAMIL_MANSIONS: [&str; MANSION_COUNT] = [
    "Ashwini", "Bharani", "Karthigai", "Rohini", "Mirugasirisham",
    "Thiruvathirai", "Punarpoosam", "Poosam", "Ayilyam", "Magam",
    "Pooram", "Uthiram", "Hastham", "Chithirai", "Swathi",
    "Visakam", "Anusham", "Kettai", "Moolam", "Pooradam",
    "Uthiradam", "Thiruvonam", "Avittam", "Sadhayam", "Poorattathi",
    "Uthirattathi", "Revathi",
];

const KANNADA_MANSIONS: [&str; MANSION_COUNT] = [
    "Ashwini", "Bharani", "Krittika", "Rohini", "Mrigashira",
    "Ardra", "Punarvasu", "Pushya", "Ashlesha", "Magha",
    "Pubba", "Uttara", "Hasta", "Chitta", "Swati",
    "Vishakha", "Anuradha", "Jyeshtha", "Moola", "Purvashadha",
    "Uttarashadha", "Shravana", "Dhanishta", "Shatabhisha", "Purvabhadra",
    "Uttarabhadra", "Revati",
];

const TELUGU_MANSIONS: [&str; MANSION_COUNT] = [
    "Ashwini", "Bharani", "Krittika", "Rohini", "Mrigasira",
    "Arudra", "Punarvasu", "Pushyami", "Ashlesha", "Makha",
    "Pubba", "Uttara", "Hasta", "Chitta", "Swati",
    "Visakha", "Anuradha", "Jyeshta", "Moola", "Purvashadha",
    "Uttarashadha", "Sravanam", "Dhanishta", "Satabhisham", "Purvabhadra",
    "Uttarabhadra", "Revati",
];

const HINDI_MANSIONS: [&str; MANSION_COUNT] = [
    "Ashwini", "Bharani", "Krittika", "Rohini", "Mrigashira",
    "Ardra", "Punarvasu", "Pushya", "Ashlesha", "Magha",
    "Purva Phalguni", "Uttara Phalguni", "Hasta", "Chitra", "Swati",
    "Vishakha", "Anuradha", "Jyeshtha", "Mula", "Purva Ashadha",
    "Uttara Ashadha", "Shravana", "Dhanishta", "Shatabhisha", "Purva Bhadrapada",
    "Uttara Bhadrapada", "Revati",
];

const BENGALI_MANSIONS: [&str; MANSION_COUNT] = [
    "Ashwini", "Bharani", "Krittika", "Rohini", "Mrigashira",
    "Ardra", "Punarbasu", "Pushya", "Ashlesha", "Magha",
    "Purba Phalguni", "Uttar Phalguni", "Hasta", "Chitra", "Swati",
    "Bishakha", "Anuradha", "Jyeshtha", "Mula", "Purbashadha",
    "Uttarashadha", "Shrabana", "Dhanishtha", "Shatabhisha", "Purba Bhadrapada",
    "Uttar Bhadrapada", "Rebati",
];

const MARATHI_MANSIONS: [&str; MANSION_COUNT] = [
    "Ashwini", "Bharani", "Krittika", "Rohini", "Mrug",
    "Ardra", "Punarvasu", "Pushya", "Ashlesha", "Magha",
    "Purva", "Uttara", "Hasta", "Chitra", "Swati",
    "Vishakha", "Anuradha", "Jyeshtha", "Mool", "Purvashadha",
    "Uttarashadha", "Shravan", "Dhanishtha", "Shatataraka", "Purva Bhadrapada",
    "Uttara Bhadrapada", "Revati",
];

/// Ordered mansion table for a region
pub const fn mansion_table(region: Region) -> &'static [&'static str; MANSION_COUNT] {
    match region {
        Region::Malayalam => &MALAYALAM_MANSIONS,
        Region::Tamil => &TAMIL_MANSIONS,
        Region::Kannada => &KANNADA_MANSIONS,
        Region::Telugu => &TELUGU_MANSIONS,
        Region::NorthIndian => &HINDI_MANSIONS,
        Region::Bengali => &BENGALI_MANSIONS,
        Region::Marathi => &MARATHI_MANSIONS,
    }
}

/// Name of a 1-based lunar-day index (1..=30). Out-of-range indices saturate.
pub fn lunar_day_name(index: u8) -> &'static str {
    let i = (index.clamp(1, LUNAR_DAY_COUNT as u8) - 1) as usize;
    LUNAR_DAY_NAMES[i]
}

/// Regional name of a 1-based mansion index (1..=27). Out-of-range indices saturate.
pub fn mansion_name(region: Region, index: u8) -> &'static str {
    let i = (index.clamp(1, MANSION_COUNT as u8) - 1) as usize;
    mansion_table(region)[i]
}
