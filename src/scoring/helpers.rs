use std::sync::LazyLock;

use regex::Regex;

/// Convert a parsed dose value to milligrams. A missing unit is read as
/// mg (the adapter emits bare numbers for plain-milligram doses); any
/// unit outside the mass family is unreconcilable and returns None so it
/// is never silently miscompared.
pub fn dose_to_mg(value: f64, unit: Option<&str>) -> Option<f64> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let unit = unit.unwrap_or("").trim().to_lowercase();
    match unit.as_str() {
        "" | "mg" | "milligram" | "milligrams" => Some(value),
        "g" | "gram" | "grams" => Some(value * 1000.0),
        "mcg" | "ug" | "µg" | "microgram" | "micrograms" => Some(value / 1000.0),
        _ => None,
    }
}

static RE_EVERY_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"every\s*(\d+)\s*(?:h\b|hr|hour)").unwrap());

/// Doses-per-day multiplier from a free-text frequency. Unrecognized
/// text defaults to once daily, the conservative floor for daily totals.
pub fn daily_frequency_multiplier(frequency: &str) -> f64 {
    let f = frequency.trim().to_lowercase();
    if f.is_empty() {
        return 1.0;
    }
    if f.contains("four times") || f.contains("qid") {
        return 4.0;
    }
    if f.contains("three times") || f.contains("tid") {
        return 3.0;
    }
    if f.contains("twice") || f.contains("two times") || f.contains("bid") {
        return 2.0;
    }
    if let Some(caps) = RE_EVERY_HOURS.captures(&f) {
        if let Ok(hours) = caps[1].parse::<f64>() {
            if hours >= 1.0 {
                return (24.0 / hours).min(24.0);
            }
        }
    }
    if f.contains("weekly") || f.contains("once a week") {
        return 1.0 / 7.0;
    }
    1.0
}

/// Lowercased, trimmed identity used to match medication names against
/// interaction and risk-class records.
pub fn canonical(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Round to two decimals; every point value in a breakdown is rounded at
/// the moment it is produced so itemized lines and their totals agree
/// exactly.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
