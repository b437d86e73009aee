//! Classification grammar shared with the generated daemon script.
//!
//! Only the first report line containing the indicator is considered. Within
//! that line the first level of [`PressureLevel::PRIORITY`] that appears as a
//! case-insensitive substring wins; no match is `unknown`.

use throttle_core::PressureLevel;

/// First line of `report` containing `indicator`, compared case-insensitively.
pub fn extract_indicator<'a>(report: &'a str, indicator: &str) -> Option<&'a str> {
    let needle = indicator.to_lowercase();
    report
        .lines()
        .find(|line| line.to_lowercase().contains(&needle))
}

/// Classify one indicator line.
pub fn classify(text: &str) -> PressureLevel {
    let lowered = text.to_lowercase();
    PressureLevel::PRIORITY
        .into_iter()
        .find(|level| lowered.contains(level.as_str()))
        .unwrap_or(PressureLevel::Unknown)
}

/// Classify a full sensor report: `None` when no indicator line is present.
pub fn classify_report(report: &str, indicator: &str) -> Option<PressureLevel> {
    extract_indicator(report, indicator).map(classify)
}
