//! Date parsing for deal invoices.

use chrono::NaiveDate;

use super::patterns::{DATE_DAY_FIRST, DATE_ISO, DATE_MONTH_FIRST, DATE_US};

/// Find the first date in `text`.
///
/// Accepts "March 5, 2024", "Mar 5, 2024", "Jan. 3rd, 2023",
/// "5 March 2024", "5 Mar 2024", "2024-03-05" and "03/05/2024" (US order).
/// When several formats match, the one starting earliest wins.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    let mut candidates: Vec<(usize, NaiveDate)> = Vec::new();

    for caps in DATE_MONTH_FIRST.captures_iter(text) {
        if let Some(date) = month_name(&caps["month"])
            .and_then(|month| ymd(&caps["year"], month, &caps["day"]))
        {
            candidates.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }

    for caps in DATE_DAY_FIRST.captures_iter(text) {
        if let Some(date) = month_name(&caps["month"])
            .and_then(|month| ymd(&caps["year"], month, &caps["day"]))
        {
            candidates.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }

    for pattern in [&*DATE_ISO, &*DATE_US] {
        for caps in pattern.captures_iter(text) {
            let month = caps["month"].parse().unwrap_or(0);
            if let Some(date) = ymd(&caps["year"], month, &caps["day"]) {
                candidates.push((caps.get(0).map_or(0, |m| m.start()), date));
            }
        }
    }

    candidates.into_iter().min_by_key(|(start, _)| *start).map(|(_, date)| date)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Month number for an English month name or abbreviation.
fn month_name(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    let month = match name.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
