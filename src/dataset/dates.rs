use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];
/// Largest serial Excel accepts (9999-12-31).
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

/// Written dates only: ISO dates and datetimes, `d/m/Y`, `m/d/Y`, `Y/m/d`.
/// Day-first wins when both slash orders are valid.
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// `parse_date_text` plus Excel serial day numbers.
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    if let Some(date) = parse_date_text(value) {
        return Some(date);
    }

    let serial: f64 = value.trim().parse().ok()?;
    if !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lenient_dates() {
        assert_eq!(parse_lenient_date("2024-03-01"), Some(date(2024, 3, 1)));
        assert_eq!(parse_lenient_date("2024-03-01 08:30:00"), Some(date(2024, 3, 1)));
        assert_eq!(parse_lenient_date("2024-03-01T08:30:00+04:30"), Some(date(2024, 3, 1)));
        assert_eq!(parse_lenient_date("03/04/2024"), Some(date(2024, 4, 3)));
        assert_eq!(parse_lenient_date("12/31/2024"), Some(date(2024, 12, 31)));
        assert_eq!(parse_lenient_date("2024/01/02"), Some(date(2024, 1, 2)));
        assert_eq!(parse_lenient_date("45366"), Some(date(2024, 3, 15)));
        assert_eq!(parse_lenient_date("nope"), None);
        assert_eq!(parse_lenient_date("-3"), None);
    }

    #[test]
    fn plain_numbers_are_not_written_dates() {
        assert_eq!(parse_date_text("45366"), None);
        assert_eq!(parse_date_text("7"), None);
        assert_eq!(parse_date_text(" 2023-12-31 "), Some(date(2023, 12, 31)));
    }
}
