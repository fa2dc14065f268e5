use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use super::schema::{Column, NormalizedRow};

const DATE_FORMATS: [&str; 7] = [
    "%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y", "%d-%m-%Y", "%Y/%m/%d", "%d/%m/%y", "%d.%m.%y",
];

/// `%Y` also accepts two-digit years; anything earlier than this is one.
const MIN_FOUR_DIGIT_YEAR: i32 = 1900;
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%H:%M:%S%.f"];

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRecord {
    values: NormalizedRow,
    timestamp: Option<NaiveDateTime>,
}

impl InspectionRecord {
    pub fn new(values: NormalizedRow) -> Self {
        let timestamp = parse_inspection_timestamp(
            values[Column::InspectionDate.index()].as_deref(),
            values[Column::InspectionTime.index()].as_deref(),
        );
        Self { values, timestamp }
    }

    pub fn get(&self, column: Column) -> Option<&str> {
        self.values[column.index()].as_deref()
    }

    pub fn values(&self) -> &NormalizedRow {
        &self.values
    }

    pub fn work_order(&self) -> &str {
        self.get(Column::WorkOrder).unwrap_or_default()
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }
}

/// Ascending by timestamp; records without one sort after every dated record.
pub fn cmp_timestamps(left: Option<NaiveDateTime>, right: Option<NaiveDateTime>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn parse_inspection_date(text: &str) -> Option<NaiveDate> {
    // Date cells sometimes carry a midnight time component.
    let date_part = text.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .find(|date| date.year() >= MIN_FOUR_DIGIT_YEAR)
}

pub fn parse_inspection_time(text: &str) -> Option<NaiveTime> {
    let time_part = text.split_whitespace().last()?;
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(time_part, format).ok())
}

/// Combines the date and time cells. A missing time is read as midnight; a
/// time that is present but unreadable makes the whole timestamp unknown.
pub fn parse_inspection_timestamp(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = parse_inspection_date(date?)?;
    let time = match time {
        Some(text) => parse_inspection_time(text)?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S")
            .expect("valid fixture timestamp")
    }

    #[test]
    fn parses_day_first_dates_with_seconds() {
        assert_eq!(
            parse_inspection_timestamp(Some("05/03/2024"), Some("14:05:09")),
            Some(at("2024-03-05", "14:05:09"))
        );
    }

    #[test]
    fn parses_iso_dates_and_short_times() {
        assert_eq!(
            parse_inspection_timestamp(Some("2024-03-05 00:00:00"), Some("07:30")),
            Some(at("2024-03-05", "07:30:00"))
        );
    }

    #[test]
    fn missing_time_is_midnight() {
        assert_eq!(
            parse_inspection_timestamp(Some("05.03.2024"), None),
            Some(at("2024-03-05", "00:00:00"))
        );
    }

    #[test]
    fn unreadable_parts_give_no_timestamp() {
        assert_eq!(parse_inspection_timestamp(None, Some("10:00")), None);
        assert_eq!(parse_inspection_timestamp(Some("sometime"), Some("10:00")), None);
        assert_eq!(parse_inspection_timestamp(Some("05/03/2024"), Some("late")), None);
        assert_eq!(parse_inspection_timestamp(Some("31/02/2024"), Some("10:00")), None);
    }

    #[test]
    fn two_digit_years_are_read_as_this_century() {
        assert_eq!(
            parse_inspection_date("05/03/24"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            parse_inspection_date("05.03.24"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            parse_inspection_date("05/03/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn undated_records_sort_last() {
        let dated = Some(at("2024-03-05", "10:00:00"));
        assert_eq!(cmp_timestamps(dated, None), Ordering::Less);
        assert_eq!(cmp_timestamps(None, dated), Ordering::Greater);
        assert_eq!(cmp_timestamps(None, None), Ordering::Equal);
    }
}
