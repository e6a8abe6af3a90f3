use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;

use super::FeedError;

/// A `calendar.txt` row, reduced to its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePeriod {
    pub service_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A `calendar_dates.txt` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceException {
    pub service_id: String,
    pub date: NaiveDate,
    /// `exception_type` 1 adds service on `date`, 2 removes it.
    pub added: bool,
}

/// Services that still run on or after `today`.
///
/// A service counts when its calendar window hasn't ended yet, or when an
/// exception adds it on a day that hasn't passed.
pub fn useful_service_ids(
    calendar: &[ServicePeriod],
    calendar_dates: &[ServiceException],
    today: NaiveDate,
) -> HashSet<String> {
    let mut services: HashSet<String> = calendar
        .iter()
        .filter(|period| period.end_date >= today)
        .map(|period| period.service_id.clone())
        .collect();
    services.extend(
        calendar_dates
            .iter()
            .filter(|exception| exception.added && exception.date >= today)
            .map(|exception| exception.service_id.clone()),
    );
    services
}

#[derive(Deserialize)]
pub(super) struct CalendarRecord {
    service_id: String,
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
pub(super) struct CalendarDateRecord {
    service_id: String,
    date: String,
    exception_type: u8,
}

impl CalendarRecord {
    pub(super) fn resolve(self) -> Result<ServicePeriod, FeedError> {
        Ok(ServicePeriod {
            start_date: parse_date("calendar.txt", &self.start_date)?,
            end_date: parse_date("calendar.txt", &self.end_date)?,
            service_id: self.service_id,
        })
    }
}

impl CalendarDateRecord {
    pub(super) fn resolve(self) -> Result<ServiceException, FeedError> {
        let added = match self.exception_type {
            1 => true,
            2 => false,
            value => {
                return Err(FeedError::InvalidException {
                    service_id: self.service_id,
                    value,
                })
            }
        };
        Ok(ServiceException {
            date: parse_date("calendar_dates.txt", &self.date)?,
            service_id: self.service_id,
            added,
        })
    }
}

/// GTFS dates are `YYYYMMDD`.
pub fn parse_date(file_name: &str, value: &str) -> Result<NaiveDate, FeedError> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").map_err(|source| FeedError::BadDate {
        file_name: file_name.to_string(),
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_date("test", s).unwrap()
    }

    fn period(id: &str, start: &str, end: &str) -> ServicePeriod {
        ServicePeriod {
            service_id: id.into(),
            start_date: day(start),
            end_date: day(end),
        }
    }

    fn exception(id: &str, date: &str, added: bool) -> ServiceException {
        ServiceException {
            service_id: id.into(),
            date: day(date),
            added,
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(day("20240315"), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(parse_date("calendar.txt", "2024-03-15").is_err());
        assert!(parse_date("calendar.txt", "20241340").is_err());
    }

    #[test]
    fn test_ended_services_dropped() {
        let calendar = [
            period("WINTER", "20240101", "20240331"),
            period("SPRING", "20240401", "20240630"),
        ];
        let got = useful_service_ids(&calendar, &[], day("20240410"));
        assert_eq!(got, HashSet::from(["SPRING".to_string()]));
    }

    #[test]
    fn test_service_ending_today_kept() {
        let calendar = [period("S", "20240101", "20240410")];
        assert!(useful_service_ids(&calendar, &[], day("20240410")).contains("S"));
    }

    #[test]
    fn test_future_addition_kept() {
        let dates = [
            exception("HOLIDAY", "20240701", true),
            exception("PAST", "20240101", true),
            exception("REMOVED", "20240801", false),
        ];
        let got = useful_service_ids(&[], &dates, day("20240410"));
        assert_eq!(got, HashSet::from(["HOLIDAY".to_string()]));
    }

    #[test]
    fn test_nothing_useful() {
        let calendar = [period("OLD", "20200101", "20201231")];
        assert!(useful_service_ids(&calendar, &[], day("20240410")).is_empty());
    }

    #[test]
    fn test_exception_type_checked() {
        let record = CalendarDateRecord {
            service_id: "S".into(),
            date: "20240101".into(),
            exception_type: 3,
        };
        assert!(matches!(
            record.resolve(),
            Err(FeedError::InvalidException { value: 3, .. })
        ));
    }
}
