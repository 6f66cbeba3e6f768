use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CakedayError;

/// Oldest birth year we accept when a member shares their year.
pub const MIN_YEAR: i32 = 1900;

pub const MAX_WINDOW_DAYS: i64 = 365;

/// A stored birthday. The member id is the key of the per-guild map, so a
/// member can have at most one record per guild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Birthday {
    pub month: u32,
    pub day: u32,
    /// `None` means the member did not share their birth year.
    pub year: Option<i32>,
}

impl Birthday {
    /// Checked against year 2000, a leap year, so Feb 29 passes.
    pub fn is_valid(&self) -> bool {
        NaiveDate::from_ymd_opt(2000, self.month, self.day).is_some()
    }

    /// Human-readable form for command replies, e.g. "September 24" or
    /// "September 24, 2002".
    pub fn display(&self) -> String {
        let date = NaiveDate::from_ymd_opt(self.year.unwrap_or(2000), self.month, self.day);
        match (date, self.year) {
            (Some(date), Some(_)) => date.format("%B %d, %Y").to_string(),
            (Some(date), None) => date.format("%B %d").to_string(),
            (None, _) => format!("{:02}/{:02}", self.month, self.day),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upcoming {
    pub member_id: u64,
    pub days_until: i64,
    pub occurrence: NaiveDate,
    pub new_age: Option<i32>,
}

/// First calendar date with this record's (month, day) on or after `today`.
///
/// A Feb 29 birthday resolves to the nearest subsequent leap year; in the
/// years in between the member is simply never due. `None` means no year can
/// hold the pair at all, i.e. the record is malformed.
pub fn next_occurrence(birthday: &Birthday, today: NaiveDate) -> Option<NaiveDate> {
    // Feb 29 recurs at most eight years apart (e.g. 2096 -> 2104).
    for year in today.year()..=today.year() + 8 {
        if let Some(date) = NaiveDate::from_ymd_opt(year, birthday.month, birthday.day) {
            if date >= today {
                return Some(date);
            }
        }
    }
    None
}

/// Every member whose next birthday occurrence is within `window_days` of
/// `today`, sorted ascending by days-until. `new_age` is only present when
/// the member shared their birth year. Malformed records are skipped, they
/// never abort the whole pass.
pub fn due_within(
    birthdays: &HashMap<u64, Birthday>,
    today: NaiveDate,
    window_days: i64,
) -> Result<Vec<Upcoming>, CakedayError> {
    if !(0..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(CakedayError::InvalidRange(window_days));
    }

    let mut upcoming = Vec::new();
    for (&member_id, birthday) in birthdays {
        let occurrence = match next_occurrence(birthday, today) {
            Some(date) => date,
            None => {
                let malformed = CakedayError::MalformedRecord {
                    member: member_id,
                    month: birthday.month,
                    day: birthday.day,
                };
                warn!("{malformed}, skipping");
                continue;
            }
        };

        let days_until = (occurrence - today).num_days();
        if days_until > window_days {
            continue;
        }

        upcoming.push(Upcoming {
            member_id,
            days_until,
            occurrence,
            new_age: birthday.year.map(|year| occurrence.year() - year),
        });
    }

    upcoming.sort_by_key(|entry| entry.days_until);
    Ok(upcoming)
}

/// Members whose birthday occurrence is exactly `today`. Window 0 is always
/// in range, so this cannot fail.
pub fn today_exact(birthdays: &HashMap<u64, Birthday>, today: NaiveDate) -> Vec<u64> {
    due_within(birthdays, today, 0)
        .map(|due| due.into_iter().map(|entry| entry.member_id).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn bday(month: u32, day: u32, year: Option<i32>) -> Birthday {
        Birthday { month, day, year }
    }

    #[test]
    fn days_until_stays_within_window_and_members_are_unique() {
        let mut birthdays = HashMap::new();
        birthdays.insert(1, bday(6, 14, Some(1990)));
        birthdays.insert(2, bday(6, 20, None));
        birthdays.insert(3, bday(12, 25, None));

        let due = due_within(&birthdays, date(2024, 6, 14), 14).unwrap();

        assert_eq!(due.len(), 2);
        assert!(due.iter().all(|e| (0..=14).contains(&e.days_until)));
        let mut ids: Vec<u64> = due.iter().map(|e| e.member_id).collect();
        ids.dedup();
        assert_eq!(ids.len(), due.len());
    }

    #[test]
    fn matching_month_and_day_lands_in_the_zero_group() {
        let mut birthdays = HashMap::new();
        birthdays.insert(7, bday(9, 24, None));

        let due = due_within(&birthdays, date(2024, 9, 24), 7).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].days_until, 0);
        assert_eq!(due[0].member_id, 7);
    }

    #[test]
    fn window_zero_matches_today_exact() {
        let mut birthdays = HashMap::new();
        birthdays.insert(1, bday(3, 1, Some(2001)));
        birthdays.insert(2, bday(3, 2, None));

        let today = date(2024, 3, 1);
        let via_window: Vec<u64> = due_within(&birthdays, today, 0)
            .unwrap()
            .into_iter()
            .map(|e| e.member_id)
            .collect();

        assert_eq!(via_window, today_exact(&birthdays, today));
        assert_eq!(via_window, vec![1]);
    }

    #[test]
    fn age_only_when_year_is_known() {
        let mut birthdays = HashMap::new();
        birthdays.insert(1, bday(5, 10, Some(2000)));
        birthdays.insert(2, bday(5, 10, None));

        let due = due_within(&birthdays, date(2024, 5, 10), 0).unwrap();

        for entry in due {
            match entry.member_id {
                1 => assert_eq!(entry.new_age, Some(24)),
                2 => assert_eq!(entry.new_age, None),
                other => panic!("unexpected member {other}"),
            }
        }
    }

    #[test]
    fn leap_day_on_a_leap_year_is_due_with_exact_age() {
        let mut birthdays = HashMap::new();
        birthdays.insert(42, bday(2, 29, Some(2000)));

        let due = due_within(&birthdays, date(2024, 2, 29), 0).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].days_until, 0);
        assert_eq!(due[0].new_age, Some(24));
    }

    #[test]
    fn leap_day_skips_to_the_next_leap_year() {
        let record = bday(2, 29, Some(2000));

        assert_eq!(
            next_occurrence(&record, date(2025, 3, 1)),
            Some(date(2028, 2, 29))
        );

        // Too far out for any valid window, so never reported in between.
        let mut birthdays = HashMap::new();
        birthdays.insert(1, record);
        assert!(due_within(&birthdays, date(2025, 3, 1), 365)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn year_wrap_counts_days_into_january() {
        let mut birthdays = HashMap::new();
        birthdays.insert(9, bday(1, 2, None));

        let due = due_within(&birthdays, date(2024, 12, 30), 7).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].days_until, 3);
        assert_eq!(due[0].occurrence, date(2025, 1, 2));
    }

    #[test]
    fn new_years_eve_is_one_day_out_with_no_age() {
        let mut birthdays = HashMap::new();
        birthdays.insert(5, bday(12, 31, None));

        let due = due_within(&birthdays, date(2024, 12, 30), 7).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].days_until, 1);
        assert_eq!(due[0].new_age, None);
    }

    #[test]
    fn window_zero_with_no_match_is_empty_not_an_error() {
        let mut birthdays = HashMap::new();
        birthdays.insert(1, bday(8, 8, None));

        let due = due_within(&birthdays, date(2024, 3, 3), 0).unwrap();

        assert!(due.is_empty());
    }

    #[test]
    fn out_of_range_windows_are_rejected() {
        let birthdays = HashMap::new();

        assert!(matches!(
            due_within(&birthdays, date(2024, 1, 1), 366),
            Err(CakedayError::InvalidRange(366))
        ));
        assert!(matches!(
            due_within(&birthdays, date(2024, 1, 1), -1),
            Err(CakedayError::InvalidRange(-1))
        ));
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let mut birthdays = HashMap::new();
        birthdays.insert(1, bday(13, 40, None));
        birthdays.insert(2, bday(4, 1, None));

        let due = due_within(&birthdays, date(2024, 4, 1), 0).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].member_id, 2);
    }

    #[test]
    fn results_are_sorted_by_days_until() {
        let mut birthdays = HashMap::new();
        birthdays.insert(1, bday(6, 20, None));
        birthdays.insert(2, bday(6, 14, None));
        birthdays.insert(3, bday(6, 17, None));

        let due = due_within(&birthdays, date(2024, 6, 14), 30).unwrap();

        let days: Vec<i64> = due.iter().map(|e| e.days_until).collect();
        assert_eq!(days, vec![0, 3, 6]);
    }
}
