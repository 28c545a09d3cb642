//! Sprint calendar for a year: 26 bi-weekly slots anchored on a weekday near January 1st.

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

pub const SPRINTS_PER_YEAR: u32 = 26;
pub const SPRINT_LENGTH_DAYS: u32 = 14;

/// One bi-weekly slot of a year.
///
/// `finish` is the last day of the sprint, 13 days after `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintSlot {
    pub number: u32,
    pub name: String,
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

impl SprintSlot {
    pub fn new(year: i32, number: u32, first_start: NaiveDate) -> Self {
        let start = first_start + Days::new(u64::from((number - 1) * SPRINT_LENGTH_DAYS));
        let finish = start + Days::new(u64::from(SPRINT_LENGTH_DAYS - 1));
        Self {
            number,
            name: sprint_name(year, number),
            start,
            finish,
        }
    }

    /// True when the whole sprint lies before `today`.
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.finish < today
    }
}

/// Canonical sprint name: `{year}-{number:02}`.
pub fn sprint_name(year: i32, number: u32) -> String {
    format!("{}-{:02}", year, number)
}

/// Start of sprint 1.
///
/// January 1st is shifted by the difference between the weekdays counted from Sunday, so the
/// result can fall up to six days before January 1st (e.g. a Monday anchor in a year starting
/// on a Wednesday lands on December 30th of the previous year).
pub fn first_sprint_start(year: i32, first_day: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let shift = i64::from(first_day.num_days_from_sunday())
        - i64::from(jan1.weekday().num_days_from_sunday());
    jan1.checked_add_signed(chrono::Duration::days(shift))
}

/// All slots of the year in ascending order.
pub fn sprint_slots(year: i32, first_day: Weekday) -> Vec<SprintSlot> {
    let Some(first_start) = first_sprint_start(year, first_day) else {
        return Vec::new();
    };
    (1..=SPRINTS_PER_YEAR)
        .map(|number| SprintSlot::new(year, number, first_start))
        .collect()
}

/// Slots whose canonical name is not among `existing`, in ascending sprint order.
pub fn missing_slots(year: i32, first_day: Weekday, existing: &HashSet<String>) -> Vec<SprintSlot> {
    sprint_slots(year, first_day)
        .into_iter()
        .filter(|slot| !existing.contains(&slot.name))
        .collect()
}
