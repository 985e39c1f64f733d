//! Month calendar built from task due dates.
//!
//! The grid for a month runs from the Sunday on or before the 1st to the
//! Sunday on or after the last day. Every day carries the tasks due on it.

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use thiserror::Error;

use crate::api::types::Task;

/// Errors from building a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// The month offset moves outside the supported date range.
    #[error("Month offset {0} is out of range")]
    OutOfRange(i32),
}

/// One day of the calendar grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Whether the day belongs to the displayed month (not padding).
    pub in_month: bool,
    /// Tasks due on this day, in input order.
    pub tasks: Vec<Task>,
}

/// A displayed month.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarMonth {
    /// First day of the displayed month.
    pub month: NaiveDate,
    /// Every day from the leading Sunday to the trailing Sunday, inclusive.
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    /// First day of the grid.
    pub fn start(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    /// Last day of the grid.
    pub fn end(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    /// The cell for `date`, if it is on the grid.
    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Total number of tasks placed on the grid.
    pub fn task_count(&self) -> usize {
        self.days.iter().map(|d| d.tasks.len()).sum()
    }

    /// Month heading, e.g. "January 2024".
    pub fn title(&self) -> String {
        self.month.format("%B %Y").to_string()
    }
}

/// Build the calendar for the month `offset` months away from `today`'s.
pub fn build_month(tasks: &[Task], offset: i32, today: NaiveDate) -> Result<CalendarMonth, CalendarError> {
    let first = month_start(today, offset).ok_or(CalendarError::OutOfRange(offset))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or(CalendarError::OutOfRange(offset))?;

    let lead = u64::from(first.weekday().num_days_from_sunday());
    let trail = u64::from((7 - last.weekday().num_days_from_sunday()) % 7);

    let start = first
        .checked_sub_days(Days::new(lead))
        .ok_or(CalendarError::OutOfRange(offset))?;
    let end = last
        .checked_add_days(Days::new(trail))
        .ok_or(CalendarError::OutOfRange(offset))?;

    let days = start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| CalendarDay {
            date,
            in_month: date.month() == first.month() && date.year() == first.year(),
            tasks: tasks
                .iter()
                .filter(|task| task.due_day() == Some(date))
                .cloned()
                .collect(),
        })
        .collect();

    Ok(CalendarMonth { month: first, days })
}

/// Build the calendar relative to the local current date.
pub fn build_month_from_today(tasks: &[Task], offset: i32) -> Result<CalendarMonth, CalendarError> {
    build_month(tasks, offset, Local::now().date_naive())
}

fn month_start(today: NaiveDate, offset: i32) -> Option<NaiveDate> {
    let first = today.with_day(1)?;
    let months = Months::new(offset.unsigned_abs());
    if offset >= 0 {
        first.checked_add_months(months)
    } else {
        first.checked_sub_months(months)
    }
}
