//! Trading calendar aggregate.

mod aggregate;
mod events;

pub use aggregate::TradingCalendar;
pub use events::{CalendarEvent, NonTradingDay, NonTradingDaysSetData};

use chrono::NaiveDate;
use thiserror::Error;

/// Validation errors raised by trading calendar commands.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// A day in the list falls outside the year being set.
    #[error("{date} is not in {year}")]
    DateOutsideYear { date: NaiveDate, year: i32 },

    /// The same date appears more than once in the list.
    #[error("{date} is listed more than once")]
    DuplicateDate { date: NaiveDate },
}
