//! Trading calendar aggregate implementation.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use common::AggregateId;

use crate::aggregate::{Aggregate, AggregateRoot};

use super::{CalendarError, CalendarEvent, NonTradingDay, NonTradingDaysSetData};

/// Trading calendar aggregate root.
///
/// Holds the non-trading days of an exchange, partitioned by calendar year.
/// Each year's list is replaced wholesale whenever it is set again; lists for
/// different years are independent.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    root: AggregateRoot<CalendarEvent>,
    years: BTreeMap<i32, Vec<NonTradingDay>>,
}

impl Aggregate for TradingCalendar {
    type Event = CalendarEvent;
    type Error = CalendarError;

    fn aggregate_type() -> &'static str {
        "TradingCalendar"
    }

    fn new(id: AggregateId) -> Self {
        Self {
            root: AggregateRoot::new(id),
            years: BTreeMap::new(),
        }
    }

    fn root(&self) -> &AggregateRoot<CalendarEvent> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<CalendarEvent> {
        &mut self.root
    }

    fn mutate(&mut self, event: &CalendarEvent) {
        match event {
            CalendarEvent::NonTradingDaysSet(data) => {
                self.years.insert(data.year, data.days.clone());
            }
        }
    }
}

// Query methods
impl TradingCalendar {
    /// Returns the non-trading days set for `year`, ordered by date.
    pub fn non_trading_days(&self, year: i32) -> &[NonTradingDay] {
        self.years.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Years that have had a list set, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn is_non_trading_day(&self, date: NaiveDate) -> bool {
        self.non_trading_days(date.year())
            .iter()
            .any(|day| day.date == date)
    }

    /// A trading day is a weekday that is not a non-trading day.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_non_trading_day(date)
    }

    /// First trading day strictly after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        date.iter_days().skip(1).find(|d| self.is_trading_day(*d))
    }

    /// Last trading day strictly before `date`.
    pub fn previous_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut current = date.pred_opt()?;
        while !self.is_trading_day(current) {
            current = current.pred_opt()?;
        }
        Some(current)
    }

    /// Trading days from `from` to `to`, both inclusive.
    pub fn trading_days(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        from.iter_days()
            .take_while(move |d| *d <= to)
            .filter(move |d| self.is_trading_day(*d))
    }
}

// Command methods
impl TradingCalendar {
    /// Replaces the non-trading days of `year` with `days`.
    ///
    /// Every date must fall in `year` and no date may appear twice.
    pub fn set_non_trading_days(
        &mut self,
        year: i32,
        days: impl IntoIterator<Item = NonTradingDay>,
    ) -> Result<(), CalendarError> {
        let mut days: Vec<NonTradingDay> = days.into_iter().collect();

        if let Some(day) = days.iter().find(|day| day.date.year() != year) {
            return Err(CalendarError::DateOutsideYear {
                date: day.date,
                year,
            });
        }

        days.sort_by_key(|day| day.date);
        if let Some(pair) = days.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(CalendarError::DuplicateDate { date: pair[0].date });
        }

        self.raise(CalendarEvent::NonTradingDaysSet(NonTradingDaysSetData {
            year,
            days,
        }));
        Ok(())
    }
}
