//! Trading calendar domain events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// A date on which the exchange does not trade, and why.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NonTradingDay {
    pub date: NaiveDate,
    pub description: String,
}

impl NonTradingDay {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            date,
            description: description.into(),
        }
    }
}

/// Events that can occur on a trading calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CalendarEvent {
    /// The full list of non-trading days for one year, replacing any
    /// earlier list for that year.
    NonTradingDaysSet(NonTradingDaysSetData),
}

impl DomainEvent for CalendarEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CalendarEvent::NonTradingDaysSet(_) => "NonTradingDaysSet",
        }
    }
}

/// Data for NonTradingDaysSet event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonTradingDaysSetData {
    pub year: i32,

    /// Ordered by date.
    pub days: Vec<NonTradingDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let event = CalendarEvent::NonTradingDaysSet(NonTradingDaysSetData {
            year: 2024,
            days: vec![NonTradingDay::new(
                NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
                "Christmas Day",
            )],
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NonTradingDaysSet");
        assert_eq!(json["data"]["year"], 2024);
        assert_eq!(json["data"]["days"][0]["date"], "2024-12-25");
        assert_eq!(json["data"]["days"][0]["description"], "Christmas Day");
    }
}
