//! Domain layer for the portfolio event-sourcing core.
//!
//! This crate provides:
//! - the `Aggregate` contract: identity, version, uncommitted-event buffer
//!   and event application shared by every event-sourced entity
//! - the `Portfolio` aggregate (holdings, transactions, cost-base adjustments)
//! - the `TradingCalendar` aggregate (non-trading days per year)
//! - the `Repository` that rebuilds aggregates from, and persists them to,
//!   an event store

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod portfolio;
pub mod repository;

pub use aggregate::{Aggregate, AggregateRoot, DomainEvent, VersionedEvent};
pub use calendar::{CalendarError, CalendarEvent, NonTradingDay, TradingCalendar};
pub use error::DomainError;
pub use portfolio::{
    Holding, Money, OwnerId, Portfolio, PortfolioError, PortfolioEvent, StockCode, Trade,
    Transaction, TransactionId, TransactionKind,
};
pub use repository::Repository;
