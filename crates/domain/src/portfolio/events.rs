//! Portfolio domain events.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Money, OwnerId, StockCode, Trade, TransactionId};

/// Events that can occur on a portfolio aggregate.
///
/// Each kind of transaction is its own variant so that replay dispatches to
/// a dedicated handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PortfolioEvent {
    /// Portfolio was created.
    PortfolioCreated(PortfolioCreatedData),

    /// Units of a stock were bought.
    AcquisitionRecorded(Trade),

    /// Units of a stock were sold.
    DisposalRecorded(Trade),

    /// The cost base of a holding was scaled by a percentage.
    CostBaseAdjusted(CostBaseAdjustmentData),

    /// Capital was returned, reducing the cost base of a holding.
    ReturnOfCapitalRecorded(CashAmountData),

    /// A dividend or distribution was received for a holding.
    IncomeReceived(CashAmountData),
}

impl DomainEvent for PortfolioEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PortfolioEvent::PortfolioCreated(_) => "PortfolioCreated",
            PortfolioEvent::AcquisitionRecorded(_) => "AcquisitionRecorded",
            PortfolioEvent::DisposalRecorded(_) => "DisposalRecorded",
            PortfolioEvent::CostBaseAdjusted(_) => "CostBaseAdjusted",
            PortfolioEvent::ReturnOfCapitalRecorded(_) => "ReturnOfCapitalRecorded",
            PortfolioEvent::IncomeReceived(_) => "IncomeReceived",
        }
    }
}

/// Data for PortfolioCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioCreatedData {
    pub name: String,
    pub owner: OwnerId,
}

/// Data for CostBaseAdjusted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBaseAdjustmentData {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub stock: StockCode,

    /// Fraction of the current cost base that remains, between 0 and 1.
    pub percentage: Decimal,

    #[serde(default)]
    pub comment: String,
}

/// Data for events that move a cash amount against a holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAmountData {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub stock: StockCode,
    pub amount: Money,

    #[serde(default)]
    pub comment: String,
}
