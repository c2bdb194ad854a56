//! Portfolio aggregate and related types.

mod aggregate;
mod events;
mod value_objects;

pub use aggregate::Portfolio;
pub use events::{CashAmountData, CostBaseAdjustmentData, PortfolioCreatedData, PortfolioEvent};
pub use value_objects::{
    Holding, Money, OwnerId, StockCode, Trade, Transaction, TransactionId, TransactionKind,
};

use rust_decimal::Decimal;
use thiserror::Error;

/// Validation errors raised by portfolio commands.
///
/// A command that returns one of these has raised no event.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Portfolio name must not be blank.
    #[error("Portfolio name is required")]
    NameRequired,

    /// Owner must be a real identity.
    #[error("Portfolio owner is required")]
    OwnerRequired,

    /// The command targets a portfolio that was never created.
    #[error("Portfolio has not been created")]
    NotCreated,

    #[error("Stock code is required")]
    StockCodeRequired,

    #[error("Transaction {0} has already been recorded")]
    DuplicateTransaction(TransactionId),

    #[error("Invalid unit count: {units} (must be greater than 0)")]
    InvalidUnits { units: u32 },

    /// A price or cost was negative.
    #[error("Invalid {field}: {amount} (must not be negative)")]
    NegativeAmount { field: &'static str, amount: Money },

    /// A cash amount was zero or negative.
    #[error("Invalid amount: {amount} (must be greater than 0)")]
    NonPositiveAmount { amount: Money },

    #[error("Invalid percentage: {percentage} (must be between 0 and 1)")]
    InvalidPercentage { percentage: Decimal },

    /// The result of the command would not fit in a holding's unit count
    /// or cents range.
    #[error("{field} of {stock} would exceed the supported range")]
    AmountOutOfRange {
        field: &'static str,
        stock: StockCode,
    },

    #[error("No holding in {stock}")]
    HoldingNotFound { stock: StockCode },

    #[error("Cannot dispose of {requested} units of {stock}: only {held} held")]
    InsufficientUnits {
        stock: StockCode,
        held: u32,
        requested: u32,
    },
}
