//! Value objects for the portfolio domain.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the user owning a portfolio.
///
/// Issued by the authentication collaborator and treated as opaque here.
/// The nil UUID stands for "no owner".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The empty identity, rejected by `Portfolio::create`.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OwnerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier of a transaction within a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exchange code of a listed security, stored upper-case (e.g. "BHP").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockCode(String);

impl StockCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for StockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StockCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StockCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Money amount represented in cents to avoid floating point issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Saturates at the bounds of the cents range.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars.saturating_mul(100),
        }
    }

    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a unit count, saturating at the bounds of the cents range.
    pub fn times(&self, units: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(units)),
        }
    }

    /// Multiplies by a unit count, or None on overflow.
    pub fn checked_times(&self, units: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(units))
            .map(Money::from_cents)
    }

    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Returns `numerator / denominator` of this amount, rounded toward zero.
    ///
    /// A zero denominator yields zero.
    pub fn share(&self, numerator: u32, denominator: u32) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let cents = i128::from(self.cents) * i128::from(numerator) / i128::from(denominator);
        Money {
            cents: i64::try_from(cents).unwrap_or(self.cents),
        }
    }

    /// Scales the amount by `factor`, rounding half away from zero to whole cents.
    pub fn scale(&self, factor: Decimal) -> Money {
        let scaled = (Decimal::from(self.cents) * factor)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money {
            cents: scaled.to_i64().unwrap_or(self.cents),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_sub(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents = self.cents.saturating_add(rhs.cents);
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents = self.cents.saturating_sub(rhs.cents);
    }
}

/// A buy or sell of a number of units at an average price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub stock: StockCode,
    pub units: u32,

    /// Average price paid or received per unit.
    pub unit_price: Money,

    /// Brokerage and other costs of the trade.
    pub costs: Money,

    #[serde(default)]
    pub comment: String,
}

impl Trade {
    pub fn new(
        date: NaiveDate,
        stock: impl Into<StockCode>,
        units: u32,
        unit_price: Money,
        costs: Money,
    ) -> Self {
        Self {
            transaction_id: TransactionId::new(),
            date,
            stock: stock.into(),
            units,
            unit_price,
            costs,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Units multiplied by the average price, before costs.
    pub fn consideration(&self) -> Money {
        self.unit_price.times(self.units)
    }

    /// Consideration plus costs, or None if it does not fit in the cents range.
    pub fn checked_total(&self) -> Option<Money> {
        self.unit_price
            .checked_times(self.units)?
            .checked_add(self.costs)
    }
}

/// A position in one stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub stock: StockCode,
    pub units: u32,
    pub cost_base: Money,

    /// Income received while holding the stock.
    pub income: Money,

    pub first_acquired: NaiveDate,
}

/// What a recorded transaction did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Acquisition {
        units: u32,
        unit_price: Money,
        costs: Money,
    },
    Disposal {
        units: u32,
        unit_price: Money,
        costs: Money,
    },
    CostBaseAdjustment {
        percentage: Decimal,
    },
    ReturnOfCapital {
        amount: Money,
    },
    Income {
        amount: Money,
    },
}

/// One entry in a portfolio's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub stock: StockCode,
    pub kind: TransactionKind,
    pub comment: String,
}
