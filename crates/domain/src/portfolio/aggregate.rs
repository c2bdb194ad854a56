//! Portfolio aggregate implementation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use common::AggregateId;
use rust_decimal::Decimal;

use crate::aggregate::{Aggregate, AggregateRoot};

use super::{
    CashAmountData, CostBaseAdjustmentData, Holding, Money, OwnerId, PortfolioCreatedData,
    PortfolioError, PortfolioEvent, StockCode, Trade, Transaction, TransactionId, TransactionKind,
};

/// Portfolio aggregate root.
///
/// An owner's named collection of holdings, together with the history of
/// transactions that produced them.
#[derive(Debug, Clone)]
pub struct Portfolio {
    root: AggregateRoot<PortfolioEvent>,
    name: String,
    owner: Option<OwnerId>,
    holdings: BTreeMap<StockCode, Holding>,
    transactions: Vec<Transaction>,
}

impl Aggregate for Portfolio {
    type Event = PortfolioEvent;
    type Error = PortfolioError;

    fn aggregate_type() -> &'static str {
        "Portfolio"
    }

    fn new(id: AggregateId) -> Self {
        Self {
            root: AggregateRoot::new(id),
            name: String::new(),
            owner: None,
            holdings: BTreeMap::new(),
            transactions: Vec::new(),
        }
    }

    fn root(&self) -> &AggregateRoot<PortfolioEvent> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<PortfolioEvent> {
        &mut self.root
    }

    fn mutate(&mut self, event: &PortfolioEvent) {
        match event {
            PortfolioEvent::PortfolioCreated(data) => self.apply_created(data),
            PortfolioEvent::AcquisitionRecorded(trade) => self.apply_acquisition(trade),
            PortfolioEvent::DisposalRecorded(trade) => self.apply_disposal(trade),
            PortfolioEvent::CostBaseAdjusted(data) => self.apply_cost_base_adjustment(data),
            PortfolioEvent::ReturnOfCapitalRecorded(data) => self.apply_return_of_capital(data),
            PortfolioEvent::IncomeReceived(data) => self.apply_income(data),
        }
    }
}

// Query methods
impl Portfolio {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owner, or None before the portfolio is created.
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn is_created(&self) -> bool {
        self.owner.is_some()
    }

    /// Returns current holdings ordered by stock code.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn holding(&self, stock: &StockCode) -> Option<&Holding> {
        self.holdings.get(stock)
    }

    /// Returns every recorded transaction in the order it was recorded.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Sum of the cost bases of all current holdings.
    pub fn total_cost_base(&self) -> Money {
        self.holdings
            .values()
            .fold(Money::zero(), |total, h| total + h.cost_base)
    }
}

// Command methods (validate, then raise)
impl Portfolio {
    /// Creates a new portfolio, raising its version-1 event.
    pub fn create(
        id: AggregateId,
        name: impl Into<String>,
        owner: OwnerId,
    ) -> Result<Self, PortfolioError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PortfolioError::NameRequired);
        }
        if owner.is_nil() {
            return Err(PortfolioError::OwnerRequired);
        }

        let mut portfolio = <Self as Aggregate>::new(id);
        portfolio.raise(PortfolioEvent::PortfolioCreated(PortfolioCreatedData {
            name,
            owner,
        }));
        Ok(portfolio)
    }

    /// Records a purchase of units.
    pub fn record_acquisition(&mut self, trade: Trade) -> Result<(), PortfolioError> {
        self.validate_trade(&trade)?;
        self.validate_acquisition_fits(&trade)?;
        self.raise(PortfolioEvent::AcquisitionRecorded(trade));
        Ok(())
    }

    /// Records a sale of units from an existing holding.
    pub fn record_disposal(&mut self, trade: Trade) -> Result<(), PortfolioError> {
        self.validate_trade(&trade)?;

        let holding = self.existing_holding(&trade.stock)?;
        if holding.units < trade.units {
            return Err(PortfolioError::InsufficientUnits {
                stock: trade.stock.clone(),
                held: holding.units,
                requested: trade.units,
            });
        }

        self.raise(PortfolioEvent::DisposalRecorded(trade));
        Ok(())
    }

    /// Scales the cost base of a holding to `percentage` of its current value.
    ///
    /// The adjustment is recorded even when nothing is currently held in
    /// `stock`; it then only appears in the transaction history.
    pub fn adjust_cost_base(
        &mut self,
        transaction_id: TransactionId,
        date: NaiveDate,
        stock: impl Into<StockCode>,
        percentage: Decimal,
        comment: impl Into<String>,
    ) -> Result<(), PortfolioError> {
        let stock = stock.into();
        self.validate_transaction(transaction_id, &stock)?;

        if percentage < Decimal::ZERO || percentage > Decimal::ONE {
            return Err(PortfolioError::InvalidPercentage { percentage });
        }

        self.raise(PortfolioEvent::CostBaseAdjusted(CostBaseAdjustmentData {
            transaction_id,
            date,
            stock,
            percentage,
            comment: comment.into(),
        }));
        Ok(())
    }

    /// Records capital returned on a holding.
    pub fn record_return_of_capital(
        &mut self,
        transaction_id: TransactionId,
        date: NaiveDate,
        stock: impl Into<StockCode>,
        amount: Money,
        comment: impl Into<String>,
    ) -> Result<(), PortfolioError> {
        let data = self.validate_cash_amount(transaction_id, date, stock.into(), amount, comment)?;
        self.raise(PortfolioEvent::ReturnOfCapitalRecorded(data));
        Ok(())
    }

    /// Records income (dividends, distributions) received on a holding.
    pub fn record_income(
        &mut self,
        transaction_id: TransactionId,
        date: NaiveDate,
        stock: impl Into<StockCode>,
        amount: Money,
        comment: impl Into<String>,
    ) -> Result<(), PortfolioError> {
        let data = self.validate_cash_amount(transaction_id, date, stock.into(), amount, comment)?;
        let holding = self.existing_holding(&data.stock)?;
        if holding.income.checked_add(data.amount).is_none() {
            return Err(PortfolioError::AmountOutOfRange {
                field: "income",
                stock: data.stock,
            });
        }
        self.raise(PortfolioEvent::IncomeReceived(data));
        Ok(())
    }
}

// Validation helpers
impl Portfolio {
    fn validate_transaction(
        &self,
        transaction_id: TransactionId,
        stock: &StockCode,
    ) -> Result<(), PortfolioError> {
        if !self.is_created() {
            return Err(PortfolioError::NotCreated);
        }
        if stock.is_empty() {
            return Err(PortfolioError::StockCodeRequired);
        }
        if self.transaction(transaction_id).is_some() {
            return Err(PortfolioError::DuplicateTransaction(transaction_id));
        }
        Ok(())
    }

    fn validate_trade(&self, trade: &Trade) -> Result<(), PortfolioError> {
        self.validate_transaction(trade.transaction_id, &trade.stock)?;

        if trade.units == 0 {
            return Err(PortfolioError::InvalidUnits { units: trade.units });
        }
        if trade.unit_price.is_negative() {
            return Err(PortfolioError::NegativeAmount {
                field: "unit price",
                amount: trade.unit_price,
            });
        }
        if trade.costs.is_negative() {
            return Err(PortfolioError::NegativeAmount {
                field: "costs",
                amount: trade.costs,
            });
        }
        Ok(())
    }

    /// Checks that adding `trade` to its holding keeps units and cost base
    /// in range.
    fn validate_acquisition_fits(&self, trade: &Trade) -> Result<(), PortfolioError> {
        let out_of_range = |field| PortfolioError::AmountOutOfRange {
            field,
            stock: trade.stock.clone(),
        };
        let (units, cost_base) = self
            .holdings
            .get(&trade.stock)
            .map_or((0, Money::zero()), |h| (h.units, h.cost_base));

        units
            .checked_add(trade.units)
            .ok_or_else(|| out_of_range("units"))?;
        trade
            .checked_total()
            .and_then(|total| cost_base.checked_add(total))
            .ok_or_else(|| out_of_range("cost base"))?;
        Ok(())
    }

    fn validate_cash_amount(
        &self,
        transaction_id: TransactionId,
        date: NaiveDate,
        stock: StockCode,
        amount: Money,
        comment: impl Into<String>,
    ) -> Result<CashAmountData, PortfolioError> {
        self.validate_transaction(transaction_id, &stock)?;
        self.existing_holding(&stock)?;

        if !amount.is_positive() {
            return Err(PortfolioError::NonPositiveAmount { amount });
        }

        Ok(CashAmountData {
            transaction_id,
            date,
            stock,
            amount,
            comment: comment.into(),
        })
    }

    fn existing_holding(&self, stock: &StockCode) -> Result<&Holding, PortfolioError> {
        self.holdings
            .get(stock)
            .ok_or_else(|| PortfolioError::HoldingNotFound {
                stock: stock.clone(),
            })
    }
}

// Apply event helpers
impl Portfolio {
    fn apply_created(&mut self, data: &PortfolioCreatedData) {
        self.name = data.name.clone();
        self.owner = Some(data.owner);
        self.holdings.clear();
        self.transactions.clear();
    }

    fn apply_acquisition(&mut self, trade: &Trade) {
        let holding = self
            .holdings
            .entry(trade.stock.clone())
            .or_insert_with(|| Holding {
                stock: trade.stock.clone(),
                units: 0,
                cost_base: Money::zero(),
                income: Money::zero(),
                first_acquired: trade.date,
            });
        holding.units = holding.units.saturating_add(trade.units);
        holding.cost_base += trade.consideration() + trade.costs;

        self.record_trade(trade, |t| TransactionKind::Acquisition {
            units: t.units,
            unit_price: t.unit_price,
            costs: t.costs,
        });
    }

    fn apply_disposal(&mut self, trade: &Trade) {
        if let Some(holding) = self.holdings.get_mut(&trade.stock) {
            // Cost base leaves the holding in proportion to the units sold.
            let released = holding.cost_base.share(trade.units, holding.units);
            holding.cost_base -= released;
            holding.units = holding.units.saturating_sub(trade.units);

            if holding.units == 0 {
                self.holdings.remove(&trade.stock);
            }
        }

        self.record_trade(trade, |t| TransactionKind::Disposal {
            units: t.units,
            unit_price: t.unit_price,
            costs: t.costs,
        });
    }

    fn apply_cost_base_adjustment(&mut self, data: &CostBaseAdjustmentData) {
        if let Some(holding) = self.holdings.get_mut(&data.stock) {
            holding.cost_base = holding.cost_base.scale(data.percentage);
        }

        self.transactions.push(Transaction {
            id: data.transaction_id,
            date: data.date,
            stock: data.stock.clone(),
            kind: TransactionKind::CostBaseAdjustment {
                percentage: data.percentage,
            },
            comment: data.comment.clone(),
        });
    }

    fn apply_return_of_capital(&mut self, data: &CashAmountData) {
        if let Some(holding) = self.holdings.get_mut(&data.stock) {
            let reduction = data.amount.min(holding.cost_base);
            holding.cost_base -= reduction;
        }

        self.record_cash(data, TransactionKind::ReturnOfCapital {
            amount: data.amount,
        });
    }

    fn apply_income(&mut self, data: &CashAmountData) {
        if let Some(holding) = self.holdings.get_mut(&data.stock) {
            holding.income += data.amount;
        }

        self.record_cash(data, TransactionKind::Income {
            amount: data.amount,
        });
    }

    fn record_trade(&mut self, trade: &Trade, kind: impl FnOnce(&Trade) -> TransactionKind) {
        self.transactions.push(Transaction {
            id: trade.transaction_id,
            date: trade.date,
            stock: trade.stock.clone(),
            kind: kind(trade),
            comment: trade.comment.clone(),
        });
    }

    fn record_cash(&mut self, data: &CashAmountData, kind: TransactionKind) {
        self.transactions.push(Transaction {
            id: data.transaction_id,
            date: data.date,
            stock: data.stock.clone(),
            kind,
            comment: data.comment.clone(),
        });
    }
}
