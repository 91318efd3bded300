use crate::error::RejectReason;
use crate::transaction::{Region, Transaction};

use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Optional narrowing applied to already-valid transactions. An empty
/// region set and absent bounds match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub regions: BTreeSet<Region>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.min_amount.is_none() && self.max_amount.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if !self.regions.is_empty() && !self.regions.contains(&tx.region) {
            return false;
        }
        if self.min_amount.is_some_and(|min| tx.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| tx.amount > max) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub transaction: Transaction,
    pub reasons: Vec<RejectReason>,
}

/// Every input transaction ends up in exactly one of `invalid`, `kept` or
/// `filtered_out`; `valid` is `kept` and `filtered_out` together, in input order.
#[derive(Debug, Default)]
pub struct Partition {
    pub valid: Vec<Transaction>,
    pub invalid: Vec<Rejected>,
    pub filtered_out: Vec<Transaction>,
    pub kept: Vec<Transaction>,
}

impl Partition {
    /// Distinct regions among the valid transactions.
    pub fn regions(&self) -> BTreeSet<Region> {
        self.valid.iter().map(|tx| tx.region.clone()).collect()
    }

    /// Smallest and largest amount among the valid transactions.
    pub fn amount_range(&self) -> Option<(Decimal, Decimal)> {
        let min = self.valid.iter().map(|tx| tx.amount).min()?;
        let max = self.valid.iter().map(|tx| tx.amount).max()?;
        Some((min, max))
    }
}

pub fn reject_reasons(tx: &Transaction) -> Vec<RejectReason> {
    let mut reasons = Vec::new();
    if tx.amount <= Decimal::ZERO {
        reasons.push(RejectReason::NonPositiveAmount);
    }
    if tx.quantity <= 0 {
        reasons.push(RejectReason::NonPositiveQuantity);
    }
    if !tx.region.is_known() {
        reasons.push(RejectReason::UnknownRegion);
    }
    reasons
}

pub fn validate_and_filter(transactions: &[Transaction], criteria: &FilterCriteria) -> Partition {
    let mut partition = Partition::default();

    for tx in transactions {
        let reasons = reject_reasons(tx);
        if !reasons.is_empty() {
            tracing::debug!(id = %tx.id, ?reasons, "Rejecting invalid transaction");
            partition.invalid.push(Rejected {
                transaction: tx.clone(),
                reasons,
            });
            continue;
        }

        partition.valid.push(tx.clone());
        if criteria.matches(tx) {
            partition.kept.push(tx.clone());
        } else {
            partition.filtered_out.push(tx.clone());
        }
    }

    partition
}
