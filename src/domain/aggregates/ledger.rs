//! Quantity Ledger

use std::collections::{HashMap, HashSet};
use serde::Serialize;
use thiserror::Error;
use crate::domain::aggregates::combination::CombinationSet;
use crate::domain::value_objects::{CombinationKey, RequestedQuantity};

/// A combination with a positive requested quantity
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub key: CombinationKey,
    pub quantity: u32,
}

/// Requested quantity per combination. An absent key means zero.
#[derive(Clone, Debug, Default)]
pub struct QuantityLedger {
    order: Vec<CombinationKey>,
    available: HashSet<CombinationKey>,
    quantities: HashMap<CombinationKey, u32>,
}

impl QuantityLedger {
    pub fn for_combinations(combinations: &CombinationSet) -> Self {
        Self {
            order: combinations.iter().map(|c| c.key.clone()).collect(),
            available: combinations.iter().filter(|c| c.is_available()).map(|c| c.key.clone()).collect(),
            quantities: HashMap::new(),
        }
    }

    /// Store a shopper's input and return the committed value.
    ///
    /// Input for an unavailable combination commits 0.
    pub fn set_quantity(
        &mut self,
        key: &CombinationKey,
        requested: impl Into<RequestedQuantity>,
    ) -> Result<u32, LedgerError> {
        if !self.order.contains(key) {
            return Err(LedgerError::UnknownCombination(key.to_string()));
        }
        let mut committed = requested.into().committed();
        if committed > 0 && !self.available.contains(key) {
            tracing::warn!(combination = %key, requested = committed, "quantity entered for unavailable combination");
            committed = 0;
        }
        if committed == 0 { self.quantities.remove(key); } else { self.quantities.insert(key.clone(), committed); }
        Ok(committed)
    }

    pub fn quantity(&self, key: &CombinationKey) -> u32 { self.quantities.get(key).copied().unwrap_or(0) }

    pub fn total(&self) -> u64 { self.quantities.values().map(|&q| u64::from(q)).sum() }

    pub fn is_empty(&self) -> bool { self.quantities.is_empty() }

    /// Positive entries in enumeration order, never insertion order.
    pub fn positive_entries(&self) -> Vec<LedgerEntry> {
        self.order
            .iter()
            .filter_map(|key| self.quantities.get(key).map(|&quantity| LedgerEntry { key: key.clone(), quantity }))
            .collect()
    }

    pub fn clear(&mut self) { self.quantities.clear(); }

    pub fn clear_keys<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a CombinationKey>,
    {
        for key in keys { self.quantities.remove(key); }
    }

    /// Re-point at a regenerated combination set, keeping quantities whose
    /// combination still exists and is still sellable.
    pub fn rebase(&mut self, combinations: &CombinationSet) {
        let mut next = Self::for_combinations(combinations);
        next.quantities = std::mem::take(&mut self.quantities)
            .into_iter()
            .filter(|(key, _)| next.available.contains(key))
            .collect();
        *self = next;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Unknown combination: {0}")]
    UnknownCombination(String),
}
