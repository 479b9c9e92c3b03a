//! Variation product aggregate: one per product view

use chrono::Utc;
use serde::Serialize;
use crate::domain::aggregates::combination::{Combination, CombinationSet};
use crate::domain::aggregates::ledger::{LedgerError, QuantityLedger};
use crate::domain::aggregates::submission::{self, CartMutationPort, LineItemContext, SubmissionError, SubmissionOutcome};
use crate::domain::aggregates::variation::{CombinationMatrix, VariationAxis};
use crate::domain::events::{ConfiguratorEvent, DomainEvent, SubmissionEvent};
use crate::domain::value_objects::{CombinationKey, RequestedQuantity};

/// A combination the shopper has asked for
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectedCombination {
    pub combination: Combination,
    pub quantity: u32,
}

pub type QuantityListener = Box<dyn Fn(&[SelectedCombination]) + Send + Sync>;

pub struct VariationProduct {
    id: String,
    name: String,
    axes: Vec<VariationAxis>,
    matrix: CombinationMatrix,
    combinations: CombinationSet,
    ledger: QuantityLedger,
    listener: Option<QuantityListener>,
    events: Vec<DomainEvent>,
}

impl VariationProduct {
    pub fn load(id: impl Into<String>, name: impl Into<String>, axes: Vec<VariationAxis>, matrix: CombinationMatrix) -> Self {
        let combinations = CombinationSet::enumerate(&axes, &matrix);
        let ledger = QuantityLedger::for_combinations(&combinations);
        Self { id: id.into(), name: name.into(), axes, matrix, combinations, ledger, listener: None, events: vec![] }
    }

    /// Replace catalog data; the combination set is rebuilt, not patched.
    pub fn reload(&mut self, axes: Vec<VariationAxis>, matrix: CombinationMatrix) {
        self.combinations = CombinationSet::enumerate(&axes, &matrix);
        self.ledger.rebase(&self.combinations);
        self.axes = axes;
        self.matrix = matrix;
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn axes(&self) -> &[VariationAxis] { &self.axes }
    pub fn matrix(&self) -> &CombinationMatrix { &self.matrix }
    pub fn combinations(&self) -> &CombinationSet { &self.combinations }
    pub fn total_quantity(&self) -> u64 { self.ledger.total() }

    pub fn on_quantities_changed(&mut self, listener: impl Fn(&[SelectedCombination]) + Send + Sync + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn set_quantity(&mut self, key: &CombinationKey, requested: impl Into<RequestedQuantity>) -> Result<u32, LedgerError> {
        let changed = self.apply(key, requested.into())?;
        self.notify(changed);
        Ok(self.ledger.quantity(key))
    }

    /// Apply several edits as one change: a single event and listener call.
    pub fn set_quantities<'a, I>(&mut self, edits: I) -> Result<u64, LedgerError>
    where
        I: IntoIterator<Item = (&'a CombinationKey, RequestedQuantity)>,
    {
        let mut changed = false;
        for (key, requested) in edits {
            changed |= self.apply(key, requested)?;
        }
        self.notify(changed);
        Ok(self.ledger.total())
    }

    fn apply(&mut self, key: &CombinationKey, requested: RequestedQuantity) -> Result<bool, LedgerError> {
        let before = self.ledger.quantity(key);
        Ok(self.ledger.set_quantity(key, requested)? != before)
    }

    fn notify(&mut self, changed: bool) {
        if changed {
            let total = self.ledger.total();
            self.raise_event(DomainEvent::Configurator(ConfiguratorEvent::QuantitiesChanged { product_id: self.id.clone(), total }));
        }
        if let Some(listener) = &self.listener {
            listener(&self.selection());
        }
    }

    /// Positive selections in enumeration order.
    pub fn selection(&self) -> Vec<SelectedCombination> {
        self.ledger
            .positive_entries()
            .into_iter()
            .filter_map(|entry| {
                self.combinations
                    .get(&entry.key)
                    .map(|c| SelectedCombination { combination: c.clone(), quantity: entry.quantity })
            })
            .collect()
    }

    /// Submit the selection and keep only the entries that failed.
    pub async fn submit<P>(&mut self, port: &P, context: &LineItemContext) -> Result<SubmissionOutcome, SubmissionError>
    where
        P: CartMutationPort + ?Sized,
    {
        let entries = self.ledger.positive_entries();
        let outcome = submission::submit(&entries, &self.combinations, port, context).await?;
        if outcome.is_complete() {
            self.ledger.clear();
        } else {
            self.ledger.clear_keys(&outcome.succeeded);
        }
        self.raise_event(DomainEvent::Submission(SubmissionEvent::Completed {
            product_id: self.id.clone(),
            succeeded: outcome.succeeded_count,
            failed: outcome.failed_count,
            at: Utc::now(),
        }));
        Ok(outcome)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

impl std::fmt::Debug for VariationProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariationProduct")
            .field("id", &self.id)
            .field("axes", &self.axes.len())
            .field("combinations", &self.combinations.len())
            .field("total_quantity", &self.ledger.total())
            .finish()
    }
}
