//! Batched add-to-cart submission
//!
//! A shopper's selection becomes one cart mutation per combination, issued
//! strictly one after another. A failed item is recorded and the batch moves
//! on; only an empty selection or an entry that could never have been
//! submitted fails the whole call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::aggregates::combination::{Combination, CombinationSet};
use crate::domain::aggregates::ledger::LedgerEntry;
use crate::domain::value_objects::{CombinationKey, Sku};

/// Cart backend that accepts one line item at a time.
///
/// Implementations own their timeouts; the orchestrator awaits each call to
/// completion before issuing the next.
#[async_trait]
pub trait CartMutationPort: Send + Sync {
    async fn add_item(&self, sku: &Sku, quantity: u32, metadata: &LineItemMetadata) -> Result<(), ItemMutationFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ItemMutationFailure {
    pub reason: String,
}

impl ItemMutationFailure {
    pub fn new(reason: impl Into<String>) -> Self { Self { reason: reason.into() } }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoEntry {
    pub key: String,
    pub value: String,
}

impl InfoEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    #[serde(rename = "Home Delivery")]
    HomeDelivery,
    #[serde(rename = "Click & Collect")]
    ClickAndCollect,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupLocation {
    pub code: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub name: String,
    pub store_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseKind {
    #[default]
    OneTime,
    Subscription { offering_id: String, plan_id: String, pricing_option_id: String },
}

impl PurchaseKind {
    pub fn is_subscription(&self) -> bool { matches!(self, PurchaseKind::Subscription { .. }) }
}

/// Line-item payload passed through to the cart backend untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemMetadata {
    pub additional_information: Vec<InfoEntry>,
    pub options: Vec<String>,
    pub delivery_mode: Option<DeliveryMode>,
    pub location: Option<PickupLocation>,
    pub base_product_id: Option<String>,
    pub base_product_name: Option<String>,
    pub vendor_store_id: Option<String>,
    pub image_url: Option<String>,
    pub purchase: PurchaseKind,
}

/// Caller context shared by every line of one submission
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemContext {
    pub base_product_id: String,
    pub base_product_name: String,
    pub delivery_mode: Option<DeliveryMode>,
    pub location: Option<PickupLocation>,
    pub vendor: Option<Vendor>,
    pub custom_inputs: Vec<InfoEntry>,
    pub image_url: Option<String>,
    pub purchase: PurchaseKind,
}

impl LineItemContext {
    pub fn new(base_product_id: impl Into<String>, base_product_name: impl Into<String>) -> Self {
        Self { base_product_id: base_product_id.into(), base_product_name: base_product_name.into(), ..Self::default() }
    }

    pub fn metadata_for(&self, combination: &Combination) -> LineItemMetadata {
        let mut info = vec![InfoEntry::new("Variation", combination.title.as_str())];
        info.extend(self.custom_inputs.iter().filter(|i| !i.value.is_empty()).cloned());
        if let Some(vendor) = self.vendor.as_ref().filter(|v| !v.name.is_empty()) {
            info.push(InfoEntry::new("Fulfilled By", vendor.name.as_str()));
        }
        LineItemMetadata {
            additional_information: info,
            options: combination.option_labels.clone(),
            delivery_mode: self.delivery_mode,
            location: self.location.clone(),
            base_product_id: Some(self.base_product_id.clone()),
            base_product_name: Some(self.base_product_name.clone()),
            vendor_store_id: self.vendor.as_ref().and_then(|v| v.store_id.clone()),
            image_url: self.image_url.clone().filter(|_| self.purchase.is_subscription()),
            purchase: self.purchase.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub key: CombinationKey,
    pub title: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub succeeded: Vec<CombinationKey>,
    pub failures: Vec<ItemFailure>,
}

impl SubmissionOutcome {
    pub fn is_complete(&self) -> bool { self.failed_count == 0 }

    pub fn summary(&self) -> String {
        let n = self.succeeded_count;
        format!("Added {} item{} to cart", n, if n == 1 { "" } else { "s" })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Please select at least one item")]
    EmptySelection,

    #[error("Combination {0} is not part of this product")]
    UnknownCombination(String),

    #[error("Combination {0} has no SKU and cannot be submitted")]
    UnresolvedCombination(String),
}

/// Submit positive ledger entries one item at a time.
///
/// Every entry is resolved before the first call; nothing is sent when an
/// entry is missing from `combinations` or has no SKU.
pub async fn submit<P>(
    entries: &[LedgerEntry],
    combinations: &CombinationSet,
    port: &P,
    context: &LineItemContext,
) -> Result<SubmissionOutcome, SubmissionError>
where
    P: CartMutationPort + ?Sized,
{
    let mut plan = Vec::with_capacity(entries.len());
    for entry in entries.iter().filter(|e| e.quantity > 0) {
        let combination = combinations.get(&entry.key).ok_or_else(|| {
            tracing::error!(combination = %entry.key, "submitted combination is not part of the product");
            SubmissionError::UnknownCombination(entry.key.to_string())
        })?;
        let sku = combination.resolved_sku.as_ref().ok_or_else(|| {
            tracing::error!(combination = %entry.key, "unavailable combination reached submission");
            SubmissionError::UnresolvedCombination(entry.key.to_string())
        })?;
        plan.push((entry, combination, sku));
    }
    if plan.is_empty() { return Err(SubmissionError::EmptySelection); }

    let total = plan.len();
    tracing::info!(product = %context.base_product_id, items = total, "adding variation selection to cart");

    let mut outcome = SubmissionOutcome::default();
    for (i, (entry, combination, sku)) in plan.into_iter().enumerate() {
        let metadata = context.metadata_for(combination);
        match port.add_item(sku, entry.quantity, &metadata).await {
            Ok(()) => {
                tracing::info!(item = i + 1, of = total, sku = %sku, quantity = entry.quantity, "item added");
                outcome.succeeded_count += 1;
                outcome.succeeded.push(entry.key.clone());
            }
            Err(failure) => {
                tracing::warn!(item = i + 1, of = total, sku = %sku, reason = %failure.reason, "item rejected");
                outcome.failed_count += 1;
                outcome.failures.push(ItemFailure {
                    key: entry.key.clone(),
                    title: combination.title.clone(),
                    reason: failure.reason,
                });
            }
        }
    }

    tracing::info!(succeeded = outcome.succeeded_count, failed = outcome.failed_count, "variation selection submitted");
    Ok(outcome)
}
