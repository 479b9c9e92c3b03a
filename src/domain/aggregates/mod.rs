//! Aggregates module
pub mod variation;
pub mod combination;
pub mod ledger;
pub mod submission;
pub mod product;
pub mod cart;

pub use variation::{resolve_options, CombinationMatrix, MatrixError, VariationAxis, VariationOption};
pub use combination::{Combination, CombinationSet, GridView};
pub use ledger::{LedgerEntry, LedgerError, QuantityLedger};
pub use submission::{
    submit, CartMutationPort, DeliveryMode, InfoEntry, ItemFailure, ItemMutationFailure, LineItemContext,
    LineItemMetadata, PickupLocation, PurchaseKind, SubmissionError, SubmissionOutcome, Vendor,
};
pub use product::{QuantityListener, SelectedCombination, VariationProduct};
pub use cart::{group_cart_lines, BaseProductGroup, CartLine, GroupedCartLines};
