//! OpenSASE Variation Configurator
//!
//! Grid-style ordering for products sold in variations (size, color, ...).
//!
//! ## Features
//! - Combination enumeration over any number of variation axes
//! - Canonical combination keys shared by catalog matrix, grid and cart
//! - Per-combination quantity ledger with clamped input
//! - Sequential multi-item add-to-cart with partial-failure reporting
//! - Cart grouping by delivery method and base product

pub mod config;
pub mod domain;
pub mod infrastructure;

use thiserror::Error;

pub use config::{AppConfig, ConfigError};
pub use domain::aggregates::{
    CartMutationPort, Combination, CombinationMatrix, CombinationSet, LineItemContext, QuantityLedger,
    SubmissionOutcome, VariationAxis, VariationOption, VariationProduct,
};
pub use domain::value_objects::{CombinationKey, RequestedQuantity, Sku};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfiguratorError {
    #[error("Product not found")]
    ProductNotFound,

    #[error(transparent)]
    Matrix(#[from] domain::aggregates::MatrixError),

    #[error(transparent)]
    Ledger(#[from] domain::aggregates::LedgerError),

    #[error(transparent)]
    Submission(#[from] domain::aggregates::SubmissionError),

    #[error("Invalid catalog data: {0}")]
    Catalog(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<sqlx::Error> for ConfiguratorError {
    fn from(e: sqlx::Error) -> Self {
        ConfiguratorError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for ConfiguratorError {
    fn from(e: serde_json::Error) -> Self {
        ConfiguratorError::Catalog(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfiguratorError>;
