//! Variation axes and the combination matrix

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::value_objects::{AxisId, CombinationKey, OptionId, Sku, SkuError};

/// One selectable value on an axis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationOption {
    pub id: OptionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl VariationOption {
    pub fn new(id: impl Into<OptionId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), description: String::new() }
    }

    /// Display label; the catalog puts the shopper-facing text in `description`.
    pub fn label(&self) -> &str {
        if self.description.trim().is_empty() { &self.name } else { &self.description }
    }
}

/// One dimension of product configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationAxis {
    pub id: AxisId,
    pub name: String,
    #[serde(default)]
    pub options: Vec<VariationOption>,
}

impl VariationAxis {
    pub fn new(id: impl Into<AxisId>, name: impl Into<String>, options: Vec<VariationOption>) -> Self {
        Self { id: id.into(), name: name.into(), options }
    }

    pub fn option(&self, id: &OptionId) -> Option<&VariationOption> {
        self.options.iter().find(|o| &o.id == id)
    }

    pub fn has_option(&self, id: &OptionId) -> bool { self.option(id).is_some() }
}

/// Read-only mapping from combination key to the SKU that sells it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombinationMatrix {
    entries: HashMap<CombinationKey, Sku>,
}

impl CombinationMatrix {
    pub fn new() -> Self { Self::default() }

    /// Build from `(option ids, sku)` pairs; ids may come in any order.
    pub fn from_entries<I>(axes: &[VariationAxis], entries: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = (Vec<OptionId>, Sku)>,
    {
        let mut matrix = Self::new();
        for (ids, sku) in entries {
            let key = canonical_key(axes, &ids)?;
            matrix.entries.insert(key, sku);
        }
        Ok(matrix)
    }

    /// Flatten the catalog's nested matrix (`{"red": {"m": "child-id"}}`).
    ///
    /// Nesting depth must equal the axis count. Levels may nest axes in any
    /// order; each path is assigned back to the axes before keying. A `null`
    /// leaf marks a combination that is not sold.
    pub fn from_nested(axes: &[VariationAxis], value: &serde_json::Value) -> Result<Self, MatrixError> {
        let mut matrix = Self::new();
        if axes.is_empty() { return Ok(matrix); }
        let mut path = Vec::with_capacity(axes.len());
        flatten(axes, value, axes.len(), &mut path, &mut matrix.entries)?;
        Ok(matrix)
    }

    pub fn resolve(&self, key: &CombinationKey) -> Option<&Sku> { self.entries.get(key) }

    /// SKU for a set of option ids given in any order.
    pub fn sku_for_options(&self, axes: &[VariationAxis], option_ids: &[OptionId]) -> Option<&Sku> {
        resolve_options(axes, option_ids).and_then(|key| self.resolve(&key))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

fn canonical_key(axes: &[VariationAxis], ids: &[OptionId]) -> Result<CombinationKey, MatrixError> {
    resolve_options(axes, ids).ok_or_else(|| MatrixError::UnmatchedOptions {
        path: ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join("/"),
    })
}

fn flatten(
    axes: &[VariationAxis],
    value: &serde_json::Value,
    remaining: usize,
    path: &mut Vec<OptionId>,
    entries: &mut HashMap<CombinationKey, Sku>,
) -> Result<(), MatrixError> {
    match value {
        serde_json::Value::Null => Ok(()),
        serde_json::Value::String(sku) if remaining == 0 => {
            let key = canonical_key(axes, path)?;
            let sku = Sku::new(sku.as_str()).map_err(|source| MatrixError::InvalidSku { key: key.to_string(), source })?;
            entries.insert(key, sku);
            Ok(())
        }
        serde_json::Value::Object(map) if remaining > 0 => {
            for (option_id, child) in map {
                path.push(OptionId::new(option_id.as_str()));
                let result = flatten(axes, child, remaining - 1, path, entries);
                path.pop();
                result?;
            }
            Ok(())
        }
        _ => Err(MatrixError::DepthMismatch {
            path: path.iter().map(|id| id.to_string()).collect::<Vec<_>>().join("/"),
            expected: path.len() + remaining,
        }),
    }
}

/// Canonical key for a set of option ids supplied in any order.
///
/// Each id is assigned to an axis that offers it, exactly one per axis. Ids can
/// repeat across axes, so assignment backtracks instead of taking the first fit.
pub fn resolve_options(axes: &[VariationAxis], option_ids: &[OptionId]) -> Option<CombinationKey> {
    if axes.is_empty() || option_ids.len() != axes.len() { return None; }
    let mut used = vec![false; option_ids.len()];
    let mut chosen: Vec<&OptionId> = Vec::with_capacity(axes.len());
    if assign(axes, option_ids, &mut used, &mut chosen) {
        Some(CombinationKey::from_option_ids(chosen))
    } else {
        None
    }
}

fn assign<'a>(
    axes: &[VariationAxis],
    option_ids: &'a [OptionId],
    used: &mut [bool],
    chosen: &mut Vec<&'a OptionId>,
) -> bool {
    let Some(axis) = axes.get(chosen.len()) else { return true };
    for (i, id) in option_ids.iter().enumerate() {
        if used[i] || !axis.has_option(id) { continue; }
        used[i] = true;
        chosen.push(id);
        if assign(axes, option_ids, used, chosen) { return true; }
        chosen.pop();
        used[i] = false;
    }
    false
}

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("Variation matrix depth mismatch at '{path}': expected {expected} levels")]
    DepthMismatch { path: String, expected: usize },

    #[error("Variation matrix path '{path}' does not pick one option per axis")]
    UnmatchedOptions { path: String },

    #[error("Invalid SKU for combination '{key}': {source}")]
    InvalidSku { key: String, #[source] source: SkuError },
}
