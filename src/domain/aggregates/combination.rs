//! Combination enumeration

use std::collections::HashMap;
use serde::Serialize;
use crate::domain::aggregates::variation::{CombinationMatrix, VariationAxis, VariationOption};
use crate::domain::value_objects::{CombinationKey, OptionId, Sku};

/// One concrete selection of exactly one option per axis
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Combination {
    pub key: CombinationKey,
    pub option_ids: Vec<OptionId>,
    pub option_labels: Vec<String>,
    /// "Color: Red / Size: M"
    pub title: String,
    pub resolved_sku: Option<Sku>,
}

impl Combination {
    fn build(axes: &[VariationAxis], picks: &[&VariationOption], matrix: &CombinationMatrix) -> Self {
        let option_ids: Vec<OptionId> = picks.iter().map(|o| o.id.clone()).collect();
        let option_labels: Vec<String> = picks.iter().map(|o| o.label().to_string()).collect();
        let title = axes
            .iter()
            .zip(&option_labels)
            .map(|(axis, label)| format!("{}: {}", axis.name, label))
            .collect::<Vec<_>>()
            .join(" / ");
        let key = CombinationKey::from_option_ids(&option_ids);
        let resolved_sku = matrix.resolve(&key).cloned();
        Self { key, option_ids, option_labels, title, resolved_sku }
    }

    /// Unavailable combinations stay listed but take no quantity.
    pub fn is_available(&self) -> bool { self.resolved_sku.is_some() }
}

/// Every combination of a product, in enumeration order
#[derive(Clone, Debug, Default)]
pub struct CombinationSet {
    items: Vec<Combination>,
    index: HashMap<CombinationKey, usize>,
    /// Option count per axis, kept for the two-axis grid.
    shape: Vec<usize>,
}

impl CombinationSet {
    /// Cartesian product of the axes' options, last axis varying fastest.
    ///
    /// No axes, or any axis without options, yields an empty set.
    pub fn enumerate(axes: &[VariationAxis], matrix: &CombinationMatrix) -> Self {
        let shape: Vec<usize> = axes.iter().map(|a| a.options.len()).collect();
        if shape.is_empty() || shape.contains(&0) {
            return Self { shape, ..Self::default() };
        }

        let total: usize = shape.iter().product();
        let mut items = Vec::with_capacity(total);
        let mut cursor = vec![0usize; axes.len()];
        loop {
            let picks: Vec<&VariationOption> =
                axes.iter().zip(&cursor).map(|(axis, &i)| &axis.options[i]).collect();
            items.push(Combination::build(axes, &picks, matrix));

            // odometer step from the last axis
            let mut axis = axes.len();
            loop {
                if axis == 0 { return Self::from_items(items, shape); }
                axis -= 1;
                cursor[axis] += 1;
                if cursor[axis] < shape[axis] { break; }
                cursor[axis] = 0;
            }
        }
    }

    fn from_items(items: Vec<Combination>, shape: Vec<usize>) -> Self {
        let index = items.iter().enumerate().map(|(i, c)| (c.key.clone(), i)).collect();
        Self { items, index, shape }
    }

    pub fn get(&self, key: &CombinationKey) -> Option<&Combination> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combination> { self.items.iter() }
    pub fn as_slice(&self) -> &[Combination] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn available_count(&self) -> usize { self.items.iter().filter(|c| c.is_available()).count() }

    /// Row x column view for two-axis products.
    pub fn grid(&self) -> Option<GridView<'_>> {
        match self.shape.as_slice() {
            [rows, columns] if !self.items.is_empty() => Some(GridView { set: self, rows: *rows, columns: *columns }),
            _ => None,
        }
    }
}

/// Table over a two-axis combination set; cells share keys with the flat set.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    set: &'a CombinationSet,
    rows: usize,
    columns: usize,
}

impl<'a> GridView<'a> {
    pub fn rows(&self) -> usize { self.rows }
    pub fn columns(&self) -> usize { self.columns }

    pub fn cell(&self, row: usize, column: usize) -> Option<&'a Combination> {
        if row >= self.rows || column >= self.columns { return None; }
        self.set.items.get(row * self.columns + column)
    }

    pub fn row(&self, row: usize) -> &'a [Combination] {
        if row >= self.rows { return &[]; }
        &self.set.items[row * self.columns..(row + 1) * self.columns]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn axis(id: &str, options: &[&str]) -> VariationAxis {
        VariationAxis::new(id, id.to_uppercase(), options.iter().map(|o| VariationOption::new(*o, *o)).collect())
    }

    fn sku(s: &str) -> Sku { Sku::new(s).unwrap() }

    #[test]
    fn test_single_axis_is_options() {
        let axes = vec![axis("size", &["s", "m"])];
        let matrix = CombinationMatrix::from_entries(&axes, [
            (vec!["s".into()], sku("SKU1")),
            (vec!["m".into()], sku("SKU2")),
        ]).unwrap();
        let set = CombinationSet::enumerate(&axes, &matrix);
        assert_eq!(set.len(), 2);
        assert_eq!(set.available_count(), 2);
        assert_eq!(set.as_slice()[0].title, "SIZE: s");
        assert!(set.grid().is_none());
    }

    #[test]
    fn test_product_of_option_counts_with_unique_keys() {
        let axes = vec![axis("a", &["1", "2", "3"]), axis("b", &["x", "y"]), axis("c", &["p", "q", "r", "s"])];
        let set = CombinationSet::enumerate(&axes, &CombinationMatrix::new());
        assert_eq!(set.len(), 24);
        let keys: HashSet<_> = set.iter().map(|c| c.key.clone()).collect();
        assert_eq!(keys.len(), 24);
        assert_eq!(set.available_count(), 0);
        assert_eq!(set.as_slice()[0].key.as_str(), "1|x|p");
        assert_eq!(set.as_slice()[1].key.as_str(), "1|x|q");
    }

    #[test]
    fn test_missing_entry_is_listed_but_unavailable() {
        let axes = vec![axis("color", &["red", "blue"]), axis("size", &["s", "m"])];
        let matrix = CombinationMatrix::from_entries(&axes, [
            (vec!["red".into(), "s".into()], sku("RS")),
            (vec!["m".into(), "red".into()], sku("RM")),
            (vec!["s".into(), "blue".into()], sku("BS")),
        ]).unwrap();
        let set = CombinationSet::enumerate(&axes, &matrix);
        assert_eq!(set.len(), 4);
        assert_eq!(set.available_count(), 3);
        assert_eq!(set.get(&"blue|s".into()).and_then(|c| c.resolved_sku.as_ref()).map(Sku::as_str), Some("BS"));
        let blue_m = set.get(&"blue|m".into()).unwrap();
        assert!(!blue_m.is_available());
        assert_eq!(blue_m.option_labels, vec!["blue", "m"]);
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let axes = vec![axis("color", &["red", "blue"]), axis("size", &["s", "m"])];
        let matrix = CombinationMatrix::from_entries(&axes, [(vec!["blue".into(), "m".into()], sku("BM"))]).unwrap();
        let first = CombinationSet::enumerate(&axes, &matrix);
        let second = CombinationSet::enumerate(&axes, &matrix);
        assert_eq!(first.as_slice(), second.as_slice());
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        assert!(CombinationSet::enumerate(&[], &CombinationMatrix::new()).is_empty());
        let axes = vec![axis("color", &["red"]), axis("size", &[])];
        let set = CombinationSet::enumerate(&axes, &CombinationMatrix::new());
        assert!(set.is_empty());
        assert!(set.grid().is_none());
    }

    #[test]
    fn test_grid_cells_match_flat_keys() {
        let axes = vec![axis("color", &["red", "blue"]), axis("size", &["s", "m", "l"])];
        let set = CombinationSet::enumerate(&axes, &CombinationMatrix::new());
        let grid = set.grid().unwrap();
        assert_eq!((grid.rows(), grid.columns()), (2, 3));
        assert_eq!(grid.cell(1, 2).unwrap().key.as_str(), "blue|l");
        assert_eq!(grid.cell(1, 2).map(|c| &c.key), set.get(&"blue|l".into()).map(|c| &c.key));
        assert!(grid.cell(2, 0).is_none());
        assert_eq!(grid.row(0).len(), 3);
    }
}
