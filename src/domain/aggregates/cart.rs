//! Cart lines grouped for display

use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::submission::{DeliveryMode, LineItemMetadata};

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub metadata: LineItemMetadata,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    pub fn is_click_and_collect(&self) -> bool {
        self.metadata.delivery_mode == Some(DeliveryMode::ClickAndCollect)
    }

    fn base_product_id(&self) -> &str {
        non_empty(self.metadata.base_product_id.as_deref())
            .or_else(|| non_empty(Some(self.product_id.as_str())))
            .unwrap_or("unknown")
    }

    fn base_product_name(&self) -> &str {
        non_empty(self.metadata.base_product_name.as_deref())
            .or_else(|| non_empty(Some(self.name.as_str())))
            .unwrap_or("Unknown Product")
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> { s.filter(|s| !s.is_empty()) }

/// Lines sharing a base product, e.g. every size of one shirt
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BaseProductGroup {
    pub base_product_id: String,
    pub base_product_name: String,
    pub items: Vec<CartLine>,
}

impl BaseProductGroup {
    pub fn total_quantity(&self) -> u64 { self.items.iter().map(|i| u64::from(i.quantity)).sum() }

    pub fn summary(&self) -> String {
        let total = self.total_quantity();
        match self.items.len() {
            1 => format!("{} item{}", total, if total > 1 { "s" } else { "" }),
            variants => format!("{} items ({} variants)", total, variants),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GroupedCartLines {
    pub home_delivery: Vec<BaseProductGroup>,
    pub click_and_collect: BTreeMap<String, Vec<BaseProductGroup>>,
}

/// Split by delivery method (pickup lines per location), then group each
/// bucket by base product in first-seen order.
pub fn group_cart_lines(lines: &[CartLine]) -> GroupedCartLines {
    let (pickup, home): (Vec<&CartLine>, Vec<&CartLine>) = lines.iter().partition(|l| l.is_click_and_collect());

    let mut by_location: BTreeMap<String, Vec<&CartLine>> = BTreeMap::new();
    for line in pickup {
        let location = line
            .metadata
            .location
            .as_ref()
            .map(|l| l.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_LOCATION);
        by_location.entry(location.to_string()).or_default().push(line);
    }

    GroupedCartLines {
        home_delivery: group_by_base_product(home),
        click_and_collect: by_location.into_iter().map(|(k, v)| (k, group_by_base_product(v))).collect(),
    }
}

fn group_by_base_product(lines: Vec<&CartLine>) -> Vec<BaseProductGroup> {
    let mut groups: Vec<BaseProductGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in lines {
        let id = line.base_product_id();
        let slot = match index.get(id) {
            Some(&i) => i,
            None => {
                groups.push(BaseProductGroup {
                    base_product_id: id.to_string(),
                    base_product_name: line.base_product_name().to_string(),
                    items: vec![],
                });
                index.insert(id.to_string(), groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].items.push(line.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::submission::PickupLocation;

    fn line(id: &str, base: Option<&str>, quantity: u32, pickup: Option<&str>) -> CartLine {
        let mut metadata = LineItemMetadata {
            base_product_id: base.map(String::from),
            base_product_name: base.map(|b| format!("{b} name")),
            ..Default::default()
        };
        if let Some(location) = pickup {
            metadata.delivery_mode = Some(DeliveryMode::ClickAndCollect);
            metadata.location = Some(PickupLocation { code: location.to_lowercase(), name: location.to_string() });
        }
        CartLine { id: id.into(), product_id: format!("child-{id}"), name: format!("Line {id}"), quantity, metadata, created_at: Utc::now() }
    }

    #[test]
    fn test_groups_by_delivery_then_base_product() {
        let lines = vec![
            line("1", Some("tee"), 2, None),
            line("2", Some("cap"), 1, None),
            line("3", Some("tee"), 3, None),
            line("4", Some("tee"), 1, Some("Sydney")),
            line("5", Some("cap"), 1, Some("Melbourne")),
        ];
        let grouped = group_cart_lines(&lines);
        assert_eq!(grouped.home_delivery.len(), 2);
        assert_eq!(grouped.home_delivery[0].base_product_id, "tee");
        assert_eq!(grouped.home_delivery[0].items.len(), 2);
        assert_eq!(grouped.home_delivery[0].summary(), "5 items (2 variants)");
        assert_eq!(grouped.click_and_collect.keys().collect::<Vec<_>>(), vec!["Melbourne", "Sydney"]);
        assert_eq!(grouped.click_and_collect["Sydney"][0].base_product_name, "tee name");
    }

    #[test]
    fn test_falls_back_to_line_identity() {
        let mut pickup = line("9", None, 1, Some("x"));
        pickup.metadata.location = None;
        let grouped = group_cart_lines(&[line("8", None, 1, None), pickup]);
        assert_eq!(grouped.home_delivery[0].base_product_id, "child-8");
        assert_eq!(grouped.home_delivery[0].base_product_name, "Line 8");
        assert!(grouped.click_and_collect.contains_key(UNKNOWN_LOCATION));
    }

    #[test]
    fn test_single_line_summary() {
        let one = BaseProductGroup { base_product_id: "a".into(), base_product_name: "A".into(), items: vec![line("1", Some("a"), 1, None)] };
        assert_eq!(one.summary(), "1 item");
        let three = BaseProductGroup { items: vec![line("1", Some("a"), 3, None)], ..one };
        assert_eq!(three.summary(), "3 items");
    }
}
