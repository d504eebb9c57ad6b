// File: ./src/model.rs
// Feed records and the grouped view built from them.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// A record as it appears in the feed, before any cleaning.
///
/// `name` is `None` when the key is missing or explicitly `null`. Any other
/// type mismatch makes the whole record fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawItem {
    pub id: i64,
    #[serde(rename = "listId")]
    pub list_id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// A validated record. The name is guaranteed to contain at least one
/// non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: i64,
    #[serde(rename = "listId")]
    list_id: i64,
    name: String,
}

impl Item {
    /// Returns `None` when the record has no usable name.
    pub fn from_raw(raw: RawItem) -> Option<Self> {
        let name = raw.name?;
        if name.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: raw.id,
            list_id: raw.list_id,
            name,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn list_id(&self) -> i64 {
        self.list_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Items partitioned by `list_id`. Keys enumerate in ascending order and each
/// group keeps the order its items were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupedResult {
    groups: BTreeMap<i64, Vec<Item>>,
}

impl GroupedResult {
    pub fn iter(&self) -> btree_map::Iter<'_, i64, Vec<Item>> {
        self.groups.iter()
    }

    pub fn get(&self, list_id: i64) -> Option<&[Item]> {
        self.groups.get(&list_id).map(Vec::as_slice)
    }

    pub fn list_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.groups.keys().copied()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn item_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl FromIterator<Item> for GroupedResult {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut groups: BTreeMap<i64, Vec<Item>> = BTreeMap::new();
        for item in iter {
            groups.entry(item.list_id).or_default().push(item);
        }
        Self { groups }
    }
}

impl<'a> IntoIterator for &'a GroupedResult {
    type Item = (&'a i64, &'a Vec<Item>);
    type IntoIter = btree_map::Iter<'a, i64, Vec<Item>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, list_id: i64, name: Option<&str>) -> RawItem {
        RawItem {
            id,
            list_id,
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(Item::from_raw(raw(1, 1, None)).is_none());
        assert!(Item::from_raw(raw(2, 1, Some(""))).is_none());
        assert!(Item::from_raw(raw(3, 1, Some(" \t\n"))).is_none());

        let kept = Item::from_raw(raw(4, 7, Some(" Item 4 "))).unwrap();
        assert_eq!(kept.name(), " Item 4 ");
        assert_eq!(kept.list_id(), 7);
    }

    #[test]
    fn grouping_orders_keys_and_keeps_insertion_order() {
        let items = [
            raw(1, 3, Some("c")),
            raw(2, 1, Some("a")),
            raw(3, 3, Some("b")),
        ]
        .into_iter()
        .filter_map(Item::from_raw);

        let grouped: GroupedResult = items.collect();
        assert_eq!(grouped.list_ids().collect::<Vec<_>>(), vec![1, 3]);
        let names: Vec<&str> = grouped.get(3).unwrap().iter().map(Item::name).collect();
        assert_eq!(names, vec!["c", "b"]);
        assert_eq!(grouped.item_count(), 3);
    }
}
