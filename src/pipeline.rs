// File: ./src/pipeline.rs
//! Turns a raw feed body into the grouped, display-ordered result.
//!
//! Stages run in a fixed order: decode, validate each record, drop records
//! without a usable name, sort, group. Only a body that is not a JSON array
//! fails the run; individual bad records are skipped.
use crate::error::FetchError;
use crate::model::{GroupedResult, Item, RawItem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static ITEM_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Item ([0-9]+)").expect("Failed to compile item number regex"));

/// Output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedData {
    pub groups: GroupedResult,
    pub item_count: usize,
}

impl FeedData {
    pub fn status_message(&self) -> String {
        format!("{} items loaded", self.item_count)
    }
}

/// Extracts the number following the first `Item ` in `name`.
///
/// Returns `None` when there is no match or the digits overflow.
pub fn extract_item_number(name: &str) -> Option<u64> {
    ITEM_NUMBER
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Decodes the top-level array, skipping elements that are not valid records.
pub fn decode_items(bytes: &[u8]) -> Result<Vec<RawItem>, FetchError> {
    let values: Vec<Value> = serde_json::from_slice(bytes).map_err(|e| {
        log::warn!("Feed body is not a JSON array: {}", e);
        FetchError::MalformedFeed
    })?;

    let total = values.len();
    let mut records = Vec::with_capacity(total);
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawItem>(value) {
            Ok(raw) => records.push(raw),
            Err(e) => log::debug!("Skipping feed entry {}: {}", index, e),
        }
    }

    if records.len() < total {
        log::info!(
            "Decoded {} of {} feed entries ({} skipped)",
            records.len(),
            total,
            total - records.len()
        );
    }
    Ok(records)
}

pub fn filter_items(records: Vec<RawItem>) -> Vec<Item> {
    records.into_iter().filter_map(Item::from_raw).collect()
}

/// Stable sort by `list_id`, then by the number in the name. Names without a
/// number go last in their group and keep their relative order.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by_cached_key(|item| {
        let number = extract_item_number(item.name());
        (item.list_id(), number.is_none(), number.unwrap_or(0))
    });
}

pub fn group_items(items: Vec<Item>) -> GroupedResult {
    let grouped: GroupedResult = items.into_iter().collect();
    log::debug!("Grouped feed into {} lists", grouped.group_count());
    for (list_id, items) in &grouped {
        log::debug!("List {} has {} items", list_id, items.len());
    }
    grouped
}

/// Runs every stage over `bytes`.
pub fn transform(bytes: &[u8]) -> Result<FeedData, FetchError> {
    let records = decode_items(bytes)?;
    let mut items = filter_items(records);
    sort_items(&mut items);
    let item_count = items.len();
    let groups = group_items(items);
    Ok(FeedData { groups, item_count })
}
