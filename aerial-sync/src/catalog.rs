//! Category construction
//!
//! Groups raw playlist entries into categories and infers each category's
//! content kind from structural clues in the entry location.

use std::collections::HashMap;

use aerial_common::db::models::{Category, CategoryKind, Item};

use crate::playlist::RawEntry;

/// Category name used when an entry has no group attribute
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Item name used when an entry has no name attribute
const UNNAMED: &str = "Unknown";

/// Group entries into categories in first-seen order
///
/// A category's kind comes from the first entry routed into it; later
/// entries with the same group name join it as items regardless of their
/// own location-derived kind. Absent data degrades to defaults - this
/// pass never fails.
pub fn categorize(entries: Vec<RawEntry>) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let name = entry
            .attributes
            .get("group-title")
            .cloned()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let slot = match index.get(&name) {
            Some(&slot) => slot,
            None => {
                categories.push(Category {
                    id: None,
                    name: name.clone(),
                    kind: kind_from_location(&entry.location),
                    items: Vec::new(),
                });
                index.insert(name, categories.len() - 1);
                categories.len() - 1
            }
        };

        let RawEntry {
            location,
            mut attributes,
        } = entry;
        categories[slot].items.push(Item {
            id: None,
            name: attributes
                .remove("tvg-name")
                .unwrap_or_else(|| UNNAMED.to_string()),
            logo: attributes.remove("tvg-logo"),
            url: location,
        });
    }

    categories
}

/// Infer content kind from path segments of the entry location
pub fn kind_from_location(location: &str) -> CategoryKind {
    if location.contains("/live/") {
        CategoryKind::Live
    } else if location.contains("/series/") {
        CategoryKind::Series
    } else if location.contains("/movie/") {
        CategoryKind::Movie
    } else {
        CategoryKind::Unknown
    }
}
