// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query filter for queued items.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::item::{QueuedItem, QueuedItemStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    QueuedAt,
    Priority,
    Attempts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Conjunctive filter over queued items.
///
/// Empty `status` and `None` fields match everything. Sorting happens only
/// when `sort_by` is set and is stable, so ties keep storage order. `limit`
/// truncates after sorting; `Some(0)` means no limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueItemFilter {
    pub status: Vec<QueuedItemStatus>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub operation_type: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_direction: SortDirection,
    pub limit: Option<usize>,
}

impl QueueItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: QueuedItemStatus) -> Self {
        self.status = vec![status];
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = QueuedItemStatus>) -> Self {
        self.status = statuses.into_iter().collect();
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_operation_type(mut self, operation_type: impl Into<String>) -> Self {
        self.operation_type = Some(operation_type.into());
        self
    }

    pub fn sorted_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_by = Some(field);
        self.sort_direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, item: &QueuedItem) -> bool {
        (self.status.is_empty() || self.status.contains(&item.status))
            && self
                .resource_type
                .as_ref()
                .is_none_or(|t| *t == item.resource_type)
            && self
                .resource_id
                .as_ref()
                .is_none_or(|id| item.resource_id.as_ref() == Some(id))
            && self
                .operation_type
                .as_ref()
                .is_none_or(|op| *op == item.operation_type)
    }

    /// Filter, sort and truncate `items`.
    pub fn apply(&self, mut items: Vec<QueuedItem>) -> Vec<QueuedItem> {
        items.retain(|item| self.matches(item));

        if let Some(field) = self.sort_by {
            let direction = self.sort_direction;
            items.sort_by(|a, b| {
                let ordering = compare(field, a, b);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit.filter(|n| *n > 0) {
            items.truncate(limit);
        }
        items
    }
}

fn compare(field: SortField, a: &QueuedItem, b: &QueuedItem) -> Ordering {
    match field {
        SortField::QueuedAt => a.queued_at.cmp(&b.queued_at),
        SortField::Priority => a.priority.cmp(&b.priority),
        SortField::Attempts => a.attempts.cmp(&b.attempts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::NewQueuedItem;
    use proptest::prelude::*;
    use serde_json::json;

    fn item(id: &str, resource_type: &str, priority: i32, queued_at: i64) -> QueuedItem {
        let mut new = NewQueuedItem::pending("create", resource_type, json!(null), queued_at);
        new.priority = priority;
        new.with_id(id.to_string())
    }

    #[test]
    fn empty_filter_keeps_order_and_everything() {
        let items = vec![item("a", "product", 0, 3), item("b", "batch", 0, 1)];
        let out = QueueItemFilter::new().apply(items.clone());
        assert_eq!(out, items);
    }

    #[test]
    fn criteria_are_anded() {
        let mut tx = item("c", "transaction", 0, 2);
        tx.operation_type = "delete".into();
        let items = vec![item("a", "product", 0, 1), tx, item("b", "transaction", 0, 3)];
        let out = QueueItemFilter::new()
            .with_resource_type("transaction")
            .with_operation_type("create")
            .apply(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");
    }

    #[test]
    fn status_set_matches_any_member() {
        let mut in_flight = item("b", "product", 0, 2);
        in_flight.status = QueuedItemStatus::InProgress;
        let mut done = item("c", "product", 0, 3);
        done.status = QueuedItemStatus::Completed;
        let out = QueueItemFilter::new()
            .with_statuses([QueuedItemStatus::Pending, QueuedItemStatus::InProgress])
            .apply(vec![item("a", "product", 0, 1), in_flight, done]);
        let ids: Vec<_> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn priority_desc_is_stable_for_ties() {
        let items = vec![
            item("low", "p", 1, 1),
            item("high-1", "p", 5, 2),
            item("high-2", "p", 5, 3),
        ];
        let out = QueueItemFilter::new()
            .sorted_by(SortField::Priority, SortDirection::Desc)
            .apply(items);
        let ids: Vec<_> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["high-1", "high-2", "low"]);
    }

    #[test]
    fn limit_applies_after_sort_and_zero_is_unbounded() {
        let items = vec![item("a", "p", 0, 30), item("b", "p", 0, 10), item("c", "p", 0, 20)];
        let out = QueueItemFilter::new()
            .sorted_by(SortField::QueuedAt, SortDirection::Asc)
            .with_limit(2)
            .apply(items.clone());
        let ids: Vec<_> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        assert_eq!(QueueItemFilter::new().with_limit(0).apply(items).len(), 3);
    }

    #[test]
    fn resource_id_filter_skips_items_without_one() {
        let mut tagged = item("a", "p", 0, 1);
        tagged.resource_id = Some("sku-1".into());
        let out = QueueItemFilter::new()
            .with_resource_id("sku-1")
            .apply(vec![tagged, item("b", "p", 0, 2)]);
        assert_eq!(out.len(), 1);
    }

    proptest! {
        #[test]
        fn filtered_items_all_match_and_respect_limit(
            priorities in proptest::collection::vec(-5i32..5, 0..40),
            limit in 0usize..10,
        ) {
            let items: Vec<_> = priorities
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let kind = if i % 2 == 0 { "product" } else { "batch" };
                    item(&i.to_string(), kind, *p, i as i64)
                })
                .collect();
            let filter = QueueItemFilter::new()
                .with_resource_type("product")
                .sorted_by(SortField::Priority, SortDirection::Desc)
                .with_limit(limit);
            let out = filter.apply(items);

            prop_assert!(out.iter().all(|i| i.resource_type == "product"));
            if limit > 0 {
                prop_assert!(out.len() <= limit);
            }
            prop_assert!(out.windows(2).all(|w| w[0].priority >= w[1].priority));
        }
    }
}
