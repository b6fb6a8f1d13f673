//! In-memory staging engine for the working collection
//!
//! The staging engine is the accumulation area for listings the user has
//! chosen, prior to a durable save. It is a session-scoped object owned by
//! the application root and passed by handle to consumers, which keeps
//! independent sessions (and tests) isolated from each other.
//!
//! Identity: staged items merge under `code:condition`. Price and name are
//! deliberately not part of the identity, so two listings differing only in
//! price accumulate under the same staged item. This is coarser than the
//! listing-level dedup identity used by the extraction pipeline, and the two
//! must stay distinct.
//!
//! Every mutating call pushes exactly one [`UndoAction`] onto an unbounded
//! LIFO stack; there is no redo. Calls that fully delete an entry snapshot
//! the deleted item, because restoring a quantity alone is insufficient once
//! the entry has vanished.
//!
//! The engine is single-writer by design: it assumes one logical session
//! drives mutations serially and provides no internal locking. Embedding it
//! in a context with concurrent writers requires an external mutual-exclusion
//! boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::listing::{Condition, Listing};

/// Default name for a staging session that has never been saved.
pub const DEFAULT_WORKING_NAME: &str = "Working draft";

/// Quantities never go negative; every mutation is floored at zero.
fn clamp_quantity(quantity: i64) -> i64 {
    quantity.max(0)
}

/// Identity key for staged items: printing code plus condition.
pub fn identity_key(code: &str, condition: Condition) -> String {
    format!("{}:{}", code, condition.as_str())
}

/// One item in the working collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingItem {
    pub name: String,
    pub set: String,
    pub code: String,
    pub quantity: i64,
    pub price: String,
    pub rarity: String,
    pub condition: Condition,
    pub stock: u32,
}

impl StagingItem {
    /// Build a staged item from a search listing with the given quantity.
    pub fn from_listing(listing: &Listing, quantity: i64) -> Self {
        Self {
            name: listing.name.clone(),
            set: listing.set.clone(),
            code: listing.code.clone(),
            quantity: clamp_quantity(quantity),
            price: listing.price.clone(),
            rarity: listing.rarity.clone(),
            condition: listing.condition,
            stock: listing.stock,
        }
    }

    /// Identity key this item merges under.
    pub fn key(&self) -> String {
        identity_key(&self.code, self.condition)
    }
}

/// Log entry capturing enough state to exactly reverse one mutating call.
///
/// `changes` holds, per affected key, the quantity that existed immediately
/// before the call (0 for keys that were absent). `restored` holds full
/// snapshots for keys the call fully deleted.
#[derive(Debug, Clone)]
struct UndoAction {
    changes: Vec<(String, i64)>,
    restored: Vec<(String, StagingItem)>,
}

/// Transactional in-memory buffer of chosen items with single-level-exact undo.
///
/// Each identity key is either absent or present with quantity >= 1; an item
/// reaching quantity zero is removed from the active map (and may be revived
/// by undo).
#[derive(Debug, Default)]
pub struct StagingEngine {
    items: HashMap<String, StagingItem>,
    undo_stack: Vec<UndoAction>,
    name: String,
    collection_id: Option<i64>,
}

impl StagingEngine {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            undo_stack: Vec::new(),
            name: DEFAULT_WORKING_NAME.to_string(),
            collection_id: None,
        }
    }

    /// Add a batch of items, merging by identity key. One undo entry covers
    /// the whole batch.
    pub fn add_items(&mut self, items: &[StagingItem]) {
        self.apply_batch(items, 1);
    }

    /// Decrement a batch of items, floored at zero. Mirror of [`add_items`];
    /// keys absent from the staging map are recorded but otherwise ignored.
    ///
    /// [`add_items`]: Self::add_items
    pub fn remove_items(&mut self, items: &[StagingItem]) {
        self.apply_batch(items, -1);
    }

    fn apply_batch(&mut self, items: &[StagingItem], sign: i64) {
        if items.is_empty() {
            return;
        }

        let mut changes: Vec<(String, i64)> = Vec::new();
        let mut restored: Vec<(String, StagingItem)> = Vec::new();

        for item in items {
            let key = item.key();
            let prior = self.items.get(&key).map_or(0, |i| i.quantity);

            // Per affected key, keep the quantity from before the call, not
            // an intermediate value when a key repeats within the batch.
            if !changes.iter().any(|(k, _)| *k == key) {
                changes.push((key.clone(), prior));
            }

            if let Some(existing) = self.items.get(&key) {
                let next = clamp_quantity(existing.quantity + sign * item.quantity);
                if next == 0 {
                    let mut snapshot = existing.clone();
                    self.items.remove(&key);
                    // Snapshot the state from before the call; a key first
                    // inserted by this same batch has nothing to restore.
                    let before_call = changes
                        .iter()
                        .find(|(k, _)| *k == key)
                        .map_or(prior, |(_, q)| *q);
                    if before_call > 0 && !restored.iter().any(|(k, _)| *k == key) {
                        snapshot.quantity = before_call;
                        restored.push((key, snapshot));
                    }
                } else if let Some(existing) = self.items.get_mut(&key) {
                    existing.quantity = next;
                }
            } else if sign > 0 {
                let quantity = clamp_quantity(item.quantity);
                if quantity > 0 {
                    let mut staged = item.clone();
                    staged.quantity = quantity;
                    self.items.insert(key, staged);
                }
            }
        }

        self.undo_stack.push(UndoAction { changes, restored });
    }

    /// Apply a signed quantity delta to an existing entry. Returns false when
    /// no entry exists under `key`. A result of zero deletes the entry with a
    /// full snapshot so undo can resurrect it.
    pub fn adjust_quantity(&mut self, key: &str, delta: i64) -> bool {
        let Some(existing) = self.items.get(key) else {
            return false;
        };
        let prior = existing.quantity;
        let next = clamp_quantity(prior + delta);

        if next == 0 {
            let snapshot = existing.clone();
            self.items.remove(key);
            self.undo_stack.push(UndoAction {
                changes: vec![(key.to_string(), prior)],
                restored: vec![(key.to_string(), snapshot)],
            });
        } else {
            if let Some(existing) = self.items.get_mut(key) {
                existing.quantity = next;
            }
            self.undo_stack.push(UndoAction {
                changes: vec![(key.to_string(), prior)],
                restored: Vec::new(),
            });
        }
        true
    }

    /// Delete an entry outright, snapshot-backed. Returns false when no entry
    /// exists under `key`.
    pub fn remove_item(&mut self, key: &str) -> bool {
        let Some(existing) = self.items.get(key) else {
            return false;
        };
        let prior = existing.quantity;
        let snapshot = existing.clone();
        self.items.remove(key);
        self.undo_stack.push(UndoAction {
            changes: vec![(key.to_string(), prior)],
            restored: vec![(key.to_string(), snapshot)],
        });
        true
    }

    /// Reverse the most recent mutating call. Returns false when the undo
    /// stack is empty.
    ///
    /// Snapshot-backed restorations are re-inserted first. Remaining change
    /// entries then either delete keys that did not exist before the call, or
    /// put the prior quantity back. A change entry whose key no longer exists
    /// (removed by activity outside this engine) is a no-op, not an error.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };

        for (key, item) in &action.restored {
            self.items.insert(key.clone(), item.clone());
        }

        for (key, prior) in &action.changes {
            if action.restored.iter().any(|(k, _)| k == key) {
                continue;
            }
            if *prior <= 0 {
                self.items.remove(key);
            } else if let Some(existing) = self.items.get_mut(key) {
                existing.quantity = *prior;
            }
        }
        true
    }

    /// True iff an entry exists under `key` with quantity > 0.
    pub fn is_present(&self, key: &str) -> bool {
        self.items.get(key).is_some_and(|item| item.quantity > 0)
    }

    pub fn get(&self, key: &str) -> Option<&StagingItem> {
        self.items.get(key)
    }

    /// Current entries sorted ascending by (name, code, condition).
    /// Recomputed on every call.
    pub fn items(&self) -> Vec<StagingItem> {
        let mut items: Vec<StagingItem> = self.items.values().cloned().collect();
        items.sort_by(|a, b| {
            (&a.name, &a.code, a.condition).cmp(&(&b.name, &b.code, b.condition))
        });
        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the entire staging content, e.g. when loading a persisted
    /// collection. Clears the undo history; undo does not cross a load.
    pub fn replace_all(&mut self, items: Vec<StagingItem>) {
        self.items.clear();
        for item in items {
            self.items.insert(item.key(), item);
        }
        self.undo_stack.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Id of the persisted collection this session tracks, if it was ever
    /// saved or loaded.
    pub fn collection_id(&self) -> Option<i64> {
        self.collection_id
    }

    pub fn set_collection_id(&mut self, id: Option<i64>) {
        self.collection_id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(code: &str, condition: Condition, quantity: i64) -> StagingItem {
        StagingItem {
            name: format!("Card {code}"),
            set: "Test Set".to_string(),
            code: code.to_string(),
            quantity,
            price: "$1.00".to_string(),
            rarity: "Common".to_string(),
            condition,
            stock: 3,
        }
    }

    #[test]
    fn add_merges_quantities_under_identity_key() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::NearMint, 2)]);
        engine.add_items(&[item("A", Condition::NearMint, 3)]);

        let key = identity_key("A", Condition::NearMint);
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(5));

        assert!(engine.undo());
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(2));
        assert!(engine.undo());
        assert!(engine.get(&key).is_none());
    }

    #[test]
    fn price_is_not_part_of_identity() {
        let mut engine = StagingEngine::new();
        let mut cheap = item("A", Condition::NearMint, 1);
        cheap.price = "$0.99".to_string();
        let mut dear = item("A", Condition::NearMint, 1);
        dear.price = "$9.99".to_string();

        engine.add_items(&[cheap]);
        engine.add_items(&[dear]);
        assert_eq!(engine.len(), 1);
        let key = identity_key("A", Condition::NearMint);
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(2));
    }

    #[test]
    fn condition_distinguishes_identities() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[
            item("A", Condition::NearMint, 1),
            item("A", Condition::Played, 1),
        ]);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn remove_floors_at_zero_and_deletes_at_zero() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::NearMint, 2)]);
        engine.remove_items(&[item("A", Condition::NearMint, 5)]);

        let key = identity_key("A", Condition::NearMint);
        assert!(!engine.is_present(&key));
        assert!(engine.get(&key).is_none());

        // Deletion was snapshot-backed; undo resurrects the full entry.
        assert!(engine.undo());
        let revived = engine.get(&key).expect("entry revived by undo");
        assert_eq!(revived.quantity, 2);
        assert_eq!(revived.set, "Test Set");
        assert_eq!(revived.price, "$1.00");
    }

    #[test]
    fn remove_of_absent_key_is_recorded_but_harmless() {
        let mut engine = StagingEngine::new();
        engine.remove_items(&[item("Z", Condition::Unknown, 1)]);
        assert!(engine.is_empty());
        assert!(engine.undo());
        assert!(engine.is_empty());
    }

    #[test]
    fn adjust_quantity_mutates_in_place() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::NearMint, 3)]);
        let key = identity_key("A", Condition::NearMint);

        assert!(engine.adjust_quantity(&key, 2));
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(5));

        assert!(engine.undo());
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(3));
    }

    #[test]
    fn adjust_to_zero_deletes_and_undo_resurrects_all_fields() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::Played, 4)]);
        let key = identity_key("A", Condition::Played);

        assert!(engine.adjust_quantity(&key, -10));
        assert!(engine.get(&key).is_none());

        assert!(engine.undo());
        let revived = engine.get(&key).expect("snapshot restored");
        assert_eq!(revived.quantity, 4);
        assert_eq!(revived.rarity, "Common");
        assert_eq!(revived.condition, Condition::Played);
    }

    #[test]
    fn adjust_and_remove_report_missing_keys() {
        let mut engine = StagingEngine::new();
        assert!(!engine.adjust_quantity("missing:Unknown", 1));
        assert!(!engine.remove_item("missing:Unknown"));
        assert!(!engine.undo());
    }

    #[test]
    fn remove_item_always_snapshots() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("B", Condition::NearMint, 7)]);
        let key = identity_key("B", Condition::NearMint);

        assert!(engine.remove_item(&key));
        assert!(engine.get(&key).is_none());
        assert!(engine.undo());
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(7));
    }

    #[test]
    fn undo_is_a_noop_for_keys_deleted_outside_the_engine() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::NearMint, 2)]);
        engine.adjust_quantity(&identity_key("A", Condition::NearMint), 1);

        // Simulate external removal between the mutation and the undo.
        engine.items.remove(&identity_key("A", Condition::NearMint));

        assert!(engine.undo());
        assert!(engine.get(&identity_key("A", Condition::NearMint)).is_none());
    }

    #[test]
    fn batch_undo_restores_every_touched_key() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::NearMint, 1)]);
        engine.add_items(&[
            item("A", Condition::NearMint, 2),
            item("B", Condition::Played, 3),
            item("C", Condition::Unknown, 1),
        ]);

        assert!(engine.undo());
        assert_eq!(
            engine.get(&identity_key("A", Condition::NearMint)).map(|i| i.quantity),
            Some(1)
        );
        assert!(engine.get(&identity_key("B", Condition::Played)).is_none());
        assert!(engine.get(&identity_key("C", Condition::Unknown)).is_none());
    }

    #[test]
    fn repeated_key_in_one_batch_undoes_to_before_the_call() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::NearMint, 5)]);
        engine.add_items(&[
            item("A", Condition::NearMint, 1),
            item("A", Condition::NearMint, 1),
        ]);
        let key = identity_key("A", Condition::NearMint);
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(7));

        assert!(engine.undo());
        assert_eq!(engine.get(&key).map(|i| i.quantity), Some(5));
    }

    #[test]
    fn items_are_sorted_by_name_code_condition() {
        let mut engine = StagingEngine::new();
        let mut b = item("B01-EN001", Condition::NearMint, 1);
        b.name = "Beta".to_string();
        let mut a2 = item("A02-EN002", Condition::Played, 1);
        a2.name = "Alpha".to_string();
        let mut a1 = item("A02-EN002", Condition::NearMint, 1);
        a1.name = "Alpha".to_string();
        engine.add_items(&[b, a2, a1]);

        let names: Vec<(String, Condition)> = engine
            .items()
            .into_iter()
            .map(|i| (i.name, i.condition))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Alpha".to_string(), Condition::NearMint),
                ("Alpha".to_string(), Condition::Played),
                ("Beta".to_string(), Condition::NearMint),
            ]
        );
    }

    #[test]
    fn replace_all_clears_undo_history() {
        let mut engine = StagingEngine::new();
        engine.add_items(&[item("A", Condition::NearMint, 1)]);
        engine.replace_all(vec![item("B", Condition::Played, 2)]);

        assert!(!engine.undo());
        assert!(engine.is_present(&identity_key("B", Condition::Played)));
        assert!(!engine.is_present(&identity_key("A", Condition::NearMint)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, i64),
        Remove(u8, i64),
        Adjust(u8, i64),
        Delete(u8),
        Undo,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, -5i64..10).prop_map(|(k, q)| Op::Add(k, q)),
            (0u8..4, 0i64..10).prop_map(|(k, q)| Op::Remove(k, q)),
            (0u8..4, -10i64..10).prop_map(|(k, d)| Op::Adjust(k, d)),
            (0u8..4).prop_map(Op::Delete),
            Just(Op::Undo),
        ]
    }

    proptest! {
        #[test]
        fn quantities_never_go_negative(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let mut engine = StagingEngine::new();
            let codes = ["A", "B", "C", "D"];
            for op in ops {
                match op {
                    Op::Add(k, q) => {
                        engine.add_items(&[item(codes[k as usize], Condition::NearMint, q)]);
                    }
                    Op::Remove(k, q) => {
                        engine.remove_items(&[item(codes[k as usize], Condition::NearMint, q)]);
                    }
                    Op::Adjust(k, d) => {
                        engine.adjust_quantity(&identity_key(codes[k as usize], Condition::NearMint), d);
                    }
                    Op::Delete(k) => {
                        engine.remove_item(&identity_key(codes[k as usize], Condition::NearMint));
                    }
                    Op::Undo => {
                        engine.undo();
                    }
                }
                for staged in engine.items() {
                    prop_assert!(staged.quantity >= 0, "negative quantity for {}", staged.code);
                }
            }
        }
    }
}
