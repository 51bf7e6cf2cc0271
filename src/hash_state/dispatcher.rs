//! Per-key change notifications for the hash state.
//!
//! The fragment is one opaque JSON blob, but consumers care about single
//! keys. On every hash change the dispatcher diffs the new state against the
//! last snapshot and publishes `ClientEvent::HashChanged` for each key that
//! appeared, disappeared or changed value, so no consumer diffs on its own.

use std::collections::BTreeSet;
use std::sync::Mutex;

use super::state::{HashState, StateMap};
use crate::events::{ClientEvent, EventBus};
use crate::lock;

/// Keys whose value differs between two states, sorted.
pub fn changed_keys(previous: &StateMap, current: &StateMap) -> Vec<String> {
    let keys: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();
    keys.into_iter()
        .filter(|key| previous.get(*key) != current.get(*key))
        .cloned()
        .collect()
}

/// Turns whole-fragment transitions into per-key events.
#[derive(Debug, Default)]
pub struct ChangeDispatcher {
    last_state: Mutex<StateMap>,
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one hash change: publish an event per changed key and
    /// remember the new state. Returns the changed keys.
    pub fn on_hash_change(&self, hash_state: &HashState, bus: &EventBus) -> Vec<String> {
        let state = hash_state.get_state().unwrap_or_default();

        let changed = {
            let mut last = lock(&self.last_state);
            let changed = changed_keys(&last, &state);
            *last = state.clone();
            changed
        };

        if !changed.is_empty() {
            tracing::debug!(keys = ?changed, "Hash state changed");
        }
        for key in &changed {
            bus.publish(ClientEvent::HashChanged {
                key: key.clone(),
                value: state.get(key).cloned(),
            });
        }

        changed
    }

    /// The state seen by the last dispatch.
    pub fn snapshot(&self) -> StateMap {
        lock(&self.last_state).clone()
    }

    /// Forget the snapshot, as on a fresh page load.
    pub fn reset(&self) {
        lock(&self.last_state).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventFilter;
    use crate::host::MemoryLocation;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn map(value: Value) -> StateMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_changed_keys() {
        let previous = map(json!({"a": 1, "b": 2}));
        let current = map(json!({"a": 1, "c": 3}));
        assert_eq!(changed_keys(&previous, &current), vec!["b", "c"]);
        assert!(changed_keys(&current, &current).is_empty());
    }

    #[test]
    fn test_structural_comparison_for_nested_values() {
        let previous = map(json!({"data": {"id": 5}}));
        let current = map(json!({"data": {"id": 5}}));
        assert!(changed_keys(&previous, &current).is_empty());
    }

    #[test]
    fn test_dispatch_publishes_per_key_events() {
        let location = MemoryLocation::new("https://x/plan", "Plan");
        let hash_state = HashState::new(Arc::new(location));
        let bus = EventBus::new();
        let receiver = bus.channel(EventFilter::All, 16);
        let dispatcher = ChangeDispatcher::new();

        hash_state.set_state(&map(json!({"a": 1, "b": 2}))).unwrap();
        assert_eq!(dispatcher.on_hash_change(&hash_state, &bus), vec!["a", "b"]);
        receiver.drain_events();

        hash_state.set_state(&map(json!({"a": 1, "c": 3}))).unwrap();
        dispatcher.on_hash_change(&hash_state, &bus);

        assert_eq!(
            receiver.drain_events(),
            vec![
                ClientEvent::HashChanged {
                    key: "b".into(),
                    value: None
                },
                ClientEvent::HashChanged {
                    key: "c".into(),
                    value: Some(json!(3))
                },
            ]
        );
        assert_eq!(dispatcher.snapshot(), map(json!({"a": 1, "c": 3})));
    }

    #[test]
    fn test_typed_write_back_changes_only_edited_key() {
        let location = MemoryLocation::new("https://x/plan", "Plan");
        let hash_state = HashState::new(Arc::new(location));
        let bus = EventBus::new();
        let dispatcher = ChangeDispatcher::new();

        hash_state
            .set_state(&map(json!({"scenario": 42, "year": "2031"})))
            .unwrap();
        dispatcher.on_hash_change(&hash_state, &bus);

        let mut params = hash_state.view_params();
        params.step = Some("2".into());
        hash_state.set_view_params(&params).unwrap();

        assert_eq!(dispatcher.on_hash_change(&hash_state, &bus), vec!["step"]);
    }

    #[test]
    fn test_cleared_fragment_removes_every_key() {
        let location = MemoryLocation::new("https://x/plan", "Plan");
        let hash_state = HashState::new(Arc::new(location));
        let bus = EventBus::new();
        let dispatcher = ChangeDispatcher::new();

        hash_state.set_state(&map(json!({"step": "2"}))).unwrap();
        dispatcher.on_hash_change(&hash_state, &bus);

        hash_state.clear();
        assert_eq!(dispatcher.on_hash_change(&hash_state, &bus), vec!["step"]);
        assert!(dispatcher.snapshot().is_empty());
    }
}
