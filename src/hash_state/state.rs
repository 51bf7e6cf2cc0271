//! Fragment-backed view state.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::params::ViewParams;
use crate::error::HashStateError;
use crate::host::PageLocation;

/// The decoded hash state object.
pub type StateMap = Map<String, Value>;

/// Serialize a state object into fragment form (without the `#`).
pub fn encode_fragment(state: &StateMap) -> Result<String, HashStateError> {
    let json = serde_json::to_string(state)?;
    Ok(urlencoding::encode(&json).into_owned())
}

/// Parse a fragment (with or without the leading `#`).
///
/// An empty fragment is `Ok(None)`.
pub fn decode_fragment(fragment: &str) -> Result<Option<StateMap>, HashStateError> {
    let fragment = fragment.trim_start_matches('#');
    if fragment.is_empty() {
        return Ok(None);
    }

    let json = urlencoding::decode(fragment).map_err(|e| HashStateError::Decode(e.to_string()))?;
    match serde_json::from_str::<Value>(&json)? {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        _ => Err(HashStateError::NotAnObject),
    }
}

/// Read/write access to the view state in the URL fragment.
///
/// Every operation re-reads the fragment; nothing is cached between calls,
/// so writes from other call sites are always seen.
#[derive(Clone)]
pub struct HashState {
    location: Arc<dyn PageLocation>,
}

impl HashState {
    pub fn new(location: Arc<dyn PageLocation>) -> Self {
        Self { location }
    }

    /// The current state, reporting decode failures.
    pub fn try_get_state(&self) -> Result<Option<StateMap>, HashStateError> {
        decode_fragment(&self.location.fragment())
    }

    /// The current state; absent or unreadable fragments are `None`.
    pub fn get_state(&self) -> Option<StateMap> {
        match self.try_get_state() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable hash state, treating as empty");
                None
            }
        }
    }

    /// Replace the whole state.
    pub fn set_state(&self, state: &StateMap) -> Result<(), HashStateError> {
        let fragment = encode_fragment(state)?;
        self.location.set_fragment(&fragment);
        Ok(())
    }

    pub fn get_key(&self, key: &str) -> Option<Value> {
        self.get_state()?.remove(key)
    }

    /// Set one key; `Value::Null` removes it.
    pub fn set_key(&self, key: &str, value: Value) -> Result<(), HashStateError> {
        let mut state = self.get_state().unwrap_or_default();
        if value.is_null() {
            state.remove(key);
        } else {
            state.insert(key.to_string(), value);
        }
        self.set_state(&state)
    }

    /// Merge `section` and `data` into the state, keeping every other key.
    /// `Value::Null` data removes the `data` key.
    pub fn navigate_to(&self, section: &str, data: Value) -> Result<(), HashStateError> {
        let mut state = self.get_state().unwrap_or_default();
        state.insert("section".to_string(), Value::String(section.to_string()));
        if data.is_null() {
            state.remove("data");
        } else {
            state.insert("data".to_string(), data);
        }
        self.set_state(&state)
    }

    /// Typed view of the current state.
    pub fn view_params(&self) -> ViewParams {
        ViewParams::from_state(&self.get_state().unwrap_or_default())
    }

    /// Replace the whole state with typed parameters.
    pub fn set_view_params(&self, params: &ViewParams) -> Result<(), HashStateError> {
        self.set_state(&params.to_state()?)
    }

    /// Decoded fragment as sent in the `X-Hash-State` request header.
    pub fn header_value(&self) -> String {
        let fragment = self.location.fragment();
        match urlencoding::decode(&fragment) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => fragment,
        }
    }

    /// Remove the fragment entirely.
    pub fn clear(&self) {
        self.location.set_fragment("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryLocation;
    use serde_json::json;

    fn hash_state(href: &str) -> (HashState, MemoryLocation) {
        let location = MemoryLocation::new(href, "Plan");
        (HashState::new(Arc::new(location.clone())), location)
    }

    fn map(value: Value) -> StateMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_wire_format() {
        let fragment = encode_fragment(&map(json!({"scenario": "42"}))).unwrap();
        assert_eq!(fragment, "%7B%22scenario%22%3A%2242%22%7D");

        let decoded = decode_fragment("#%7B%22scenario%22%3A%2242%22%7D").unwrap();
        assert_eq!(decoded, Some(map(json!({"scenario": "42"}))));
    }

    #[test]
    fn test_absent_fragment_is_none() {
        let (state, _) = hash_state("https://x/plan");
        assert_eq!(state.get_state(), None);
        assert_eq!(state.get_key("scenario"), None);
    }

    #[test]
    fn test_unreadable_fragment_fails_closed() {
        let (state, location) = hash_state("https://x/plan#not-json");
        assert!(state.try_get_state().is_err());
        assert_eq!(state.get_state(), None);

        location.set_fragment("%5B1%2C2%5D");
        assert!(matches!(
            state.try_get_state(),
            Err(HashStateError::NotAnObject)
        ));

        // A write after corruption starts from an empty object
        state.set_key("step", json!("2")).unwrap();
        assert_eq!(state.get_state(), Some(map(json!({"step": "2"}))));
    }

    #[test]
    fn test_set_key_null_deletes() {
        let (state, _) = hash_state("https://x/plan");
        state.set_key("scenario", json!("42")).unwrap();
        state.set_key("year", json!(2030)).unwrap();
        state.set_key("scenario", Value::Null).unwrap();

        assert_eq!(state.get_state(), Some(map(json!({"year": 2030}))));
    }

    #[test]
    fn test_set_state_replaces_wholesale() {
        let (state, _) = hash_state("https://x/plan");
        state.set_key("a", json!(1)).unwrap();
        state.set_state(&map(json!({"b": 2}))).unwrap();
        assert_eq!(state.get_state(), Some(map(json!({"b": 2}))));
    }

    #[test]
    fn test_navigate_to_merges() {
        let (state, _) = hash_state("https://x/plan");
        state.set_key("scenario", json!("42")).unwrap();
        state.navigate_to("goals", json!({"id": 5})).unwrap();

        assert_eq!(
            state.get_state(),
            Some(map(json!({"scenario": "42", "section": "goals", "data": {"id": 5}})))
        );
    }

    #[test]
    fn test_navigate_to_without_data_drops_key() {
        let (state, _) = hash_state("https://x/plan");
        state.navigate_to("goals", json!({"id": 5})).unwrap();
        state.navigate_to("income", Value::Null).unwrap();

        assert_eq!(state.get_state(), Some(map(json!({"section": "income"}))));
    }

    #[test]
    fn test_view_params_write_back_is_lossless() {
        let (state, _) = hash_state("https://x/plan");
        state.set_key("scenario", json!(42)).unwrap();
        state.set_key("year", json!("2031")).unwrap();
        state.set_key("report", json!("cashflow")).unwrap();
        let before = state.get_state();

        state.set_view_params(&state.view_params()).unwrap();

        assert_eq!(state.get_state(), before);
    }

    #[test]
    fn test_header_value_is_decoded_json() {
        let (state, _) = hash_state("https://x/plan");
        state.set_key("scenario", json!("42")).unwrap();
        assert_eq!(state.header_value(), r#"{"scenario":"42"}"#);

        state.clear();
        assert_eq!(state.header_value(), "");
    }

    #[test]
    fn test_sees_external_fragment_edits() {
        let (state, location) = hash_state("https://x/plan");
        state.set_key("step", json!("1")).unwrap();

        location.set_fragment("%7B%22step%22%3A%223%22%7D");
        state.set_key("year", json!(2031)).unwrap();

        assert_eq!(state.get_state(), Some(map(json!({"step": "3", "year": 2031}))));
    }
}
