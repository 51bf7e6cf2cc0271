//! Typed view parameters.
//!
//! The well-known hash keys get named optional fields; a missing key is
//! `None` (the feature is absent), never a placeholder. Anything else
//! survives in `extra` so a read-modify-write through `ViewParams` never
//! loses keys another region owns. Known keys left untouched are written
//! back with the encoding they were read with (`42` stays a number, `"2031"`
//! stays a string).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::state::StateMap;
use crate::error::HashStateError;

/// Typed view of the hash state object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    /// Section shown by `navigate_to`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Section payload set by `navigate_to`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Selected scenario (plan) id
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub scenario: Option<String>,

    /// Selected report
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub report: Option<String>,

    /// Selected projection year
    #[serde(
        default,
        deserialize_with = "lenient_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<i32>,

    /// Wizard step
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub step: Option<String>,

    /// Keys without a named field
    #[serde(flatten)]
    pub extra: StateMap,

    /// The state this view was read from
    #[serde(skip)]
    source: StateMap,
}

impl ViewParams {
    /// Read the typed view; a state whose known keys have unusable types
    /// falls back to an all-`extra` view rather than failing.
    pub fn from_state(state: &StateMap) -> Self {
        match serde_json::from_value::<Self>(Value::Object(state.clone())) {
            Ok(mut params) => {
                params.source = state.clone();
                params
            }
            Err(e) => {
                tracing::warn!(error = %e, "Hash state does not fit view parameters");
                Self {
                    extra: state.clone(),
                    ..Self::default()
                }
            }
        }
    }

    pub fn to_state(&self) -> Result<StateMap, HashStateError> {
        let mut state = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(HashStateError::NotAnObject),
        };

        if self.source.is_empty() {
            return Ok(state);
        }
        let read: Self = serde_json::from_value(Value::Object(self.source.clone()))?;
        for key in self.unchanged_keys(&read) {
            if let Some(raw) = self.source.get(key) {
                state.insert(key.to_string(), raw.clone());
            }
        }
        Ok(state)
    }

    fn unchanged_keys(&self, read: &Self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.section.is_some() && self.section == read.section {
            keys.push("section");
        }
        if self.data.is_some() && self.data == read.data {
            keys.push("data");
        }
        if self.scenario.is_some() && self.scenario == read.scenario {
            keys.push("scenario");
        }
        if self.report.is_some() && self.report == read.report {
            keys.push("report");
        }
        if self.year.is_some() && self.year == read.year {
            keys.push("year");
        }
        if self.step.is_some() && self.step == read.step {
            keys.push("step");
        }
        keys
    }
}

/// Accept strings, numbers and booleans; `null` is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

/// Accept integers and integer strings.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|year| i32::try_from(year).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid year {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid year '{}'", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a year, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> StateMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_known_keys_and_extra() {
        let params = ViewParams::from_state(&map(json!({
            "scenario": 42,
            "report": "cashflow",
            "year": "2031",
            "compare": true
        })));

        assert_eq!(params.scenario.as_deref(), Some("42"));
        assert_eq!(params.report.as_deref(), Some("cashflow"));
        assert_eq!(params.year, Some(2031));
        assert_eq!(params.step, None);
        assert_eq!(params.extra.get("compare"), Some(&json!(true)));
    }

    #[test]
    fn test_missing_keys_stay_absent() {
        let params = ViewParams {
            scenario: Some("7".into()),
            ..ViewParams::default()
        };
        assert_eq!(params.to_state().unwrap(), map(json!({"scenario": "7"})));
    }

    #[test]
    fn test_untouched_keys_keep_their_encoding() {
        let state = map(json!({
            "scenario": 42,
            "year": "2031",
            "step": "3",
            "compare": true
        }));
        let params = ViewParams::from_state(&state);

        assert_eq!(params.to_state().unwrap(), state);
    }

    #[test]
    fn test_changed_keys_use_typed_encoding() {
        let mut params = ViewParams::from_state(&map(json!({"scenario": 42, "year": "2031"})));
        params.scenario = Some("43".into());
        params.year = None;

        assert_eq!(params.to_state().unwrap(), map(json!({"scenario": "43"})));
    }

    #[test]
    fn test_unusable_types_fall_back_to_extra() {
        let state = map(json!({"year": "next", "step": "2"}));
        let params = ViewParams::from_state(&state);

        assert_eq!(params.year, None);
        assert_eq!(params.step, None);
        assert_eq!(params.extra, state);
        assert_eq!(params.to_state().unwrap(), state);
    }
}
