//! Field errors from a 400 response's `ModelState`.

use std::collections::BTreeMap;

use serde_json::Value;

/// Map a bad request body's `ModelState` to field name and message.
///
/// `model.Name` becomes `Name`; deeper keys such as `model.Address.City`
/// are skipped. Only the first message per field is kept.
pub fn model_state_errors(body: &Value) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    let Some(model_state) = body.get("ModelState").and_then(Value::as_object) else {
        return errors;
    };

    for (key, value) in model_state {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() > 2 {
            continue;
        }
        let name = parts.get(1).copied().unwrap_or(key.as_str());

        let message = match value {
            Value::Array(messages) => messages.first(),
            other => Some(other),
        };
        let Some(message) = message else {
            continue;
        };

        let text = match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        errors.insert(name.to_string(), text);
    }

    errors
}
