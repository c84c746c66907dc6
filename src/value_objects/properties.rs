//! Serialized property values of node variants

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A property value in its serialized form together with its type name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPropertyValue {
    /// The serialized value
    pub value: Value,
    /// The declared type, e.g. `string`, `array`, `DateTime`
    #[serde(rename = "type")]
    pub type_name: String,
}

impl SerializedPropertyValue {
    pub fn new(value: Value, type_name: impl Into<String>) -> Self {
        Self {
            value,
            type_name: type_name.into(),
        }
    }

    /// Shorthand for a `string` typed value
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Value::String(value.into()), "string")
    }
}

/// Property bag of one node variant, keyed by property name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedPropertyValues(IndexMap<String, SerializedPropertyValue>);

impl SerializedPropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert
    pub fn with(mut self, name: impl Into<String>, value: SerializedPropertyValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SerializedPropertyValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SerializedPropertyValue)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Apply a set/unset delta, returning the resulting bag
    pub fn merge(&self, to_set: &SerializedPropertyValues, to_unset: &[String]) -> Self {
        let mut merged = self.0.clone();
        for (name, value) in to_set.iter() {
            merged.insert(name.clone(), value.clone());
        }
        for name in to_unset {
            merged.shift_remove(name);
        }
        Self(merged)
    }
}

impl FromIterator<(String, SerializedPropertyValue)> for SerializedPropertyValues {
    fn from_iter<T: IntoIterator<Item = (String, SerializedPropertyValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Property deltas of a write command; `None` removes the property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyValuesToWrite(IndexMap<String, Option<SerializedPropertyValue>>);

impl PropertyValuesToWrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`
    pub fn set(mut self, name: impl Into<String>, value: SerializedPropertyValue) -> Self {
        self.0.insert(name.into(), Some(value));
        self
    }

    /// Remove `name`
    pub fn unset(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<SerializedPropertyValue>)> {
        self.0.iter()
    }

    /// Split into the values to set and the names to unset
    pub fn split(&self) -> (SerializedPropertyValues, Vec<String>) {
        let mut to_set = IndexMap::new();
        let mut to_unset = Vec::new();
        for (name, value) in &self.0 {
            match value {
                Some(value) => {
                    to_set.insert(name.clone(), value.clone());
                }
                None => to_unset.push(name.clone()),
            }
        }
        (SerializedPropertyValues(to_set), to_unset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_sets_and_unsets() {
        let bag = SerializedPropertyValues::new()
            .with("title", SerializedPropertyValue::string("Hello"))
            .with("text", SerializedPropertyValue::string("<p>Hi</p>"));

        let (to_set, to_unset) = PropertyValuesToWrite::new()
            .set("headline", SerializedPropertyValue::string("Hello"))
            .unset("title")
            .split();
        let merged = bag.merge(&to_set, &to_unset);

        assert!(!merged.contains("title"));
        assert_eq!(merged.get("headline").unwrap().value, json!("Hello"));
        assert!(merged.contains("text"));
        // source bag untouched
        assert!(bag.contains("title"));
    }

    #[test]
    fn test_serialized_shape() {
        let value = SerializedPropertyValue::new(json!(["a", "b"]), "array");
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, json!({"value": ["a", "b"], "type": "array"}));

        let writes = PropertyValuesToWrite::new().unset("obsolete");
        assert_eq!(serde_json::to_value(&writes).unwrap(), json!({"obsolete": null}));
    }
}
