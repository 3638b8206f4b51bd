//! Text-or-absent field maps shared by parameters and remote records.
//!
//! Values enter the core exactly once, through [`FieldMap::from_json`]. That
//! conversion is the only place where a value's type is checked; everything
//! downstream works with `Option<String>` and cannot observe a wrong type.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::validation::ValidationError;

/// Ordered mapping from property name to an optional text value.
///
/// `None` is the absence marker. The same type represents both the parameter
/// map supplied for an operation and the remote record last fetched from the
/// instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: BTreeMap<String, Option<String>>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a JSON object into a field map.
    ///
    /// Every member must be a string or `null`; anything else is reported
    /// with the member name and its JSON type.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ValidationError::NotAnObject {
                    actual: json_type_name(other),
                });
            }
        };

        let mut fields = BTreeMap::new();
        for (name, member) in object {
            let text = match member {
                Value::Null => None,
                Value::String(text) => Some(text.clone()),
                other => {
                    return Err(ValidationError::WrongType {
                        name: name.clone(),
                        actual: json_type_name(other),
                    });
                }
            };
            fields.insert(name.clone(), text);
        }
        Ok(Self { fields })
    }

    /// Value for `name`. A name that is not a key reads as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_deref())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for FieldMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(name, value)| (name.into(), value.map(Into::into)))
            .collect();
        Self { fields }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
