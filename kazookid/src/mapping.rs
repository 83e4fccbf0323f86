use crate::{SubstituteError, Value};

/// Key/value data served by the indexed access of a [Substitute][crate::Substitute].
///
/// Keys are any [Value] and are compared with `==`, entries keep their insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Mapping {
    entries: Vec<(Value, Value)>,
    default: Option<Value>,
}

impl Mapping {
    /// Store `value` under `key`, replacing any previous value.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, stored)) => Some(std::mem::replace(stored, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Configure the value returned by [get][Self::get] for absent keys.
    pub fn set_default(&mut self, default: Value) {
        self.default = Some(default);
    }

    /// Value stored under `key`, or the configured default.
    ///
    /// Fails with [SubstituteError::MissingKey] if the key is absent and no default is set.
    pub fn get(&self, key: &Value) -> Result<Value, SubstituteError> {
        self.lookup(key)
            .or_else(|| self.default.clone())
            .ok_or_else(|| SubstituteError::MissingKey(format!("{key:?}")))
    }

    /// Value stored under `key`, or the given fallback (absent value if none).
    ///
    /// The configured default is not consulted.
    pub fn get_or(&self, key: &Value, fallback: Option<Value>) -> Value {
        self.lookup(key).or(fallback).unwrap_or_default()
    }

    /// Check if a value is stored under `key`.
    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    fn lookup(&self, key: &Value) -> Option<Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_stored_value() {
        let mut mapping = Mapping::default();
        mapping.insert(Value::from("k"), Value::Int(1));

        assert_eq!(Ok(Value::Int(1)), mapping.get(&Value::from("k")));
        assert!(mapping.contains_key(&Value::from("k")));
    }

    #[test]
    fn insert_replaces_previous_value_in_place() {
        let mut mapping = Mapping::default();
        assert_eq!(None, mapping.insert(Value::Int(1), Value::from("a")));

        let previous = mapping.insert(Value::Int(1), Value::from("b"));

        assert_eq!(Some(Value::from("a")), previous);
        assert_eq!(1, mapping.entries.len());
        assert_eq!(Ok(Value::from("b")), mapping.get(&Value::Int(1)));
    }

    #[test]
    fn get_absent_key_without_default_fails() {
        let mapping = Mapping::default();

        assert_eq!(
            Err(SubstituteError::MissingKey("\"missing\"".to_string())),
            mapping.get(&Value::from("missing"))
        );
        assert!(!mapping.contains_key(&Value::from("missing")));
    }

    #[test]
    fn get_absent_key_with_default_returns_default() {
        let mut mapping = Mapping::default();
        mapping.set_default(Value::from("D"));

        assert_eq!(Ok(Value::from("D")), mapping.get(&Value::from("missing")));
    }

    #[test]
    fn get_or_prefers_stored_value_then_fallback() {
        let mut mapping = Mapping::default();
        mapping.insert(Value::from("k"), Value::Int(1));
        mapping.set_default(Value::from("D"));

        assert_eq!(
            Value::Int(1),
            mapping.get_or(&Value::from("k"), Some(Value::Int(2)))
        );
        assert_eq!(
            Value::Int(2),
            mapping.get_or(&Value::from("other"), Some(Value::Int(2)))
        );
        assert_eq!(Value::None, mapping.get_or(&Value::from("other"), None));
    }
}
