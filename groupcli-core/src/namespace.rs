//! Parsed arguments handed to hooks and handlers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Parsed arguments for one dispatch: destination key to JSON value, plus
/// the group and command the tokens resolved to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Namespace {
    group: String,
    command: String,
    values: Map<String, Value>,
}

impl Namespace {
    pub fn new(group: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            command: command.into(),
            values: Map::new(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Present and not `null`.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Deserialize all values into a typed struct.
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.values.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn typed_getters() {
        let mut ns = Namespace::new("my_group", "my_command");
        ns.set("foo", 24);
        ns.set("argument_b", "LSDKFJ");
        ns.set("argument_a", Value::Null);
        ns.set("ratio", 0.5);
        ns.set("verbose", true);

        assert_eq!(ns.get_i64("foo"), Some(24));
        assert_eq!(ns.get_str("foo"), None);
        assert_eq!(ns.get_str("argument_b"), Some("LSDKFJ"));
        assert_eq!(ns.get_f64("ratio"), Some(0.5));
        assert_eq!(ns.get_bool("verbose"), Some(true));
        assert!(!ns.is_set("argument_a"));
        assert!(!ns.is_set("missing"));
        assert_eq!(ns.group(), "my_group");
        assert_eq!(ns.command(), "my_command");
    }

    #[test]
    fn set_replaces_and_returns_previous() {
        let mut ns = Namespace::new("g", "c");
        assert_eq!(ns.set("path", "~/a"), None);
        assert_eq!(ns.set("path", "/home/a"), Some(json!("~/a")));
        assert_eq!(ns.remove("path"), Some(json!("/home/a")));
        assert!(ns.is_empty());
    }

    #[test]
    fn parses_into_struct() {
        #[derive(Deserialize)]
        struct Args {
            foo: i64,
            argument_b: String,
            argument_a: Option<String>,
        }

        let mut ns = Namespace::new("g", "c");
        ns.set("foo", 24);
        ns.set("argument_b", "bar");
        ns.set("argument_a", Value::Null);

        let args: Args = ns.parse().unwrap();
        assert_eq!(args.foo, 24);
        assert_eq!(args.argument_b, "bar");
        assert!(args.argument_a.is_none());
    }
}
