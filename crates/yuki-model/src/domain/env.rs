use serde::{Deserialize, Serialize};

use crate::KeyValue;

/// Environment injected into a sync container.
///
/// Keeps insertion order; setting an existing key replaces its value in place so every key appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvSet(Vec<KeyValue>);

impl EnvSet {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|kv| kv.key() == key).map(|kv| kv.value())
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|kv| kv.key() == key) {
            Some(kv) => kv.set_value(value),
            None => self.0.push(KeyValue::new(key, value)),
        }
    }

    /// Set `key` to the decimal rendering of `value`.
    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set(key, value.to_string());
    }

    /// Set `key` to `"true"` or `"false"`.
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }

    /// Render as `KEY=VALUE` strings, the form container runtimes expect.
    pub fn to_strings(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|kv| format!("{}={}", kv.key(), kv.value()))
            .collect()
    }
}

impl Default for EnvSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = EnvSet::new();
        for (k, v) in iter {
            env.set(k, v);
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::EnvSet;

    #[test]
    fn set_replaces_in_place() {
        let mut env = EnvSet::new();
        env.set("FOO", "one");
        env.set("BAR", "x");
        env.set("FOO", "two");

        assert_eq!(env.len(), 2);
        assert_eq!(env.get("FOO"), Some("two"));
        assert_eq!(env.to_strings(), vec!["FOO=two", "BAR=x"]);
    }

    #[test]
    fn typed_setters_render_plain_strings() {
        let mut env = EnvSet::new();
        env.set_int("RETRY", 3);
        env.set_int("LOG_ROTATE_CYCLE", 0);
        env.set_bool("DEBUG", false);

        assert_eq!(env.get("RETRY"), Some("3"));
        assert_eq!(env.get("LOG_ROTATE_CYCLE"), Some("0"));
        assert_eq!(env.get("DEBUG"), Some("false"));
    }

    #[test]
    fn collect_deduplicates_keys() {
        let env: EnvSet = [("A", "1"), ("B", "2"), ("A", "3")].into_iter().collect();
        assert_eq!(env.to_strings(), vec!["A=3", "B=2"]);
    }

    #[test]
    fn serde_transparent_array() {
        let mut env = EnvSet::new();
        env.set("FOO", "bar");

        let json = serde_json::to_string(&env).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"key\":\"FOO\""));
    }
}
