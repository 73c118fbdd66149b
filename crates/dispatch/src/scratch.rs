//! Request scoped storage shared between middleware and the handler of a single request.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

type Value = Box<dyn Any + Send + Sync>;

/// A string keyed map of arbitrary values, created empty for every request.
///
/// Middleware write into it, the handler reads from it. It is owned by exactly one request and
/// dropped together with the request's [`Context`](crate::Context).
#[derive(Default)]
pub struct Scratch {
    entries: HashMap<String, Value>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning `true` if a previous value was replaced.
    pub fn insert<V>(&mut self, key: impl Into<String>, value: V) -> bool
    where
        V: Any + Send + Sync,
    {
        self.entries.insert(key.into(), Box::new(value)).is_some()
    }

    /// Returns the value under `key` if it exists and has type `V`.
    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.entries.get(key).and_then(|value| value.downcast_ref::<V>())
    }

    pub fn get_mut<V: Any>(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key).and_then(|value| value.downcast_mut::<V>())
    }

    /// Removes the value under `key` if it has type `V`; a value of another type is left in place.
    pub fn remove<V: Any>(&mut self, key: &str) -> Option<V> {
        if !self.entries.get(key).is_some_and(|value| value.is::<V>()) {
            return None;
        }

        self.entries.remove(key).and_then(|value| value.downcast::<V>().ok()).map(|value| *value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Scratch;

    #[test]
    fn insert_and_get_typed() {
        let mut scratch = Scratch::new();
        assert!(scratch.is_empty());

        assert!(!scratch.insert("t", 1_i32));
        assert_eq!(scratch.get::<i32>("t"), Some(&1));
        assert_eq!(scratch.get::<String>("t"), None);
        assert_eq!(scratch.get::<i32>("missing"), None);
        assert_eq!(scratch.len(), 1);
    }

    #[test]
    fn insert_replaces_value_of_any_type() {
        let mut scratch = Scratch::new();
        scratch.insert("user", 7_u64);

        assert!(scratch.insert("user", "alice".to_string()));
        assert_eq!(scratch.get::<u64>("user"), None);
        assert_eq!(scratch.get::<String>("user").map(String::as_str), Some("alice"));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut scratch = Scratch::new();
        scratch.insert("hits", vec![1_u8]);

        scratch.get_mut::<Vec<u8>>("hits").unwrap().push(2);
        assert_eq!(scratch.get::<Vec<u8>>("hits"), Some(&vec![1, 2]));
    }

    #[test]
    fn remove_checks_type_first() {
        let mut scratch = Scratch::new();
        scratch.insert("t", 1_i32);

        assert_eq!(scratch.remove::<u8>("t"), None);
        assert!(scratch.contains_key("t"));

        assert_eq!(scratch.remove::<i32>("t"), Some(1));
        assert!(!scratch.contains_key("t"));
        assert!(scratch.is_empty());
    }

    #[test]
    fn debug_lists_keys() {
        let mut scratch = Scratch::new();
        scratch.insert("only", ());
        assert_eq!(format!("{scratch:?}"), "{\"only\"}");
    }
}
