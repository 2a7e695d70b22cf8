//! List Module
//!
//! Ordered, internally synchronized sequence used as a list payload.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

// == List ==
/// Stack-ordered list of opaque JSON values.
///
/// Push and pop work on the same end: the last value pushed is the first popped.
/// All access goes through an internal mutex, so a shared handle can be used
/// concurrently without the owning shard's lock.
#[derive(Debug, Default)]
pub struct List {
    items: Mutex<Vec<JsonValue>>,
}

impl List {
    // == Constructor ==
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding `items`, oldest first.
    pub fn from_items(items: Vec<JsonValue>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    // == Push ==
    /// Appends a value to the top of the list, returning the new length.
    pub fn push(&self, value: JsonValue) -> usize {
        let mut items = self.lock();
        items.push(value);
        items.len()
    }

    // == Pop ==
    /// Removes and returns the most recently pushed value.
    pub fn pop(&self) -> Option<JsonValue> {
        self.lock().pop()
    }

    /// Returns a copy of the contents, oldest first.
    pub fn items(&self) -> Vec<JsonValue> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the Vec half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<JsonValue>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Serialize for List {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.lock().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for List {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<JsonValue>::deserialize(deserializer).map(List::from_items)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_list_push() {
        let list = List::new();

        list.push(json!("item1"));
        list.push(json!("item2"));
        list.push(json!("item3"));

        assert_eq!(list.len(), 3);
        assert!(!list.is_empty());
    }

    #[test]
    fn test_list_pop_stack_order() {
        let list = List::new();

        list.push(json!("item1"));
        list.push(json!("item2"));

        assert_eq!(list.pop(), Some(json!("item2")));
        assert_eq!(list.pop(), Some(json!("item1")));
        assert_eq!(list.pop(), None);
    }

    #[test]
    fn test_list_items_oldest_first() {
        let list = List::new();
        list.push(json!("item1"));
        list.push(json!(2));

        assert_eq!(list.items(), vec![json!("item1"), json!(2)]);
    }

    #[test]
    fn test_list_empty() {
        let list = List::new();

        assert_eq!(list.pop(), None);
        assert!(list.items().is_empty());
        assert!(list.is_empty());
    }

    #[test]
    fn test_list_serde_as_array() {
        let list = List::from_items(vec![json!("a"), json!({"n": 1})]);
        let encoded = serde_json::to_string(&list).unwrap();
        assert_eq!(encoded, r#"["a",{"n":1}]"#);

        let decoded: List = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.items(), list.items());
    }

    #[test]
    fn test_list_concurrent_push_pop() {
        let list = Arc::new(List::new());
        let mut handles = Vec::new();

        for t in 0..8 {
            let list = Arc::clone(&list);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    list.push(json!(t * 1000 + i));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(list.len(), 8 * 500);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let list = Arc::clone(&list);
            handles.push(thread::spawn(move || {
                let mut popped = 0;
                while list.pop().is_some() {
                    popped += 1;
                }
                popped
            }));
        }
        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 8 * 500);
        assert!(list.is_empty());
    }

    #[test]
    fn test_push_reports_own_length_under_contention() {
        let list = Arc::new(List::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let list = Arc::clone(&list);
                thread::spawn(move || (0..250).map(|i| list.push(json!([t, i]))).collect::<Vec<_>>())
            })
            .collect();

        let mut lengths: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        lengths.sort_unstable();

        // Every push observed a distinct length
        assert_eq!(lengths, (1..=8 * 250).collect::<Vec<_>>());
    }
}
