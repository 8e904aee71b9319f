use std::fmt;
use std::sync::Arc;

use crate::provider::{ContextProvider, DataProvider};

/// Insertion-ordered map from unique keys to shared values.
pub struct KeyedMap<T: ?Sized> {
    entries: Vec<(String, Arc<T>)>,
}

/// Ordered provider key -> data provider mapping.
pub type Pipeline = KeyedMap<dyn DataProvider>;
/// Ordered key -> context provider mapping.
pub type ContextProviders = KeyedMap<dyn ContextProvider>;

impl<T: ?Sized> KeyedMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace; a replaced entry keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Arc<T>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<T>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<T>> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Arc<T>) -> bool) {
        self.entries.retain(|(key, value)| keep(key, value));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn key_list(&self) -> Vec<String> {
        self.keys().map(str::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for KeyedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for KeyedMap<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for KeyedMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

impl<T: ?Sized> FromIterator<(String, Arc<T>)> for KeyedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, Arc<T>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}
