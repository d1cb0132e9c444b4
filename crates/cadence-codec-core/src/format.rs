use std::collections::BTreeMap;

use crate::channel::Surface;

/// A single typed entry in a [`MediaFormat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    I32(i32),
    Str(String),
    Surface(Surface),
}

/// Opaque key/value format description exchanged with the client.
///
/// Keys are free-form strings ("mime", "channel-count", ...); readers use the
/// typed `find_*` accessors and treat a type mismatch the same as an absent
/// key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaFormat {
    entries: BTreeMap<String, Value>,
}

impl MediaFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_i32(&mut self, key: impl Into<String>, value: i32) {
        self.entries.insert(key.into(), Value::I32(value));
    }

    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::Str(value.into()));
    }

    pub fn set_surface(&mut self, key: impl Into<String>, surface: Surface) {
        self.entries.insert(key.into(), Value::Surface(surface));
    }

    pub fn find_i32(&self, key: &str) -> Option<i32> {
        match self.entries.get(key) {
            Some(Value::I32(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn find_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(Value::Str(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn find_surface(&self, key: &str) -> Option<&Surface> {
        match self.entries.get(key) {
            Some(Value::Surface(surface)) => Some(surface),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
