use serde::{Deserialize, Serialize};

/// An ordered key/value bag, matching the repeated `(key, val)` field the
/// original protocol carries on the wire. Lookups are first-match-wins:
/// duplicate keys are legal, the earliest entry shadows later ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs(Vec<(String, String)>);

impl Attrs {
    pub fn new() -> Self {
        Attrs(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.0.push((key.into(), val.into()));
    }

    pub fn with(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.push(key, val);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for Attrs {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Attrs(iter.into_iter().collect())
    }
}
