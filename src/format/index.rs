use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::format::FormatId;

/// Bidirectional identifier <-> [`FormatId`] mapping of one scheme
///
/// Ids are handed out densely in first-seen order and are never reassigned or
/// removed. The only way to forget an id is to start a new index.
///
/// # Serialization
/// Persisted as the two parallel maps `forward` and `reverse`.
/// On load the counter is restored to `max(reverse.keys()) + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FormatIndexRepr", into = "FormatIndexRepr")]
pub struct FormatIndex {
    forward: IndexMap<Box<str>, FormatId>,
    reverse: IndexMap<FormatId, Box<str>>,
    counter: FormatId,
}

impl FormatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `identifier`, assigning the next free id if it is unseen
    #[inline]
    pub fn ensure(&mut self, identifier: &str) -> FormatId {
        if let Some(&id) = self.forward.get(identifier) {
            return id;
        }
        let id = self.counter;
        self.forward.insert(Box::from(identifier), id);
        self.reverse.insert(id, Box::from(identifier));
        self.counter += 1;
        id
    }

    #[inline]
    pub fn get(&self, identifier: &str) -> Option<FormatId> {
        self.forward.get(identifier).copied()
    }

    /// Identifier behind `id`; total for every id this index ever issued
    #[inline]
    pub fn reverse(&self, id: FormatId) -> Option<&str> {
        self.reverse.get(&id).map(|s| s.as_ref())
    }

    /// Matrix dimension implied by this index (the id counter)
    #[inline]
    pub fn dim(&self) -> usize {
        self.counter as usize
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// (identifier, id) in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&str, FormatId)> {
        self.forward.iter().map(|(k, v)| (k.as_ref(), *v))
    }
}

/// on-disk form of [`FormatIndex`]
#[derive(Serialize, Deserialize)]
struct FormatIndexRepr {
    forward: IndexMap<String, FormatId>,
    reverse: BTreeMap<FormatId, String>,
}

impl From<FormatIndexRepr> for FormatIndex {
    fn from(repr: FormatIndexRepr) -> Self {
        // counter は reverse の最大キー + 1 から復元する
        let counter = repr.reverse.keys().max().map_or(0, |max| max + 1);
        Self {
            forward: repr.forward.into_iter().map(|(k, v)| (k.into_boxed_str(), v)).collect(),
            reverse: repr.reverse.into_iter().map(|(k, v)| (k, v.into_boxed_str())).collect(),
            counter,
        }
    }
}

impl From<FormatIndex> for FormatIndexRepr {
    fn from(index: FormatIndex) -> Self {
        Self {
            forward: index.forward.into_iter().map(|(k, v)| (k.into_string(), v)).collect(),
            reverse: index.reverse.into_iter().map(|(k, v)| (k, v.into_string())).collect(),
        }
    }
}
