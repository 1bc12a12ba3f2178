//! Symbol identities shared by every namespace.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Method,
    Field,
}

impl SymbolKind {
    /// Ranking weight used by search: classes outrank methods, methods outrank fields.
    pub fn weight(self) -> u8 {
        match self {
            SymbolKind::Class => 3,
            SymbolKind::Method => 2,
            SymbolKind::Field => 1,
        }
    }
}

/// One class, method or field in one namespace. Two ids are the same symbol iff every
/// field is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId {
    pub name: String,
    /// Internal (slash separated) name of the owning class, empty for classes.
    pub owner: String,
    pub descriptor: String,
    pub kind: SymbolKind,
}

impl SymbolId {
    pub fn class(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            descriptor: descriptor.into(),
            kind: SymbolKind::Class,
        }
    }

    pub fn method(
        name: impl Into<String>,
        owner: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            descriptor: descriptor.into(),
            kind: SymbolKind::Method,
        }
    }

    pub fn field(
        name: impl Into<String>,
        owner: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            descriptor: descriptor.into(),
            kind: SymbolKind::Field,
        }
    }

    pub fn is_class(&self) -> bool {
        self.kind == SymbolKind::Class
    }
}

/// An origin-namespace symbol and its counterpart in the target namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPair {
    pub origin: SymbolId,
    pub target: SymbolId,
}

impl SymbolPair {
    pub fn new(origin: SymbolId, target: SymbolId) -> Self {
        Self { origin, target }
    }
}

/// Finished parse output: exactly one target per origin symbol.
pub type SymbolPairs = HashMap<SymbolId, SymbolId>;

/// Collects pairs in order; a later pair for the same origin replaces the earlier one.
pub fn into_pair_map(pairs: impl IntoIterator<Item = SymbolPair>) -> SymbolPairs {
    let mut map = SymbolPairs::new();
    for pair in pairs {
        map.insert(pair.origin, pair.target);
    }
    map
}

/// Identifies one (artifact version, namespace) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    pub version: String,
    pub namespace: String,
}

impl TaskKey {
    pub fn new(version: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.version)
    }
}
