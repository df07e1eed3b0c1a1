//! Grammar state: the production-name → body-AST mapping plus the start
//! symbol (`spec.md` §3).

use crate::ast::NodeRef;
use std::collections::HashMap;

/// Maps production names to body ASTs, preserving declaration order (used
/// only for deterministic diagnostics — correctness never depends on
/// iteration order).
#[derive(Debug, Default)]
pub struct GrammarState {
    start_symbol: String,
    order: Vec<String>,
    map: HashMap<String, NodeRef>,
}

impl GrammarState {
    pub fn new() -> Self {
        GrammarState::default()
    }

    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    pub fn set_start_symbol(&mut self, name: impl Into<String>) {
        self.start_symbol = name.into();
    }

    /// Inserts a production. Returns `false` if the name was already
    /// present (the caller reports `DefinedProduction` in that case).
    pub fn insert(&mut self, name: impl Into<String>, body: NodeRef) -> bool {
        let name = name.into();
        if self.map.contains_key(&name) {
            return false;
        }
        self.order.push(name.clone());
        self.map.insert(name, body);
        true
    }

    /// Installs or overwrites a production unconditionally. Used for
    /// internally synthesised productions (the space non-terminal, repeat
    /// non-terminals, the start-symbol whitespace wrapper) where the
    /// uniqueness check in [`insert`](Self::insert) doesn't apply.
    pub fn set(&mut self, name: impl Into<String>, body: NodeRef) {
        let name = name.into();
        if !self.map.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.map.insert(name, body);
    }

    pub fn get(&self, name: &str) -> Option<&NodeRef> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates productions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeRef)> {
        self.order.iter().map(move |name| (name.as_str(), &self.map[name]))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }
}
