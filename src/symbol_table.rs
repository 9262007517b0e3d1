//! Lexically scoped name resolution. Each compiler scope gets its own
//! `SymbolTable`, enclosing the one belonging to the scope it's nested in.
//!
//! There is deliberately no fourth scope for a function's own name: doing
//! anything useful with it would require an instruction that loads the
//! currently-executing function back onto the stack, and the instruction
//! set has none. A recursive top-level `let` already works without it —
//! its global binding exists before the function's body compiles.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    store: HashMap<String, Symbol>,
    num_definitions: u16,
    outer: Option<Box<SymbolTable>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            store: HashMap::new(),
            num_definitions: 0,
            outer: Some(Box::new(outer)),
        }
    }

    /// Discard this (inner) table and hand back the enclosing one it was
    /// built from. Panics if called on a table with no outer — callers are
    /// expected to only call this at the matching `enter_scope`.
    pub fn into_outer(self) -> SymbolTable {
        *self.outer.expect("symbol table has no outer scope to leave to")
    }

    pub fn size(&self) -> u16 {
        self.num_definitions
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_builtin(&mut self, index: u16, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Resolve `name`, searching this table then its outer chain. A symbol
    /// found in an outer table is only usable here if it's `Global` or
    /// `Builtin` — an outer function's own `Local` bindings are not visible
    /// to a nested function literal; closure capture over outer locals is
    /// not supported.
    pub fn resolve(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }
        let outer = self.outer.as_ref()?;
        let symbol = outer.resolve(name)?;
        match symbol.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(symbol),
            SymbolScope::Local => None,
        }
    }
}
