use crate::ast::FieldDecl;
use crate::typ::Type;
use crate::typ::typed::{FieldPlace, LocalSlot, Place};
use rustc_hash::FxHashMap;

/// Name resolution for one unit: block-structured locals over the receiver's fields.
///
/// Slot 0 holds the receiver. Locals take the next free slot when declared and
/// keep it for the rest of the unit, so slots never alias.
#[derive(Debug, Clone)]
pub struct Context {
    scopes: Vec<FxHashMap<String, LocalSlot>>,
    fields: FxHashMap<String, FieldPlace>,
    next_slot: u16,
}

impl Context {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
            fields: FxHashMap::default(),
            next_slot: 1,
        }
    }

    /// Registers a receiver field. Returns `false` if the name is taken.
    pub fn add_field(&mut self, index: u16, field: &FieldDecl) -> bool {
        if self.fields.contains_key(&field.name) {
            return false;
        }
        self.fields.insert(field.name.clone(), FieldPlace { index, ty: field.ty });
        true
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declares a local in the innermost scope. `None` if that scope already has the name.
    pub fn declare(&mut self, name: &str, ty: Type) -> Option<LocalSlot> {
        let scope = self.scopes.last_mut()?;
        if scope.contains_key(name) {
            return None;
        }
        let local = LocalSlot {
            slot: self.next_slot,
            ty,
        };
        // long and double take one slot each in this machine
        self.next_slot = self.next_slot.saturating_add(1);
        scope.insert(name.to_string(), local);
        Some(local)
    }

    /// Innermost local named `name`, else the field of that name.
    pub fn lookup(&self, name: &str) -> Option<Place> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied().map(Place::Local))
            .or_else(|| self.lookup_field(name).map(Place::Field))
    }

    pub fn lookup_field(&self, name: &str) -> Option<FieldPlace> {
        self.fields.get(name).copied()
    }

    pub fn max_locals(&self) -> u16 {
        self.next_slot
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
