use super::Emitter;
use crate::typ::typed::{FieldPlace, LocalSlot, Place};
use crate::vm::Op;

/// The assignable-location protocol.
///
/// A sequence always starts with [`emit_address`](Location::emit_address)
/// and ends with [`emit_store`](Location::emit_store); in between, the held
/// address stays on the stack under whatever `emit_load` pushed.
pub trait Location {
    /// Computes and holds the address.
    fn emit_address(&self, out: &mut dyn Emitter);
    /// Pushes the current value, keeping the address held.
    fn emit_load(&self, out: &mut dyn Emitter);
    /// Copies the value on top so that a copy survives the store.
    fn emit_duplicate(&self, out: &mut dyn Emitter);
    /// Stores the value on top through the held address.
    fn emit_store(&self, out: &mut dyn Emitter);
}

impl Location for LocalSlot {
    fn emit_address(&self, _out: &mut dyn Emitter) {}

    fn emit_load(&self, out: &mut dyn Emitter) {
        out.add(Op::Load(self.ty.storage_kind(), self.slot));
    }

    fn emit_duplicate(&self, out: &mut dyn Emitter) {
        out.add(Op::Dup);
    }

    fn emit_store(&self, out: &mut dyn Emitter) {
        out.add(Op::Store(self.ty.storage_kind(), self.slot));
    }
}

impl Location for FieldPlace {
    fn emit_address(&self, out: &mut dyn Emitter) {
        out.add(Op::LoadThis);
    }

    fn emit_load(&self, out: &mut dyn Emitter) {
        // the receiver is still needed by the store
        out.add(Op::Dup);
        out.add(Op::GetField(self.index));
    }

    fn emit_duplicate(&self, out: &mut dyn Emitter) {
        out.add(Op::DupX1);
    }

    fn emit_store(&self, out: &mut dyn Emitter) {
        out.add(Op::PutField(self.index));
    }
}

impl Place {
    pub fn location(&self) -> &dyn Location {
        match self {
            Place::Local(local) => local as &dyn Location,
            Place::Field(field) => field,
        }
    }
}
