//! Environment frames.
//!
//! An environment is a singly linked chain of frames built out of
//! ordinary cons cells: each frame is `(bindings . parent)`, where
//! `bindings` is an alist of `(symbol . value)` cells and `parent` is
//! the enclosing frame or Nil. Because frames are heap cells, a frame
//! captured by a closure and the same frame seen by a running call
//! share identity: binding and rebinding through either is visible to
//! both.

use crate::error::LispResult;
use crate::heap::Heap;
use crate::symbol::sym;
use crate::value::{CellId, Value};

/// Create a new, empty frame chained onto `parent`.
pub fn new_frame(heap: &mut Heap, parent: Value) -> LispResult<CellId> {
    heap.alloc(Value::Nil, parent)
}

/// Look up a symbol in an environment chain.
///
/// Scans frames innermost-out and, within each frame, bindings from
/// most-recently-added to oldest, so the newest binding of a shadowed
/// name wins. Returns the binding **cell** itself (not a copy of the
/// value) so the caller can mutate the binding in place; None means
/// the symbol is bound nowhere in the chain — which is distinct from
/// being bound to Nil.
pub fn lookup(heap: &Heap, name: Value, env: Value) -> Option<CellId> {
    let mut frame = env;
    while let Value::Cons(frame_id) = frame {
        let mut bindings = heap.car(frame_id);
        while let Value::Cons(entry_id) = bindings {
            if let Value::Cons(binding_id) = heap.car(entry_id) {
                if heap.car(binding_id) == name {
                    return Some(binding_id);
                }
            }
            bindings = heap.cdr(entry_id);
        }
        frame = heap.cdr(frame_id);
    }
    None
}

/// Prepend a `(name . value)` binding to a frame.
///
/// Never deduplicates: binding an already-bound name shadows the older
/// entry within the same frame.
pub fn bind(heap: &mut Heap, name: Value, val: Value, frame: CellId) -> LispResult<()> {
    let binding = heap.alloc(name, val)?;
    let old_bindings = heap.car(frame);
    let entry = heap.alloc(Value::Cons(binding), old_bindings)?;
    heap.set_car(frame, Value::Cons(entry));
    Ok(())
}

/// Set or add a binding in a single frame.
/// If the name is already bound there, mutate its value in place;
/// otherwise prepend a new binding.
pub fn set_in_frame(heap: &mut Heap, name: Value, val: Value, frame: CellId) -> LispResult<()> {
    let frame_val = Value::Cons(frame);
    if let Some(binding) = lookup(heap, name, frame_val) {
        heap.set_cdr(binding, val);
        return Ok(());
    }
    bind(heap, name, val, frame)
}

/// Build the initial global environment frame.
/// Pre-installs `t` (bound to itself) and every primitive.
pub fn build_globals(heap: &mut Heap) -> LispResult<CellId> {
    let frame = new_frame(heap, Value::Nil)?;

    bind(heap, Value::Symbol(sym::T), Value::Symbol(sym::T), frame)?;

    let prim_names = [
        sym::CAR, sym::CDR, sym::CONS, sym::EQ, sym::ATOM,
        sym::NUMBERP, sym::SYMBOLP,
        sym::ADD, sym::MUL, sym::SUB, sym::DIV, sym::MOD,
    ];
    for &name in &prim_names {
        bind(heap, Value::Symbol(name), Value::Subr(name), frame)?;
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;

    #[test]
    fn lookup_returns_the_binding_cell() {
        let mut heap = Heap::new(64);
        let mut symbols = SymbolTable::new();
        let x = Value::Symbol(symbols.intern("x"));
        let frame = new_frame(&mut heap, Value::Nil).unwrap();
        bind(&mut heap, x, Value::Number(1), frame).unwrap();

        let cell = lookup(&heap, x, Value::Cons(frame)).unwrap();
        heap.set_cdr(cell, Value::Number(2));

        let again = lookup(&heap, x, Value::Cons(frame)).unwrap();
        assert_eq!(again, cell);
        assert_eq!(heap.cdr(again), Value::Number(2));
    }

    #[test]
    fn inner_frames_shadow_outer() {
        let mut heap = Heap::new(64);
        let mut symbols = SymbolTable::new();
        let x = Value::Symbol(symbols.intern("x"));

        let outer = new_frame(&mut heap, Value::Nil).unwrap();
        bind(&mut heap, x, Value::Number(1), outer).unwrap();
        let inner = new_frame(&mut heap, Value::Cons(outer)).unwrap();
        bind(&mut heap, x, Value::Number(2), inner).unwrap();

        let cell = lookup(&heap, x, Value::Cons(inner)).unwrap();
        assert_eq!(heap.cdr(cell), Value::Number(2));
    }

    #[test]
    fn newest_binding_wins_within_a_frame() {
        let mut heap = Heap::new(64);
        let mut symbols = SymbolTable::new();
        let x = Value::Symbol(symbols.intern("x"));

        let frame = new_frame(&mut heap, Value::Nil).unwrap();
        bind(&mut heap, x, Value::Number(1), frame).unwrap();
        bind(&mut heap, x, Value::Number(2), frame).unwrap();

        let cell = lookup(&heap, x, Value::Cons(frame)).unwrap();
        assert_eq!(heap.cdr(cell), Value::Number(2));
    }

    #[test]
    fn missing_name_is_none_not_nil() {
        let mut heap = Heap::new(64);
        let mut symbols = SymbolTable::new();
        let x = Value::Symbol(symbols.intern("x"));
        let y = Value::Symbol(symbols.intern("y"));

        let frame = new_frame(&mut heap, Value::Nil).unwrap();
        bind(&mut heap, x, Value::Nil, frame).unwrap();

        assert!(lookup(&heap, x, Value::Cons(frame)).is_some());
        assert!(lookup(&heap, y, Value::Cons(frame)).is_none());
    }
}
