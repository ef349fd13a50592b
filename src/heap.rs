use crate::error::{LispError, LispResult};
use crate::value::{CellId, Value};

/// A single cons cell on the heap.
pub struct ConsCell {
    pub car: Value,
    pub cdr: Value,
}

/// The cons cell heap. All pairs are allocated here.
/// CellId is an index into `cells`; a cell's identity is stable for the
/// life of the heap, so mutation through one handle is visible through
/// every other handle to the same cell.
pub struct Heap {
    cells: Vec<ConsCell>,
    capacity: usize,
}

impl Heap {
    pub fn new(capacity: usize) -> Self {
        Heap {
            cells: Vec::with_capacity(1024),
            capacity,
        }
    }

    /// Allocate a new cons cell. Returns a CellId.
    /// Returns Err(HeapOverflow) if capacity is exceeded.
    pub fn alloc(&mut self, car: Value, cdr: Value) -> LispResult<CellId> {
        if self.cells.len() >= self.capacity {
            return Err(LispError::HeapOverflow);
        }
        let id = CellId(self.cells.len() as u32);
        self.cells.push(ConsCell { car, cdr });
        Ok(id)
    }

    /// Get the car of a cell.
    #[inline]
    pub fn car(&self, id: CellId) -> Value {
        self.cells[id.0 as usize].car
    }

    /// Get the cdr of a cell.
    #[inline]
    pub fn cdr(&self, id: CellId) -> Value {
        self.cells[id.0 as usize].cdr
    }

    /// Set the car of a cell in place.
    #[inline]
    pub fn set_car(&mut self, id: CellId, val: Value) {
        self.cells[id.0 as usize].car = val;
    }

    /// Set the cdr of a cell in place.
    #[inline]
    pub fn set_cdr(&mut self, id: CellId, val: Value) {
        self.cells[id.0 as usize].cdr = val;
    }

    /// Total car: the car of a cons, or Nil for any atom.
    #[inline]
    pub fn car_val(&self, val: Value) -> Value {
        match val {
            Value::Cons(id) => self.car(id),
            _ => Value::Nil,
        }
    }

    /// Total cdr: the cdr of a cons, or Nil for any atom.
    #[inline]
    pub fn cdr_val(&self, val: Value) -> Value {
        match val {
            Value::Cons(id) => self.cdr(id),
            _ => Value::Nil,
        }
    }

    /// Destructively reverse a list by walking it and flipping each
    /// cell's cdr pointer. No cells are allocated or copied: every
    /// outstanding handle to a cell of the old list observes the new
    /// linkage. An improper tail is dropped, as with classic nreverse.
    pub fn nreverse(&mut self, list: Value) -> Value {
        let mut current = list;
        let mut reversed = Value::Nil;
        while let Value::Cons(id) = current {
            let next = self.cdr(id);
            self.set_cdr(id, reversed);
            reversed = current;
            current = next;
        }
        reversed
    }

    /// Build a proper list from a slice of values.
    pub fn list(&mut self, values: &[Value]) -> LispResult<Value> {
        let mut result = Value::Nil;
        for &val in values.iter().rev() {
            let cell = self.alloc(val, result)?;
            result = Value::Cons(cell);
        }
        Ok(result)
    }

    /// Collect a proper list into a Vec. Returns None if not a proper list.
    pub fn list_to_vec(&self, val: Value) -> Option<Vec<Value>> {
        let mut result = Vec::new();
        let mut current = val;
        loop {
            match current {
                Value::Nil => return Some(result),
                Value::Cons(id) => {
                    result.push(self.car(id));
                    current = self.cdr(id);
                }
                _ => return None,
            }
        }
    }

    /// Number of allocated cells.
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }
}
