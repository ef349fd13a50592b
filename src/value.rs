use std::fmt;

/// Unique identifier for an interned symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// Index into the cons-cell heap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub u32);

/// Index into the machine's closure table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LambdaId(pub u32);

/// The fundamental Lisp value. 8 bytes: discriminant + payload.
/// Copy semantics — pair data lives in the heap, closure data in the
/// machine's closure table, so equality on `Cons` and `Expr` is identity.
///
/// A primitive (`Subr`) carries the `SymbolId` of its own name; the
/// primitive library dispatches on that id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Nil,
    Number(i64),
    Symbol(SymbolId),
    Cons(CellId),
    Subr(SymbolId),
    Expr(LambdaId),
}

impl Value {
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_cons(self) -> bool {
        matches!(self, Value::Cons(_))
    }

    pub fn as_cons(self) -> Option<CellId> {
        match self {
            Value::Cons(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_symbol(self) -> Option<SymbolId> {
        match self {
            Value::Symbol(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_number(self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns true if this value is an atom (not a cons cell).
    pub fn is_atom(self) -> bool {
        !self.is_cons()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Number(n) => write!(f, "Num({})", n),
            Value::Symbol(id) => write!(f, "Sym({})", id.0),
            Value::Cons(id) => write!(f, "Cons({})", id.0),
            Value::Subr(id) => write!(f, "Subr({})", id.0),
            Value::Expr(id) => write!(f, "Expr({})", id.0),
        }
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.0)
    }
}

impl fmt::Debug for LambdaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LambdaId({})", self.0)
    }
}
