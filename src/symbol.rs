use crate::value::SymbolId;
use std::collections::HashMap;

/// Interned symbol table. Each unique symbol name maps to a unique SymbolId.
/// `(eq 'foo 'foo)` is true because both reads resolve to the same id.
pub struct SymbolTable {
    name_to_id: HashMap<String, SymbolId>,
    id_to_name: Vec<String>,
}

/// Well-known symbol IDs, pre-interned at startup.
/// These must match the order of interning in SymbolTable::new().
#[allow(non_upper_case_globals)]
pub mod sym {
    use crate::value::SymbolId;

    pub const T: SymbolId = SymbolId(0);
    // Special forms
    pub const QUOTE: SymbolId = SymbolId(1);
    pub const IF: SymbolId = SymbolId(2);
    pub const LAMBDA: SymbolId = SymbolId(3);
    pub const DEFUN: SymbolId = SymbolId(4);
    pub const SETQ: SymbolId = SymbolId(5);
    pub const LOOP: SymbolId = SymbolId(6);
    pub const RETURN: SymbolId = SymbolId(7);
    // Primitive names
    pub const CAR: SymbolId = SymbolId(8);
    pub const CDR: SymbolId = SymbolId(9);
    pub const CONS: SymbolId = SymbolId(10);
    pub const EQ: SymbolId = SymbolId(11);
    pub const ATOM: SymbolId = SymbolId(12);
    pub const NUMBERP: SymbolId = SymbolId(13);
    pub const SYMBOLP: SymbolId = SymbolId(14);
    pub const ADD: SymbolId = SymbolId(15);
    pub const MUL: SymbolId = SymbolId(16);
    pub const SUB: SymbolId = SymbolId(17);
    pub const DIV: SymbolId = SymbolId(18);
    pub const MOD: SymbolId = SymbolId(19);
}

impl SymbolTable {
    /// Create a new symbol table with all well-known symbols pre-interned.
    /// The order MUST match the constants in the `sym` module above.
    pub fn new() -> Self {
        let names = [
            "t",
            "quote", "if", "lambda", "defun", "setq", "loop", "return",
            "car", "cdr", "cons", "eq", "atom", "numberp", "symbolp",
            "+", "*", "-", "/", "mod",
        ];

        let mut name_to_id = HashMap::new();
        let mut id_to_name = Vec::new();

        for (i, name) in names.iter().enumerate() {
            let id = SymbolId(i as u32);
            name_to_id.insert(name.to_string(), id);
            id_to_name.push(name.to_string());
        }

        SymbolTable {
            name_to_id,
            id_to_name,
        }
    }

    /// Intern a symbol name. Returns the existing ID if already interned,
    /// or creates a new one.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = SymbolId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        id
    }

    /// Look up a symbol name by its ID.
    pub fn name(&self, id: SymbolId) -> &str {
        &self.id_to_name[id.0 as usize]
    }

    /// Look up a symbol ID by name, without interning.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.name_to_id.get(name).copied()
    }

    /// Total number of interned symbols.
    pub fn count(&self) -> usize {
        self.id_to_name.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
