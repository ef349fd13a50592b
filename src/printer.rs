use crate::heap::Heap;
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Render a value to its canonical text.
pub fn render(val: Value, heap: &Heap, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    render_inner(val, heap, symbols, &mut out, 0);
    out
}

fn render_inner(val: Value, heap: &Heap, symbols: &SymbolTable, out: &mut String, depth: usize) {
    if depth > 1000 {
        out.push_str("...");
        return;
    }

    match val {
        Value::Nil => out.push_str("nil"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Symbol(id) => out.push_str(symbols.name(id)),
        Value::Subr(_) => out.push_str("<subr>"),
        Value::Expr(_) => out.push_str("<expr>"),
        Value::Cons(id) => {
            out.push('(');
            render_inner(heap.car(id), heap, symbols, out, depth + 1);

            let mut current = heap.cdr(id);
            loop {
                match current {
                    Value::Nil => break,
                    Value::Cons(next) => {
                        out.push(' ');
                        render_inner(heap.car(next), heap, symbols, out, depth + 1);
                        current = heap.cdr(next);
                    }
                    tail => {
                        out.push_str(" . ");
                        render_inner(tail, heap, symbols, out, depth + 1);
                        break;
                    }
                }
            }
            out.push(')');
        }
    }
}
