//! Generative round-trip properties for the reader and printer.

use proptest::prelude::*;

use minilisp::heap::Heap;
use minilisp::printer::render;
use minilisp::reader::{read_one_at, read_str};
use minilisp::symbol::SymbolTable;

/// A host-side s-expression used to drive generation. `text` produces
/// the canonical rendering, which reading and re-rendering must fix.
#[derive(Debug, Clone)]
enum Sexp {
    Num(i64),
    Sym(String),
    List(Vec<Sexp>),
}

impl Sexp {
    fn text(&self) -> String {
        match self {
            Sexp::Num(n) => n.to_string(),
            Sexp::Sym(s) => s.clone(),
            // The empty list IS nil; that is its canonical text.
            Sexp::List(elems) if elems.is_empty() => "nil".to_string(),
            Sexp::List(elems) => {
                let inner: Vec<String> = elems.iter().map(Sexp::text).collect();
                format!("({})", inner.join(" "))
            }
        }
    }
}

fn sexp_strategy() -> impl Strategy<Value = Sexp> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Sexp::Num),
        "[a-z][a-z0-9-]{0,7}"
            .prop_filter("the atom nil reads as the empty list", |s| s != "nil")
            .prop_map(Sexp::Sym),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Sexp::List)
    })
}

proptest! {
    /// Reading the canonical text of any well-formed expression and
    /// rendering the result reproduces that text exactly.
    #[test]
    fn read_render_round_trip(sexp in sexp_strategy()) {
        let text = sexp.text();
        let mut heap = Heap::new(1 << 16);
        let mut symbols = SymbolTable::new();
        let val = read_str(&text, &mut heap, &mut symbols).unwrap();
        prop_assert_eq!(render(val, &heap, &symbols), text);
    }

    /// Whitespace between and around expressions never changes what is
    /// read, and `read_one_at` consumes exactly one expression per call.
    #[test]
    fn read_one_at_walks_a_sequence(
        sexps in prop::collection::vec(sexp_strategy(), 1..5),
        pad in "[ \t\n]{0,3}",
    ) {
        let chunk: String = sexps
            .iter()
            .map(|s| format!("{}{}{}", pad, s.text(), pad))
            .collect::<Vec<_>>()
            .join(" ");

        let mut heap = Heap::new(1 << 16);
        let mut symbols = SymbolTable::new();
        let mut pos = 0;
        let mut seen = Vec::new();
        while let Some((val, next)) =
            read_one_at(&chunk, pos, &mut heap, &mut symbols).unwrap()
        {
            seen.push(render(val, &heap, &symbols));
            pos = next;
        }

        let expected: Vec<String> = sexps.iter().map(Sexp::text).collect();
        prop_assert_eq!(seen, expected);
    }
}
