use log::{debug, trace};

use crate::env;
use crate::error::{EvalResult, LispError, LispResult, Signal};
use crate::heap::Heap;
use crate::primitives;
use crate::printer;
use crate::reader;
use crate::symbol::{sym, SymbolTable};
use crate::value::{CellId, LambdaId, Value};

/// A user-defined procedure: parameter list, body expression sequence,
/// and the defining environment. The environment value is a heap frame
/// chain, so every closure built from the same lexical context shares
/// it, and mutation through one is visible through all.
#[derive(Clone, Copy)]
pub struct Lambda {
    pub params: Value,
    pub body: Value,
    pub env: Value,
}

/// The evaluation machine.
///
/// All interpreter state lives here — heap, symbol table, closure
/// table, global environment — so there are no process-wide singletons
/// and two machines never interfere.
pub struct Machine {
    pub heap: Heap,
    pub symbols: SymbolTable,
    lambdas: Vec<Lambda>,

    /// The global environment frame. Created once per machine;
    /// `defun` and unscoped `setq` bind here.
    pub global_env: CellId,

    /// Current and maximum evaluation nesting depth. The limit is a
    /// configuration knob so deep user recursion fails with an error
    /// instead of exhausting the host stack.
    depth: u32,
    max_depth: u32,
}

/// Default cons-heap capacity.
pub const DEFAULT_HEAP_CAPACITY: usize = 1_000_000;

/// Default evaluation nesting depth limit.
pub const DEFAULT_MAX_DEPTH: u32 = 10_000;

impl Machine {
    pub fn new(heap_capacity: usize, max_depth: u32) -> LispResult<Self> {
        let mut heap = Heap::new(heap_capacity);
        let symbols = SymbolTable::new();
        let global_env = env::build_globals(&mut heap)?;

        debug!(
            "machine ready: {} symbols interned, heap capacity {}, max depth {}",
            symbols.count(),
            heap_capacity,
            max_depth
        );

        Ok(Machine {
            heap,
            symbols,
            lambdas: Vec::new(),
            global_env,
            depth: 0,
            max_depth,
        })
    }

    /// Seed a global binding before (or between) evaluations.
    /// An existing binding of the same name is updated in place.
    pub fn define(&mut self, name: &str, val: Value) -> LispResult<()> {
        let name = Value::Symbol(self.symbols.intern(name));
        env::set_in_frame(&mut self.heap, name, val, self.global_env)
    }

    /// The global environment as an environment-chain value.
    pub fn global_chain(&self) -> Value {
        Value::Cons(self.global_env)
    }

    /// Evaluate an expression in the global environment.
    pub fn eval(&mut self, expr: Value) -> LispResult<Value> {
        let env = self.global_chain();
        self.eval_in(expr, env)
    }

    /// Evaluate an expression in a given environment chain.
    ///
    /// This is the public entry point: it resets the depth counter and
    /// translates a `return` that escaped without an enclosing `loop`
    /// into an ordinary error.
    pub fn eval_in(&mut self, expr: Value, env: Value) -> LispResult<Value> {
        self.depth = 0;
        match self.eval_expr(expr, env) {
            Ok(val) => Ok(val),
            Err(Signal::Error(e)) => Err(e),
            Err(Signal::Return(_)) => Err(LispError::ReturnOutsideLoop),
        }
    }

    /// Read and evaluate every expression in a chunk of source text,
    /// returning the value of the last one.
    pub fn eval_str(&mut self, input: &str) -> LispResult<Value> {
        let mut pos = 0;
        let mut result = Value::Nil;
        while let Some((expr, next)) =
            reader::read_one_at(input, pos, &mut self.heap, &mut self.symbols)?
        {
            pos = next;
            result = self.eval(expr)?;
        }
        Ok(result)
    }

    /// Render a value against this machine's heap and symbol table.
    pub fn render(&self, val: Value) -> String {
        printer::render(val, &self.heap, &self.symbols)
    }

    // ========================================================================
    // Core evaluation
    // ========================================================================

    fn eval_expr(&mut self, expr: Value, env: Value) -> EvalResult<Value> {
        self.depth += 1;
        let result = self.eval_dispatch(expr, env);
        self.depth -= 1;
        result
    }

    fn eval_dispatch(&mut self, expr: Value, env: Value) -> EvalResult<Value> {
        if self.depth > self.max_depth {
            return Err(LispError::TooDeep.into());
        }

        match expr {
            // Atoms other than symbols evaluate to themselves.
            Value::Nil | Value::Number(_) | Value::Subr(_) | Value::Expr(_) => Ok(expr),
            Value::Symbol(id) => match env::lookup(&self.heap, expr, env) {
                Some(binding) => Ok(self.heap.cdr(binding)),
                None => Err(LispError::Unbound(self.symbols.name(id).to_string()).into()),
            },
            Value::Cons(id) => {
                let head = self.heap.car(id);
                let rest = self.heap.cdr(id);

                // Special forms are recognized by symbol identity and
                // take priority over any binding of the same name.
                if let Value::Symbol(name) = head {
                    if name == sym::QUOTE {
                        return Ok(self.heap.car_val(rest));
                    } else if name == sym::IF {
                        return self.form_if(rest, env);
                    } else if name == sym::LAMBDA {
                        return self.form_lambda(rest, env);
                    } else if name == sym::DEFUN {
                        return self.form_defun(rest, env);
                    } else if name == sym::SETQ {
                        return self.form_setq(rest, env);
                    } else if name == sym::LOOP {
                        return self.form_loop(rest, env);
                    } else if name == sym::RETURN {
                        return self.form_return(rest, env);
                    }
                }

                let f = self.eval_expr(head, env)?;
                let args = self.evlis(rest, env)?;
                self.apply(f, args)
            }
        }
    }

    // ========================================================================
    // Special forms
    // ========================================================================

    /// (if test then else) — evaluate test; nil selects the else branch
    /// (defaulting to nil), anything else the then branch.
    fn form_if(&mut self, args: Value, env: Value) -> EvalResult<Value> {
        let test = self.eval_expr(self.heap.car_val(args), env)?;
        let rest = self.heap.cdr_val(args);
        let branch = if test.is_nil() {
            self.heap.car_val(self.heap.cdr_val(rest))
        } else {
            self.heap.car_val(rest)
        };
        self.eval_expr(branch, env)
    }

    /// (lambda (params...) body...) — close over the current environment.
    fn form_lambda(&mut self, args: Value, env: Value) -> EvalResult<Value> {
        let params = self.heap.car_val(args);
        let body = self.heap.cdr_val(args);
        Ok(self.make_lambda(params, body, env))
    }

    /// (defun name (params...) body...) — build the closure exactly as
    /// `lambda` would, but bind it under `name` in the global frame no
    /// matter where the defun appears. Yields the name.
    fn form_defun(&mut self, args: Value, env: Value) -> EvalResult<Value> {
        let name = self.heap.car_val(args);
        let rest = self.heap.cdr_val(args);
        let params = self.heap.car_val(rest);
        let body = self.heap.cdr_val(rest);
        let closure = self.make_lambda(params, body, env);
        env::bind(&mut self.heap, name, closure, self.global_env)?;
        Ok(name)
    }

    /// (setq name expr) — evaluate expr, then mutate the existing
    /// binding of `name` wherever the chain holds it; an unbound name
    /// falls through to a fresh binding in the global frame.
    fn form_setq(&mut self, args: Value, env: Value) -> EvalResult<Value> {
        let name = self.heap.car_val(args);
        let val_expr = self.heap.car_val(self.heap.cdr_val(args));
        let val = self.eval_expr(val_expr, env)?;
        match env::lookup(&self.heap, name, env) {
            Some(binding) => self.heap.set_cdr(binding, val),
            None => env::bind(&mut self.heap, name, val, self.global_env)?,
        }
        Ok(val)
    }

    /// (loop body...) — re-run the body until it raises the `return`
    /// escape, then yield the escaped value. Genuine errors propagate.
    fn form_loop(&mut self, body: Value, env: Value) -> EvalResult<Value> {
        loop {
            match self.progn(body, env) {
                Ok(_) => {}
                Err(Signal::Return(val)) => return Ok(val),
                Err(err) => return Err(err),
            }
        }
    }

    /// (return expr) — evaluate the operand and raise the escape
    /// carrying it. The innermost dynamically enclosing `loop` catches
    /// it; without one it surfaces as the "return outside loop" error.
    fn form_return(&mut self, args: Value, env: Value) -> EvalResult<Value> {
        let val = self.eval_expr(self.heap.car_val(args), env)?;
        Err(Signal::Return(val))
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Evaluate an argument list strictly left to right. The first
    /// element that fails aborts the rest; side effects of earlier
    /// elements stand. The result list is accumulated in reverse and
    /// nreversed in place.
    fn evlis(&mut self, list: Value, env: Value) -> EvalResult<Value> {
        let mut acc = Value::Nil;
        let mut rest = list;
        while let Value::Cons(id) = rest {
            let expr = self.heap.car(id);
            let val = self.eval_expr(expr, env)?;
            let cell = self.heap.alloc(val, acc)?;
            acc = Value::Cons(cell);
            rest = self.heap.cdr(id);
        }
        Ok(self.heap.nreverse(acc))
    }

    /// Sequential-body evaluation: each expression in order, value of
    /// the last, nil for an empty body. Any signal — error or the
    /// `return` escape alike — stops the sequence immediately.
    fn progn(&mut self, body: Value, env: Value) -> EvalResult<Value> {
        let mut result = Value::Nil;
        let mut rest = body;
        while let Value::Cons(id) = rest {
            let expr = self.heap.car(id);
            result = self.eval_expr(expr, env)?;
            rest = self.heap.cdr(id);
        }
        Ok(result)
    }

    /// Apply a callable to an already-evaluated argument list.
    fn apply(&mut self, f: Value, args: Value) -> EvalResult<Value> {
        match f {
            Value::Subr(name) => {
                trace!("apply subr {}", self.symbols.name(name));
                primitives::call_primitive(name, args, &mut self.heap).map_err(Signal::from)
            }
            Value::Expr(id) => {
                let Lambda { params, body, env } = self.lambdas[id.0 as usize];
                let frame = self.bind_params(params, args, env)?;
                self.progn(body, Value::Cons(frame))
            }
            _ => Err(LispError::NotApplicable.into()),
        }
    }

    /// Build the call frame for a closure application: parameters and
    /// arguments are paired positionally, stopping at the shorter list.
    /// Extra parameters stay unbound and extra arguments are dropped —
    /// no arity error, by design.
    fn bind_params(&mut self, params: Value, args: Value, env: Value) -> EvalResult<CellId> {
        let frame = env::new_frame(&mut self.heap, env)?;
        let mut p = params;
        let mut a = args;
        while let (Value::Cons(pid), Value::Cons(aid)) = (p, a) {
            let name = self.heap.car(pid);
            let val = self.heap.car(aid);
            env::bind(&mut self.heap, name, val, frame)?;
            p = self.heap.cdr(pid);
            a = self.heap.cdr(aid);
        }
        Ok(frame)
    }

    fn make_lambda(&mut self, params: Value, body: Value, env: Value) -> Value {
        let id = LambdaId(self.lambdas.len() as u32);
        self.lambdas.push(Lambda { params, body, env });
        Value::Expr(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> Machine {
        Machine::new(1 << 16, 512).unwrap()
    }

    fn eval_to_string(m: &mut Machine, input: &str) -> String {
        let val = m.eval_str(input).unwrap();
        m.render(val)
    }

    #[test]
    fn self_evaluating_atoms() {
        let mut m = machine();
        assert_eq!(m.eval_str("42").unwrap(), Value::Number(42));
        assert_eq!(m.eval_str("nil").unwrap(), Value::Nil);
        assert_eq!(m.eval_str("t").unwrap(), Value::Symbol(sym::T));
    }

    #[test]
    fn unbound_symbol_names_itself_in_the_error() {
        let mut m = machine();
        assert_eq!(
            m.eval_str("y"),
            Err(LispError::Unbound("y".to_string()))
        );
    }

    #[test]
    fn quote_returns_operand_unevaluated() {
        let mut m = machine();
        assert_eq!(eval_to_string(&mut m, "'a"), "a");
        assert_eq!(eval_to_string(&mut m, "'(1 2 3)"), "(1 2 3)");
        assert_eq!(eval_to_string(&mut m, "(quote (a b))"), "(a b)");
    }

    #[test]
    fn if_selects_on_nil() {
        let mut m = machine();
        assert_eq!(m.eval_str("(if t 1 2)").unwrap(), Value::Number(1));
        assert_eq!(m.eval_str("(if nil 1 2)").unwrap(), Value::Number(2));
        // Missing else branch defaults to nil.
        assert_eq!(m.eval_str("(if nil 1)").unwrap(), Value::Nil);
        // A failing condition propagates, untouched.
        assert_eq!(
            m.eval_str("(if zzz 1 2)"),
            Err(LispError::Unbound("zzz".to_string()))
        );
    }

    #[test]
    fn arithmetic_application() {
        let mut m = machine();
        assert_eq!(m.eval_str("(+ 1 2 3)").unwrap(), Value::Number(6));
        assert_eq!(m.eval_str("(* 2 3 4)").unwrap(), Value::Number(24));
        assert_eq!(m.eval_str("(- 10 4)").unwrap(), Value::Number(6));
        assert_eq!(m.eval_str("(+ 1 'a)"), Err(LispError::WrongType));
    }

    #[test]
    fn applying_a_non_callable_fails() {
        let mut m = machine();
        assert_eq!(m.eval_str("(1 2 3)"), Err(LispError::NotApplicable));
    }

    #[test]
    fn setq_creates_then_mutates() {
        let mut m = machine();
        assert_eq!(m.eval_str("(setq x 5)").unwrap(), Value::Number(5));
        assert_eq!(m.eval_str("x").unwrap(), Value::Number(5));
        assert_eq!(m.eval_str("(setq x 6)").unwrap(), Value::Number(6));
        assert_eq!(m.eval_str("x").unwrap(), Value::Number(6));
    }

    #[test]
    fn lambda_and_defun() {
        let mut m = machine();
        assert_eq!(
            m.eval_str("((lambda (x) (+ x 1)) 41)").unwrap(),
            Value::Number(42)
        );
        assert_eq!(eval_to_string(&mut m, "(defun sq (n) (* n n))"), "sq");
        assert_eq!(m.eval_str("(sq 5)").unwrap(), Value::Number(25));
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let mut m = machine();
        m.eval_str("(defun make-adder (n) (lambda (x) (+ x n)))")
            .unwrap();
        m.eval_str("(setq add3 (make-adder 3))").unwrap();
        assert_eq!(m.eval_str("(add3 4)").unwrap(), Value::Number(7));
    }

    #[test]
    fn loop_returns_the_escaped_value() {
        let mut m = machine();
        m.eval_str("(setq i 0)").unwrap();
        assert_eq!(
            m.eval_str("(loop (setq i (+ i 1)) (if (eq i 5) (return i)))")
                .unwrap(),
            Value::Number(5)
        );
    }

    #[test]
    fn errors_inside_loop_propagate_as_errors() {
        let mut m = machine();
        assert_eq!(m.eval_str("(loop (+ 1 'a))"), Err(LispError::WrongType));
    }

    #[test]
    fn return_without_loop_is_an_error() {
        let mut m = machine();
        assert_eq!(m.eval_str("(return 1)"), Err(LispError::ReturnOutsideLoop));
    }

    #[test]
    fn arity_mismatch_truncates_silently() {
        let mut m = machine();
        m.eval_str("(defun first (a b) a)").unwrap();
        // Extra arguments are dropped.
        assert_eq!(m.eval_str("(first 1 2 3)").unwrap(), Value::Number(1));
        // Missing parameters stay unbound; touching one is the usual
        // unbound-variable error.
        m.eval_str("(defun second (a b) b)").unwrap();
        assert_eq!(
            m.eval_str("(second 1)"),
            Err(LispError::Unbound("b".to_string()))
        );
    }

    #[test]
    fn depth_limit_catches_runaway_recursion() {
        let mut m = machine();
        m.eval_str("(defun spin (n) (spin (+ n 1)))").unwrap();
        assert_eq!(m.eval_str("(spin 0)"), Err(LispError::TooDeep));
    }

    #[test]
    fn define_seeds_the_global_environment() {
        let mut m = machine();
        m.define("answer", Value::Number(42)).unwrap();
        assert_eq!(m.eval_str("answer").unwrap(), Value::Number(42));
        m.define("answer", Value::Number(43)).unwrap();
        assert_eq!(m.eval_str("answer").unwrap(), Value::Number(43));
    }
}
