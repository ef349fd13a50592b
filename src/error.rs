use crate::value::Value;
use thiserror::Error;

/// Errors that can occur in the interpreter.
///
/// The message strings are part of the surface contract: the shell
/// prints them inside `<error: ...>`, and user-visible behavior (e.g.
/// "x has no value") is pinned by the integration tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LispError {
    /// Reader found nothing but whitespace.
    #[error("empty input")]
    EmptyInput,

    /// Reader hit a stray `)`. Carries the remaining input text.
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),

    /// Input ended inside an open list.
    #[error("unfinished parenthesis")]
    UnfinishedParen,

    /// Unbound variable, by name.
    #[error("{0} has no value")]
    Unbound(String),

    /// Arithmetic primitive applied to a non-number.
    #[error("wrong type")]
    WrongType,

    /// Attempted to apply a value that is neither subr nor expr.
    #[error("not applicable")]
    NotApplicable,

    /// `/` or `mod` with a zero divisor.
    #[error("division by zero")]
    DividedByZero,

    /// `return` evaluated with no enclosing `loop`.
    #[error("return outside loop")]
    ReturnOutsideLoop,

    /// Cons heap capacity exceeded.
    #[error("heap capacity exceeded")]
    HeapOverflow,

    /// Evaluation exceeded the machine's configured nesting depth.
    #[error("too deeply nested")]
    TooDeep,
}

pub type LispResult<T> = Result<T, LispError>;

/// Non-value outcome of evaluation. Genuine errors and the `return`
/// escape travel on the `Err` side of the evaluator's `Result`, but as
/// distinct arms: an escape can never be mistaken for an error and
/// vice versa. Only `loop` consumes `Return`; everything else
/// propagates it with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Error(LispError),
    /// The non-local escape raised by `return`, carrying the pending
    /// loop value.
    Return(Value),
}

impl From<LispError> for Signal {
    fn from(err: LispError) -> Self {
        Signal::Error(err)
    }
}

/// Result type threaded through eval, apply, and the sequential-body
/// evaluator.
pub type EvalResult<T> = Result<T, Signal>;
