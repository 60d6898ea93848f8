use crate::graph::Tag;
use num_bigint::BigInt;
use thiserror::Error;

/// Everything that can stop a reduction.
///
/// All variants but `Raised` mean the compiled graph broke its contract
/// with the runtime. None of them is recovered from inside the engine; they
/// travel out of the outermost `force` and the host terminates.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("non-empty stack at value return ({depth} pending argument(s) under a {found})")]
    NonEmptyStack { depth: usize, found: &'static str },
    #[error("infinite reduction: thunk re-entered while it is being forced")]
    Reentrant,
    #[error("not enough arguments on stack: needed {needed}, found {available}")]
    MissingArguments { needed: usize, available: usize },
    #[error("variable {index} is outside a frame of {frame} value(s)")]
    UnboundVar { index: usize, frame: usize },
    #[error("global {index} is outside a table of {len} value(s)")]
    UnknownGlobal { index: usize, len: usize },
    #[error("constructor tag {tag} has no branch (switch has {branches})")]
    BadTag { tag: Tag, branches: usize },
    #[error("switch scrutinee reduced to {found}, expected a struct")]
    NotAStruct { found: &'static str },
    #[error("{op}: expected {expected} operand, found {found}")]
    OperandShape {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{op}: operator has arity {arity}")]
    WrongArity { op: &'static str, arity: usize },
    #[error("code point {0} is not a valid character")]
    InvalidChar(i64),
    #[error("{op}: division by zero")]
    DivisionByZero { op: &'static str },
    #[error("{op}: operand {value} is not finite")]
    NonFinite { op: &'static str, value: f64 },
    #[error("^/int: exponent {0} is too large")]
    ExponentTooLarge(BigInt),
    #[error("nesting depth limit of {limit} exceeded")]
    DepthLimit { limit: usize },
    #[error("step limit of {limit} reductions exceeded")]
    StepLimit { limit: u64 },
    #[error("failed to write diagnostics: {0}")]
    Diagnostics(#[from] std::io::Error),
    /// The `error` primitive fired. Its message has already been written to
    /// the diagnostic stream.
    #[error("ERROR: {0}")]
    Raised(String),
}

impl ReduceError {
    pub fn is_contract_violation(&self) -> bool {
        !matches!(
            self,
            ReduceError::Raised(_)
                | ReduceError::Diagnostics(_)
                | ReduceError::DepthLimit { .. }
                | ReduceError::StepLimit { .. }
        )
    }

    /// Process exit status a host should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReduceError::Raised(_) => 1,
            _ => 70,
        }
    }
}

pub type Result<T, E = ReduceError> = std::result::Result<T, E>;
