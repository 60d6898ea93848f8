//! Ready-made programs, used by the binary and the tests.

use crate::builder::*;
use crate::engine::Operator;
use crate::graph::{CodeRef, Value, CONS_TAG, NIL_TAG};

pub struct Program {
    pub globals: Vec<Value>,
    pub root: CodeRef,
}

impl Program {
    pub fn closed(root: CodeRef) -> Self {
        Self {
            globals: Vec::new(),
            root,
        }
    }
}

// Upper-cases the char in frame slot 0 when it is in 'a'..='z'.
fn upper_char() -> CodeRef {
    let lowered = switch(
        prim(Operator::CharLessEq, vec![var(0), chr('z')]),
        vec![prim(Operator::CharSub, vec![var(0), int(32)]), var(0)],
    );
    switch(
        prim(Operator::CharMoreEq, vec![var(0), chr('a')]),
        vec![lowered, var(0)],
    )
}

/// Global 0 maps ASCII lower-case letters of a string to upper case, lazily,
/// one cons cell at a time.
pub fn upper_program(text: &str) -> Program {
    let cons_branch = lam(
        2,
        app(
            make(CONS_TAG),
            vec![upper_char(), app(global(0), vec![var(1)])],
        ),
    );
    let upper = lam(1, switch(var(0), vec![make(NIL_TAG), cons_branch]));
    Program {
        globals: vec![thunk(upper)],
        root: app(global(0), vec![string_code(text)]),
    }
}

/// Writes `message` to diagnostics and evaluates to `value`.
pub fn dump_program(message: &str, value: i64) -> Program {
    Program::closed(prim(Operator::Dump, vec![string_code(message), int(value)]))
}

pub fn error_program(message: &str) -> Program {
    Program::closed(prim(Operator::Error, vec![string_code(message)]))
}

pub fn pow_program(base: i64, exponent: i64) -> Program {
    Program::closed(prim(Operator::IntExp, vec![int(base), int(exponent)]))
}

/// Picks the larger of two integers through a comparison and a switch.
pub fn max_program(a: i64, b: i64) -> Program {
    Program::closed(switch(
        prim(Operator::IntMore, vec![int(a), int(b)]),
        vec![int(a), int(b)],
    ))
}

/// A global defined as itself.
pub fn self_loop_program() -> Program {
    Program {
        globals: vec![thunk(global(0))],
        root: global(0),
    }
}

/// A tail call that never returns and never grows the stack.
pub fn spin_program() -> Program {
    Program {
        globals: vec![thunk(lam(1, app(global(0), vec![var(0)])))],
        root: app(global(0), vec![int(0)]),
    }
}

/// Non-tail recursion through a switch scrutinee, one nested force per level.
pub fn nest_program() -> Program {
    let body = switch(app(global(0), vec![var(0)]), vec![make(NIL_TAG)]);
    Program {
        globals: vec![thunk(lam(1, body))],
        root: app(global(0), vec![int(0)]),
    }
}
