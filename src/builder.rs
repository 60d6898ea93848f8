//! Helpers for building instruction graphs by hand.

use crate::engine::Operator;
use crate::graph::{string_value, Code, CodeRef, Tag, Value};
use num_bigint::BigInt;
use std::rc::Rc;

pub use crate::graph::list_value;

pub fn lit(value: Value) -> CodeRef {
    Rc::new(Code::Value(value))
}

pub fn int(n: impl Into<BigInt>) -> CodeRef {
    lit(Value::int(n))
}

pub fn float(x: f64) -> CodeRef {
    lit(Value::Float(x))
}

pub fn chr(c: char) -> CodeRef {
    lit(Value::Char(c))
}

pub fn string_code(text: &str) -> CodeRef {
    lit(string_value(text))
}

pub fn var(index: usize) -> CodeRef {
    Rc::new(Code::Var(index))
}

pub fn global(index: usize) -> CodeRef {
    Rc::new(Code::Global(index))
}

pub fn op(operator: Operator) -> CodeRef {
    Rc::new(Code::Operator(operator))
}

pub fn make(tag: Tag) -> CodeRef {
    Rc::new(Code::Make(tag))
}

pub fn lam(arity: usize, body: CodeRef) -> CodeRef {
    Rc::new(Code::Abstraction { arity, body })
}

pub fn app(callee: CodeRef, args: Vec<CodeRef>) -> CodeRef {
    Rc::new(Code::Application { callee, args })
}

/// `operator` applied to `args`, first argument first.
pub fn prim(operator: Operator, args: Vec<CodeRef>) -> CodeRef {
    app(op(operator), args)
}

pub fn switch(scrutinee: CodeRef, branches: Vec<CodeRef>) -> CodeRef {
    Rc::new(Code::Switch {
        scrutinee,
        branches,
    })
}

/// A closed thunk, typically a global table entry.
pub fn thunk(code: CodeRef) -> Value {
    Value::thunk(code)
}

pub fn string(text: &str) -> Value {
    string_value(text)
}
