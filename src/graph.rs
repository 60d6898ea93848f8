//! Graph - Runtime Values and Instruction Nodes
//!
//! Every node is shared through `Rc`. Values and code are immutable once
//! built; the only transition the runtime ever makes is a thunk going from
//! pending to forcing to resolved, and it makes it at most once.

use crate::engine::primitives::Operator;
use crate::engine::unparse::debug_value;
use num_bigint::BigInt;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Constructor tag of a `Struct`.
pub type Tag = usize;

/// Environment frame captured by an abstraction. Slot 0 is the first-bound
/// argument.
pub type Env = Rc<[Value]>;

/// Shared instruction node.
pub type CodeRef = Rc<Code>;

pub const NIL_TAG: Tag = 0;
pub const CONS_TAG: Tag = 1;

/// Tag of the sentinel returned when a comparison holds.
pub const TRUE_TAG: Tag = 0;
/// Tag of the sentinel returned when a comparison does not hold.
pub const FALSE_TAG: Tag = 1;

thread_local! {
    static NULLARY: [Value; 2] = [
        Value::Struct(Rc::new(Struct { tag: 0, fields: Vec::new() })),
        Value::Struct(Rc::new(Struct { tag: 1, fields: Vec::new() })),
    ];
}

#[derive(Clone)]
pub enum Value {
    Char(char),
    Int(Rc<BigInt>),
    Float(f64),
    Struct(Rc<Struct>),
    Thunk(Rc<Thunk>),
}

/// A fully applied data constructor.
#[derive(Debug)]
pub struct Struct {
    pub tag: Tag,
    pub fields: Vec<Value>,
}

impl Value {
    pub fn int(n: impl Into<BigInt>) -> Value {
        Value::Int(Rc::new(n.into()))
    }

    pub fn structure(tag: Tag, fields: Vec<Value>) -> Value {
        Value::Struct(Rc::new(Struct { tag, fields }))
    }

    /// A closed thunk: `code` evaluated under an empty frame.
    pub fn thunk(code: CodeRef) -> Value {
        Value::Thunk(Rc::new(Thunk::new(code, empty_env())))
    }

    /// The shared boolean-like sentinel for `holds`.
    pub fn truth(holds: bool) -> Value {
        let tag = if holds { TRUE_TAG } else { FALSE_TAG };
        NULLARY.with(|sentinels| sentinels[tag].clone())
    }

    pub fn nil() -> Value {
        NULLARY.with(|sentinels| sentinels[NIL_TAG].clone())
    }

    pub fn cons(head: Value, tail: Value) -> Value {
        Value::structure(CONS_TAG, vec![head, tail])
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Char(_) => "Char",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Struct(_) => "Struct",
            Value::Thunk(_) => "Thunk",
        }
    }

    /// True for anything but a thunk.
    pub fn is_whnf(&self) -> bool {
        !matches!(self, Value::Thunk(_))
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_thunk(&self) -> Option<&Rc<Thunk>> {
        match self {
            Value::Thunk(t) => Some(t),
            _ => None,
        }
    }

    /// Identity comparison: both values point at the same heap node.
    /// Chars and floats are unboxed and compare by bits.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Int(a), Value::Int(b)) => Rc::ptr_eq(a, b),
            (Value::Struct(a), Value::Struct(b)) => Rc::ptr_eq(a, b),
            (Value::Thunk(a), Value::Thunk(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Int(Rc::new(n))
    }
}

// Structural on data, identity on thunks.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => {
                Rc::ptr_eq(a, b) || (a.tag == b.tag && a.fields == b.fields)
            }
            (Value::Thunk(a), Value::Thunk(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Float(x) => write!(f, "Float({:?})", x),
            Value::Struct(s) => f
                .debug_struct("Struct")
                .field("tag", &s.tag)
                .field("fields", &s.fields)
                .finish(),
            Value::Thunk(t) => fmt::Debug::fmt(&**t, f),
        }
    }
}

/// Builds the nil/cons encoding of `text`.
pub fn string_value(text: &str) -> Value {
    let chars: Vec<char> = text.chars().collect();
    list_value(chars.into_iter().map(Value::Char).collect())
}

/// Builds a nil/cons list of already-built values.
pub fn list_value(items: Vec<Value>) -> Value {
    let mut list = Value::nil();
    for item in items.into_iter().rev() {
        list = Value::cons(item, list);
    }
    list
}

pub fn empty_env() -> Env {
    Rc::from(Vec::new())
}

pub struct Thunk {
    state: RefCell<ThunkState>,
}

enum ThunkState {
    Pending { code: CodeRef, env: Env },
    /// Claimed by a forcing chain that has not finished yet.
    Forcing,
    Resolved(Value),
}

/// What the reducer finds when it reaches a thunk.
pub(crate) enum Entry {
    Resolved(Value),
    Forcing,
    Pending(CodeRef, Env),
}

impl Thunk {
    pub fn new(code: CodeRef, env: Env) -> Self {
        Self {
            state: RefCell::new(ThunkState::Pending { code, env }),
        }
    }

    pub fn resolved(&self) -> Option<Value> {
        match &*self.state.borrow() {
            ThunkState::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.state.borrow(), ThunkState::Resolved(_))
    }

    pub fn is_forcing(&self) -> bool {
        matches!(&*self.state.borrow(), ThunkState::Forcing)
    }

    pub(crate) fn entry(&self) -> Entry {
        match &*self.state.borrow() {
            ThunkState::Pending { code, env } => Entry::Pending(code.clone(), env.clone()),
            ThunkState::Forcing => Entry::Forcing,
            ThunkState::Resolved(value) => Entry::Resolved(value.clone()),
        }
    }

    /// Drops code and env; from here on, reaching this thunk again before
    /// `resolve` is a reentrancy violation.
    pub(crate) fn claim(&self) {
        *self.state.borrow_mut() = ThunkState::Forcing;
    }

    /// Puts a claimed thunk back to pending.
    pub(crate) fn release(&self, code: CodeRef, env: Env) {
        *self.state.borrow_mut() = ThunkState::Pending { code, env };
    }

    pub(crate) fn resolve(&self, value: Value) {
        debug_assert!(value.is_whnf());
        *self.state.borrow_mut() = ThunkState::Resolved(value);
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            ThunkState::Pending { code, .. } => write!(f, "Thunk(<{}>)", code.kind()),
            ThunkState::Forcing => write!(f, "Thunk(<forcing>)"),
            // bounded: resolved thunks can close a cycle
            ThunkState::Resolved(value) => write!(f, "Thunk(= {})", debug_value(value)),
        }
    }
}

/// Instruction node of the compiled graph.
#[derive(Debug)]
pub enum Code {
    Value(Value),
    Operator(Operator),
    Make(Tag),
    Var(usize),
    Global(usize),
    Abstraction { arity: usize, body: CodeRef },
    Application { callee: CodeRef, args: Vec<CodeRef> },
    Switch { scrutinee: CodeRef, branches: Vec<CodeRef> },
}

impl Code {
    pub fn kind(&self) -> &'static str {
        match self {
            Code::Value(_) => "Value",
            Code::Operator(_) => "Operator",
            Code::Make(_) => "Make",
            Code::Var(_) => "Var",
            Code::Global(_) => "Global",
            Code::Abstraction { .. } => "Abstraction",
            Code::Application { .. } => "Application",
            Code::Switch { .. } => "Switch",
        }
    }
}
