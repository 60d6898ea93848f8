//! # Engine - Call-by-Need Reduction
//!
//! A `Machine` owns the global table and forces values to weak-head normal
//! form. Each outermost `force` runs on its own pending-argument stack;
//! thunks reached along the way are memoized with the final value.

pub mod primitives;
pub mod reduce;
pub mod types;
pub mod unparse;


pub use primitives::{apply_binary, apply_unary, Operator, UnknownOperator};
pub use types::{
    max_stack_depth, set_depth_limit_override, set_step_limit_override, total_reductions,
    ReduceConfig, Stats,
};
pub use unparse::{debug_value, unparse};

use crate::error::{ReduceError, Result};
use crate::graph::{empty_env, CodeRef, Thunk, Value, NIL_TAG};
use crate::trace::ExecutionTrace;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

pub struct Machine {
    globals: Rc<[Value]>,
    config: ReduceConfig,
    stats: Stats,
    depth: usize,
    diagnostics: Box<dyn Write>,
    trace: Option<ExecutionTrace>,
}

impl Machine {
    /// Limits come from the environment, diagnostics go to stderr.
    pub fn new(globals: Vec<Value>) -> Self {
        Self::with_config(globals, ReduceConfig::from_env())
    }

    pub fn with_config(globals: Vec<Value>, config: ReduceConfig) -> Self {
        Self {
            globals: Rc::from(globals),
            config,
            stats: Stats::default(),
            depth: 0,
            diagnostics: Box::new(io::stderr()),
            trace: None,
        }
    }

    /// Redirects `dump` and `error` output.
    pub fn set_diagnostics(&mut self, sink: Box<dyn Write>) {
        self.diagnostics = sink;
    }

    pub fn config(&self) -> &ReduceConfig {
        &self.config
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    pub fn enable_trace(&mut self) {
        self.trace = Some(ExecutionTrace::new());
    }

    pub fn take_trace(&mut self) -> Option<ExecutionTrace> {
        self.trace.take()
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    pub fn global(&self, index: usize) -> Result<Value> {
        self.globals
            .get(index)
            .cloned()
            .ok_or(ReduceError::UnknownGlobal {
                index,
                len: self.globals.len(),
            })
    }

    /// Forces a root code graph under an empty frame.
    pub fn eval(&mut self, code: &CodeRef) -> Result<Value> {
        let root = Value::Thunk(Rc::new(Thunk::new(code.clone(), empty_env())));
        self.force(&root)
    }

    /// Forces a nil/cons list of characters into a host string, one cell at
    /// a time.
    pub fn realize_string(&mut self, value: &Value) -> Result<String> {
        let mut out = String::new();
        let mut cell = self.force(value)?;
        loop {
            let Value::Struct(s) = &cell else {
                return Err(ReduceError::OperandShape {
                    op: "string",
                    expected: "Struct",
                    found: cell.kind(),
                });
            };
            if s.tag == NIL_TAG {
                return Ok(out);
            }
            let [head, tail] = s.fields.as_slice() else {
                return Err(ReduceError::MissingArguments {
                    needed: 2,
                    available: s.fields.len(),
                });
            };
            match self.force(head)? {
                Value::Char(c) => out.push(c),
                other => {
                    return Err(ReduceError::OperandShape {
                        op: "string",
                        expected: "Char",
                        found: other.kind(),
                    })
                }
            }
            let next = self.force(tail)?;
            cell = next;
        }
    }

    pub(crate) fn write_diagnostic(&mut self, line: &str) -> Result<()> {
        writeln!(self.diagnostics, "{}", line)?;
        self.diagnostics.flush()?;
        Ok(())
    }
}

/// In-memory diagnostic sink. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
