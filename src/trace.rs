//! # Trace - Reduction Step Recording
//!
//! Optional record of every instruction the reducer dispatches. Enabled per
//! machine with `Machine::enable_trace`; used by tests and when debugging a
//! compiled graph.

use crate::graph::Code;

/// Which instruction a reduction step dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Value,
    Operator,
    Make,
    Var,
    Global,
    Abstraction,
    Application,
    Switch,
}

impl From<&Code> for StepKind {
    fn from(code: &Code) -> Self {
        match code {
            Code::Value(_) => StepKind::Value,
            Code::Operator(_) => StepKind::Operator,
            Code::Make(_) => StepKind::Make,
            Code::Var(_) => StepKind::Var,
            Code::Global(_) => StepKind::Global,
            Code::Abstraction { .. } => StepKind::Abstraction,
            Code::Application { .. } => StepKind::Application,
            Code::Switch { .. } => StepKind::Switch,
        }
    }
}

/// A single event in the execution trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Position in the trace
    pub step: usize,
    pub kind: StepKind,
    /// Nesting of `force` calls when the step ran
    pub depth: usize,
    /// Pending arguments before the step
    pub stack: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    pub events: Vec<TraceEvent>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: StepKind, depth: usize, stack: usize) {
        let step = self.events.len();
        self.events.push(TraceEvent {
            step,
            kind,
            depth,
            stack,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, kind: StepKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn kinds(&self) -> Vec<StepKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    /// Deepest `force` nesting reached.
    pub fn max_depth(&self) -> usize {
        self.events.iter().map(|e| e.depth).max().unwrap_or(0)
    }
}
