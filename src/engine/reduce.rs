use crate::engine::primitives::{apply_binary, apply_unary, Operator};
use crate::engine::types::{record_reduction, record_stack_depth};
use crate::engine::unparse::{debug_args, debug_value};
use crate::engine::Machine;
use crate::error::{ReduceError, Result};
use crate::graph::{Code, CodeRef, Entry, Env, Struct, Thunk, Value};
use crate::trace::StepKind;

use smallvec::SmallVec;
use std::rc::Rc;
use tracing::{debug, trace};

// Claimed thunks with the code and frame they held, for release on a limit.
type Shares = SmallVec<[(Rc<Thunk>, CodeRef, Env); 4]>;

fn lookup(env: &Env, index: usize) -> Result<Value> {
    env.get(index).cloned().ok_or(ReduceError::UnboundVar {
        index,
        frame: env.len(),
    })
}

impl Machine {
    /// Reduces `value` to weak-head normal form. The result is never a thunk.
    pub fn force(&mut self, value: &Value) -> Result<Value> {
        if self.depth >= self.config.depth_limit {
            return Err(ReduceError::DepthLimit {
                limit: self.config.depth_limit,
            });
        }
        self.depth += 1;
        let outermost = self.depth == 1;
        if outermost {
            debug!(
                steps = self.stats.reductions,
                value = %debug_value(value),
                "force begin"
            );
        }

        let mut stack: Vec<Value> = Vec::new();
        let mut shares: Shares = SmallVec::new();
        let result = self.run(value.clone(), &mut stack, &mut shares);
        match &result {
            Ok(value) => {
                if !shares.is_empty() {
                    trace!(thunks = shares.len(), result = %debug_value(value), "memoize");
                }
                for (thunk, _, _) in shares {
                    thunk.resolve(value.clone());
                }
            }
            // a limit says nothing about the graph; leave the chain forceable
            Err(ReduceError::DepthLimit { .. } | ReduceError::StepLimit { .. }) => {
                for (thunk, code, env) in shares {
                    thunk.release(code, env);
                }
            }
            Err(_) => {}
        }

        self.depth -= 1;
        if outermost {
            match &result {
                Ok(value) => debug!(
                    steps = self.stats.reductions,
                    max_stack = self.stats.max_stack,
                    result = %debug_value(value),
                    "force end"
                ),
                Err(err) => debug!(steps = self.stats.reductions, %err, "force failed"),
            }
        }
        result
    }

    fn run(&mut self, mut target: Value, stack: &mut Vec<Value>, shares: &mut Shares) -> Result<Value> {
        'target: loop {
            let thunk = match target {
                Value::Thunk(thunk) => thunk,
                value => {
                    if !stack.is_empty() {
                        return Err(ReduceError::NonEmptyStack {
                            depth: stack.len(),
                            found: value.kind(),
                        });
                    }
                    return Ok(value);
                }
            };

            let (mut code, mut env) = match thunk.entry() {
                Entry::Resolved(value) => {
                    if !stack.is_empty() {
                        return Err(ReduceError::NonEmptyStack {
                            depth: stack.len(),
                            found: value.kind(),
                        });
                    }
                    return Ok(value);
                }
                Entry::Forcing => return Err(ReduceError::Reentrant),
                Entry::Pending(code, env) => (code, env),
            };
            // Only a thunk entered with nothing pending evaluates to its own
            // value; otherwise it is being applied.
            if stack.is_empty() {
                thunk.claim();
                shares.push((thunk, code.clone(), env.clone()));
            }

            loop {
                self.step(&code, stack.len())?;

                code = match &*code {
                    Code::Value(value) => {
                        target = value.clone();
                        continue 'target;
                    }
                    // `dump` may hand back an unevaluated thunk
                    Code::Operator(op) => {
                        target = self.apply_operator(*op, stack)?;
                        continue 'target;
                    }
                    Code::Make(tag) => {
                        let fields = stack.drain(..).rev().collect();
                        return Ok(Value::Struct(Rc::new(Struct { tag: *tag, fields })));
                    }
                    Code::Var(index) => {
                        target = lookup(&env, *index)?;
                        continue 'target;
                    }
                    Code::Global(index) => {
                        target = self.global(*index)?;
                        continue 'target;
                    }
                    Code::Abstraction { arity, body } => {
                        if stack.len() < *arity {
                            return Err(ReduceError::MissingArguments {
                                needed: *arity,
                                available: stack.len(),
                            });
                        }
                        let split = stack.len() - arity;
                        env = stack.drain(split..).rev().collect();
                        body.clone()
                    }
                    Code::Application { callee, args } => {
                        for arg in args.iter().rev() {
                            let pushed = match &**arg {
                                Code::Value(value) => value.clone(),
                                Code::Var(index) => lookup(&env, *index)?,
                                _ => Value::Thunk(Rc::new(Thunk::new(arg.clone(), env.clone()))),
                            };
                            stack.push(pushed);
                        }
                        self.note_stack(stack.len());
                        callee.clone()
                    }
                    Code::Switch { scrutinee, branches } => {
                        let pending = Value::Thunk(Rc::new(Thunk::new(scrutinee.clone(), env.clone())));
                        let forced = self.force(&pending)?;
                        let Value::Struct(matched) = &forced else {
                            return Err(ReduceError::NotAStruct {
                                found: forced.kind(),
                            });
                        };
                        let branch = branches.get(matched.tag).ok_or(ReduceError::BadTag {
                            tag: matched.tag,
                            branches: branches.len(),
                        })?;
                        stack.extend(matched.fields.iter().rev().cloned());
                        self.note_stack(stack.len());
                        branch.clone()
                    }
                };
            }
        }
    }

    fn apply_operator(&mut self, op: Operator, stack: &mut Vec<Value>) -> Result<Value> {
        let arity = op.arity();
        if stack.len() < arity {
            return Err(ReduceError::MissingArguments {
                needed: arity,
                available: stack.len(),
            });
        }
        let operands: SmallVec<[Value; 2]> = stack.drain(stack.len() - arity..).rev().collect();
        trace!(op = %op, args = %debug_args(&operands), "apply");
        match operands.as_slice() {
            [x] => apply_unary(self, op, x),
            [x, y] => apply_binary(self, op, x, y),
            _ => Err(ReduceError::WrongArity {
                op: op.name(),
                arity,
            }),
        }
    }

    fn step(&mut self, code: &Code, stack: usize) -> Result<()> {
        self.stats.reductions += 1;
        record_reduction();
        if let Some(limit) = self.config.step_limit {
            if self.stats.reductions > limit {
                return Err(ReduceError::StepLimit { limit });
            }
        }
        trace!(step = self.stats.reductions, kind = code.kind(), stack, depth = self.depth, "dispatch");
        if let Some(trace) = &mut self.trace {
            trace.record(StepKind::from(code), self.depth, stack);
        }
        Ok(())
    }

    fn note_stack(&mut self, depth: usize) {
        if depth > self.stats.max_stack {
            self.stats.max_stack = depth;
        }
        record_stack_depth(depth);
    }
}
