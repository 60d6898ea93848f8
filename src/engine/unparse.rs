use crate::engine::Machine;
use crate::error::Result;
use crate::graph::{Struct, Value, CONS_TAG, NIL_TAG};

const DEBUG_UNPARSE_MAX_DEPTH: usize = 6;
const DEBUG_UNPARSE_MAX_NODES: usize = 200;
const DEBUG_UNPARSE_MAX_ARGS: usize = 6;

const UNPARSE_MAX_NODES: usize = 100_000;

pub fn debug_args(args: &[Value]) -> String {
    let mut out = String::new();
    for (idx, arg) in args.iter().enumerate() {
        if idx >= DEBUG_UNPARSE_MAX_ARGS {
            out.push_str(" ...");
            break;
        }
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(&debug_value(arg));
    }
    out
}

/// Renders a value without forcing anything. Pending thunks print as
/// `<thunk>`, thunks being forced as `<forcing>`.
pub fn debug_value(value: &Value) -> String {
    let mut out = String::new();
    let mut budget = DEBUG_UNPARSE_MAX_NODES;
    debug_value_rec(value, 0, &mut budget, &mut out);
    out
}

fn debug_value_rec(value: &Value, depth: usize, budget: &mut usize, out: &mut String) {
    if *budget == 0 || depth > DEBUG_UNPARSE_MAX_DEPTH {
        out.push_str("...");
        return;
    }
    *budget -= 1;
    match value {
        Value::Char(c) => out.push_str(&format!("{:?}", c)),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Float(x) => out.push_str(&x.to_string()),
        Value::Struct(s) => {
            out.push_str(&format!("#{}", s.tag));
            if s.fields.is_empty() {
                return;
            }
            out.push('(');
            for (idx, field) in s.fields.iter().enumerate() {
                if idx >= DEBUG_UNPARSE_MAX_ARGS {
                    out.push_str(" ...");
                    break;
                }
                if idx > 0 {
                    out.push(' ');
                }
                debug_value_rec(field, depth + 1, budget, out);
            }
            out.push(')');
        }
        Value::Thunk(t) => match t.resolved() {
            Some(result) => debug_value_rec(&result, depth, budget, out),
            None if t.is_forcing() => out.push_str("<forcing>"),
            None => out.push_str("<thunk>"),
        },
    }
}

/// Forces `value` all the way down and renders it: chars as `'c'`, numbers
/// in decimal, character lists as quoted strings and any other struct as
/// `#tag(field ...)`.
pub fn unparse(m: &mut Machine, value: &Value) -> Result<String> {
    enum Item {
        Node(Value),
        Text(&'static str),
    }

    let mut out = String::new();
    let mut budget = UNPARSE_MAX_NODES;
    let mut stack: Vec<Item> = vec![Item::Node(value.clone())];

    while let Some(item) = stack.pop() {
        let node = match item {
            Item::Text(s) => {
                out.push_str(s);
                continue;
            }
            Item::Node(node) => node,
        };
        if budget == 0 {
            out.push_str("...");
            continue;
        }
        budget -= 1;

        match m.force(&node)? {
            Value::Char(c) => out.push_str(&format!("{:?}", c)),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(x) => out.push_str(&x.to_string()),
            Value::Struct(s) => {
                if let Some(text) = realize_char_list(m, &s)? {
                    out.push_str(&format!("{:?}", text));
                    continue;
                }
                out.push_str(&format!("#{}", s.tag));
                if s.fields.is_empty() {
                    continue;
                }
                out.push('(');
                stack.push(Item::Text(")"));
                for (idx, field) in s.fields.iter().enumerate().rev() {
                    stack.push(Item::Node(field.clone()));
                    if idx > 0 {
                        stack.push(Item::Text(" "));
                    }
                }
            }
            // force never returns a thunk
            Value::Thunk(_) => out.push_str("<thunk>"),
        }
    }
    Ok(out)
}

// Some(text) when `s` is a non-empty cons list whose heads are all chars.
fn realize_char_list(m: &mut Machine, s: &Struct) -> Result<Option<String>> {
    let [head, tail] = s.fields.as_slice() else {
        return Ok(None);
    };
    if s.tag != CONS_TAG {
        return Ok(None);
    }
    let mut out = String::new();
    let (mut head, mut tail) = (head.clone(), tail.clone());
    loop {
        match m.force(&head)? {
            Value::Char(c) => out.push(c),
            _ => return Ok(None),
        }
        if out.len() >= UNPARSE_MAX_NODES {
            out.push_str("...");
            return Ok(Some(out));
        }
        let Value::Struct(cell) = m.force(&tail)? else {
            return Ok(None);
        };
        match (cell.tag, cell.fields.as_slice()) {
            (NIL_TAG, []) => return Ok(Some(out)),
            (CONS_TAG, [h, t]) => {
                head = h.clone();
                tail = t.clone();
            }
            _ => return Ok(None),
        }
    }
}
