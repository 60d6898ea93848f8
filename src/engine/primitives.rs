use crate::engine::Machine;
use crate::error::{ReduceError, Result};
use crate::graph::{string_value, Value};

use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

/// Primitive operator ids, in the order the compiler numbers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    CharInt,
    CharInc,
    CharDec,
    CharAdd,
    CharSub,
    CharEq,
    CharNeq,
    CharLess,
    CharLessEq,
    CharMore,
    CharMoreEq,

    IntChar,
    IntFloat,
    IntString,
    IntNeg,
    IntAbs,
    IntInc,
    IntDec,
    IntAdd,
    IntSub,
    IntMul,
    IntDiv,
    IntMod,
    IntExp,
    IntEq,
    IntNeq,
    IntLess,
    IntLessEq,
    IntMore,
    IntMoreEq,

    FloatInt,
    FloatString,
    FloatNeg,
    FloatAbs,
    FloatInc,
    FloatDec,
    FloatAdd,
    FloatSub,
    FloatMul,
    FloatDiv,
    FloatMod,
    FloatExp,
    FloatEq,
    FloatNeq,
    FloatLess,
    FloatLessEq,
    FloatMore,
    FloatMoreEq,

    StringInt,
    StringFloat,

    Error,
    Dump,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Comparison {
    Eq,
    Neq,
    Less,
    LessEq,
    More,
    MoreEq,
}

impl Comparison {
    fn holds<T: PartialOrd + ?Sized>(self, a: &T, b: &T) -> bool {
        match self {
            Comparison::Eq => a == b,
            Comparison::Neq => a != b,
            Comparison::Less => a < b,
            Comparison::LessEq => a <= b,
            Comparison::More => a > b,
            Comparison::MoreEq => a >= b,
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown operator `{0}`")]
pub struct UnknownOperator(pub String);

impl Operator {
    pub const ALL: [Operator; 52] = [
        Operator::CharInt,
        Operator::CharInc,
        Operator::CharDec,
        Operator::CharAdd,
        Operator::CharSub,
        Operator::CharEq,
        Operator::CharNeq,
        Operator::CharLess,
        Operator::CharLessEq,
        Operator::CharMore,
        Operator::CharMoreEq,
        Operator::IntChar,
        Operator::IntFloat,
        Operator::IntString,
        Operator::IntNeg,
        Operator::IntAbs,
        Operator::IntInc,
        Operator::IntDec,
        Operator::IntAdd,
        Operator::IntSub,
        Operator::IntMul,
        Operator::IntDiv,
        Operator::IntMod,
        Operator::IntExp,
        Operator::IntEq,
        Operator::IntNeq,
        Operator::IntLess,
        Operator::IntLessEq,
        Operator::IntMore,
        Operator::IntMoreEq,
        Operator::FloatInt,
        Operator::FloatString,
        Operator::FloatNeg,
        Operator::FloatAbs,
        Operator::FloatInc,
        Operator::FloatDec,
        Operator::FloatAdd,
        Operator::FloatSub,
        Operator::FloatMul,
        Operator::FloatDiv,
        Operator::FloatMod,
        Operator::FloatExp,
        Operator::FloatEq,
        Operator::FloatNeq,
        Operator::FloatLess,
        Operator::FloatLessEq,
        Operator::FloatMore,
        Operator::FloatMoreEq,
        Operator::StringInt,
        Operator::StringFloat,
        Operator::Error,
        Operator::Dump,
    ];

    pub fn from_id(id: u32) -> Option<Operator> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn arity(self) -> usize {
        match self {
            Operator::CharInt
            | Operator::CharInc
            | Operator::CharDec
            | Operator::IntChar
            | Operator::IntFloat
            | Operator::IntString
            | Operator::IntNeg
            | Operator::IntAbs
            | Operator::IntInc
            | Operator::IntDec
            | Operator::FloatInt
            | Operator::FloatString
            | Operator::FloatNeg
            | Operator::FloatAbs
            | Operator::FloatInc
            | Operator::FloatDec
            | Operator::StringInt
            | Operator::StringFloat
            | Operator::Error => 1,
            _ => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::CharInt => "char->int",
            Operator::CharInc => "inc/char",
            Operator::CharDec => "dec/char",
            Operator::CharAdd => "+/char",
            Operator::CharSub => "-/char",
            Operator::CharEq => "==/char",
            Operator::CharNeq => "!=/char",
            Operator::CharLess => "</char",
            Operator::CharLessEq => "<=/char",
            Operator::CharMore => ">/char",
            Operator::CharMoreEq => ">=/char",

            Operator::IntChar => "int->char",
            Operator::IntFloat => "int->float",
            Operator::IntString => "int->string",
            Operator::IntNeg => "neg/int",
            Operator::IntAbs => "abs/int",
            Operator::IntInc => "inc/int",
            Operator::IntDec => "dec/int",
            Operator::IntAdd => "+/int",
            Operator::IntSub => "-/int",
            Operator::IntMul => "*/int",
            Operator::IntDiv => "//int",
            Operator::IntMod => "%/int",
            Operator::IntExp => "^/int",
            Operator::IntEq => "==/int",
            Operator::IntNeq => "!=/int",
            Operator::IntLess => "</int",
            Operator::IntLessEq => "<=/int",
            Operator::IntMore => ">/int",
            Operator::IntMoreEq => ">=/int",

            Operator::FloatInt => "float->int",
            Operator::FloatString => "float->string",
            Operator::FloatNeg => "neg/float",
            Operator::FloatAbs => "abs/float",
            Operator::FloatInc => "inc/float",
            Operator::FloatDec => "dec/float",
            Operator::FloatAdd => "+/float",
            Operator::FloatSub => "-/float",
            Operator::FloatMul => "*/float",
            Operator::FloatDiv => "//float",
            Operator::FloatMod => "%/float",
            Operator::FloatExp => "^/float",
            Operator::FloatEq => "==/float",
            Operator::FloatNeq => "!=/float",
            Operator::FloatLess => "</float",
            Operator::FloatLessEq => "<=/float",
            Operator::FloatMore => ">/float",
            Operator::FloatMoreEq => ">=/float",

            Operator::StringInt => "string->int",
            Operator::StringFloat => "string->float",

            Operator::Error => "error",
            Operator::Dump => "dump",
        }
    }

    fn comparison(self) -> Option<Comparison> {
        match self {
            Operator::CharEq | Operator::IntEq | Operator::FloatEq => Some(Comparison::Eq),
            Operator::CharNeq | Operator::IntNeq | Operator::FloatNeq => Some(Comparison::Neq),
            Operator::CharLess | Operator::IntLess | Operator::FloatLess => Some(Comparison::Less),
            Operator::CharLessEq | Operator::IntLessEq | Operator::FloatLessEq => {
                Some(Comparison::LessEq)
            }
            Operator::CharMore | Operator::IntMore | Operator::FloatMore => Some(Comparison::More),
            Operator::CharMoreEq | Operator::IntMoreEq | Operator::FloatMoreEq => {
                Some(Comparison::MoreEq)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        static BY_NAME: OnceLock<FxHashMap<&'static str, Operator>> = OnceLock::new();
        let table = BY_NAME.get_or_init(|| Operator::ALL.iter().map(|op| (op.name(), *op)).collect());
        table
            .get(s)
            .copied()
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

fn expect_char(op: Operator, v: &Value) -> Result<char> {
    match v {
        Value::Char(c) => Ok(*c),
        other => Err(shape(op, "Char", other)),
    }
}

fn expect_int(op: Operator, v: &Value) -> Result<&BigInt> {
    match v {
        Value::Int(n) => Ok(n),
        other => Err(shape(op, "Int", other)),
    }
}

fn expect_float(op: Operator, v: &Value) -> Result<f64> {
    match v {
        Value::Float(x) => Ok(*x),
        other => Err(shape(op, "Float", other)),
    }
}

fn shape(op: Operator, expected: &'static str, found: &Value) -> ReduceError {
    ReduceError::OperandShape {
        op: op.name(),
        expected,
        found: found.kind(),
    }
}

/// Low 32 bits of `n`, two's complement.
pub fn low_i32(n: &BigInt) -> i32 {
    let mut bytes = n.to_signed_bytes_le();
    let fill = if n.is_negative() { 0xff } else { 0x00 };
    if bytes.len() < 4 {
        bytes.resize(4, fill);
    }
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn char_from_code(code: i64) -> Result<char> {
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or(ReduceError::InvalidChar(code))
}

fn shift_char(c: char, delta: i64) -> Result<Value> {
    char_from_code(c as i64 + delta).map(Value::Char)
}

/// Euclidean quotient and remainder: `0 <= r < |y|`.
pub fn div_mod_euclid(x: &BigInt, y: &BigInt) -> (BigInt, BigInt) {
    let mut q = x / y;
    let mut r = x % y;
    if r.is_negative() {
        if y.is_positive() {
            q -= 1u32;
            r += y;
        } else {
            q += 1u32;
            r -= y;
        }
    }
    (q, r)
}

fn int_pow(base: &BigInt, exponent: &BigInt) -> Result<BigInt> {
    if !exponent.is_positive() {
        return Ok(BigInt::one());
    }
    if let Some(e) = exponent.to_u32() {
        return Ok(base.pow(e));
    }
    if base.is_zero() || base.is_one() {
        return Ok(base.clone());
    }
    if *base == BigInt::from(-1) {
        let even = (exponent % 2u32).is_zero();
        return Ok(if even { BigInt::one() } else { base.clone() });
    }
    Err(ReduceError::ExponentTooLarge(exponent.clone()))
}

/// Floored modulo, sign follows the divisor.
pub fn float_mod(x: f64, y: f64) -> f64 {
    x - y * (x / y).floor()
}

fn parse_int(text: &str) -> BigInt {
    match text.trim().parse::<BigInt>() {
        Ok(n) => n,
        Err(err) => {
            warn!(text, %err, "string->int: malformed number, using 0");
            BigInt::zero()
        }
    }
}

fn parse_float(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(x) => x,
        Err(err) => {
            warn!(text, %err, "string->float: malformed number, using 0");
            0.0
        }
    }
}

pub fn apply_unary(m: &mut Machine, op: Operator, x: &Value) -> Result<Value> {
    match op {
        Operator::CharInt => Ok(Value::int(expect_char(op, x)? as u32)),
        Operator::CharInc => shift_char(expect_char(op, x)?, 1),
        Operator::CharDec => shift_char(expect_char(op, x)?, -1),

        Operator::IntChar => char_from_code(low_i32(expect_int(op, x)?) as i64).map(Value::Char),
        Operator::IntFloat => {
            let n = expect_int(op, x)?;
            Ok(Value::Float(n.to_f64().unwrap_or(f64::NAN)))
        }
        Operator::IntString => Ok(string_value(&expect_int(op, x)?.to_string())),
        Operator::IntNeg => Ok(Value::from(-expect_int(op, x)?)),
        Operator::IntAbs => Ok(Value::from(expect_int(op, x)?.abs())),
        Operator::IntInc => Ok(Value::from(expect_int(op, x)? + 1u32)),
        Operator::IntDec => Ok(Value::from(expect_int(op, x)? - 1u32)),

        Operator::FloatInt => {
            let value = expect_float(op, x)?;
            BigInt::from_f64(value.floor())
                .map(Value::from)
                .ok_or(ReduceError::NonFinite { op: op.name(), value })
        }
        Operator::FloatString => Ok(string_value(&expect_float(op, x)?.to_string())),
        Operator::FloatNeg => Ok(Value::Float(-expect_float(op, x)?)),
        Operator::FloatAbs => Ok(Value::Float(expect_float(op, x)?.abs())),
        Operator::FloatInc => Ok(Value::Float(expect_float(op, x)? + 1.0)),
        Operator::FloatDec => Ok(Value::Float(expect_float(op, x)? - 1.0)),

        Operator::StringInt => {
            let text = m.realize_string(x)?;
            Ok(Value::from(parse_int(&text)))
        }
        Operator::StringFloat => {
            let text = m.realize_string(x)?;
            Ok(Value::Float(parse_float(&text)))
        }

        Operator::Error => {
            let message = m.realize_string(x)?;
            m.write_diagnostic(&format!("ERROR: {}", message))?;
            Err(ReduceError::Raised(message))
        }

        _ => Err(ReduceError::WrongArity {
            op: op.name(),
            arity: op.arity(),
        }),
    }
}

pub fn apply_binary(m: &mut Machine, op: Operator, x: &Value, y: &Value) -> Result<Value> {
    if let Some(cmp) = op.comparison() {
        let holds = match op {
            Operator::CharEq
            | Operator::CharNeq
            | Operator::CharLess
            | Operator::CharLessEq
            | Operator::CharMore
            | Operator::CharMoreEq => cmp.holds(&expect_char(op, x)?, &expect_char(op, y)?),
            Operator::IntEq
            | Operator::IntNeq
            | Operator::IntLess
            | Operator::IntLessEq
            | Operator::IntMore
            | Operator::IntMoreEq => cmp.holds(expect_int(op, x)?, expect_int(op, y)?),
            _ => cmp.holds(&expect_float(op, x)?, &expect_float(op, y)?),
        };
        return Ok(Value::truth(holds));
    }

    match op {
        Operator::CharAdd => {
            let delta = low_i32(expect_int(op, y)?) as i64;
            shift_char(expect_char(op, x)?, delta)
        }
        Operator::CharSub => {
            let delta = low_i32(expect_int(op, y)?) as i64;
            shift_char(expect_char(op, x)?, -delta)
        }

        Operator::IntAdd => Ok(Value::from(expect_int(op, x)? + expect_int(op, y)?)),
        Operator::IntSub => Ok(Value::from(expect_int(op, x)? - expect_int(op, y)?)),
        Operator::IntMul => Ok(Value::from(expect_int(op, x)? * expect_int(op, y)?)),
        Operator::IntDiv | Operator::IntMod => {
            let (a, b) = (expect_int(op, x)?, expect_int(op, y)?);
            if b.is_zero() {
                return Err(ReduceError::DivisionByZero { op: op.name() });
            }
            let (q, r) = div_mod_euclid(a, b);
            Ok(Value::from(if op == Operator::IntDiv { q } else { r }))
        }
        Operator::IntExp => Ok(Value::from(int_pow(expect_int(op, x)?, expect_int(op, y)?)?)),

        Operator::FloatAdd => Ok(Value::Float(expect_float(op, x)? + expect_float(op, y)?)),
        Operator::FloatSub => Ok(Value::Float(expect_float(op, x)? - expect_float(op, y)?)),
        Operator::FloatMul => Ok(Value::Float(expect_float(op, x)? * expect_float(op, y)?)),
        Operator::FloatDiv => Ok(Value::Float(expect_float(op, x)? / expect_float(op, y)?)),
        Operator::FloatMod => Ok(Value::Float(float_mod(
            expect_float(op, x)?,
            expect_float(op, y)?,
        ))),
        Operator::FloatExp => Ok(Value::Float(expect_float(op, x)?.powf(expect_float(op, y)?))),

        Operator::Dump => {
            let message = m.realize_string(x)?;
            m.write_diagnostic(&message)?;
            Ok(y.clone())
        }

        _ => Err(ReduceError::WrongArity {
            op: op.name(),
            arity: op.arity(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_table_round_trip() {
        for (id, op) in Operator::ALL.iter().enumerate() {
            assert_eq!(op.id() as usize, id);
            assert_eq!(Operator::from_id(id as u32), Some(*op));
            assert_eq!(op.name().parse::<Operator>().unwrap(), *op);
        }
        assert_eq!(Operator::from_id(52), None);
        assert!("+/str".parse::<Operator>().is_err());
    }

    #[test]
    fn test_operator_arities() {
        assert_eq!(Operator::CharInt.arity(), 1);
        assert_eq!(Operator::CharAdd.arity(), 2);
        assert_eq!(Operator::IntString.arity(), 1);
        assert_eq!(Operator::IntExp.arity(), 2);
        assert_eq!(Operator::StringFloat.arity(), 1);
        assert_eq!(Operator::Error.arity(), 1);
        assert_eq!(Operator::Dump.arity(), 2);
        let unary = Operator::ALL.iter().filter(|op| op.arity() == 1).count();
        assert_eq!(unary, 19);
    }

    #[test]
    fn test_low_i32_truncation() {
        assert_eq!(low_i32(&BigInt::from(65)), 65);
        assert_eq!(low_i32(&BigInt::from(-1)), -1);
        assert_eq!(low_i32(&(BigInt::from(1u64 << 32) + 97)), 97);
        assert_eq!(low_i32(&BigInt::from(i64::MIN)), 0);
    }

    #[test]
    fn test_div_mod_euclid_signs() {
        let cases = [(7, 2, 3, 1), (-7, 2, -4, 1), (7, -2, -3, 1), (-7, -2, 4, 1), (6, 3, 2, 0)];
        for (x, y, q, r) in cases {
            let (qq, rr) = div_mod_euclid(&BigInt::from(x), &BigInt::from(y));
            assert_eq!((qq, rr), (BigInt::from(q), BigInt::from(r)), "{} / {}", x, y);
        }
    }

    #[test]
    fn test_int_pow_edges() {
        let two = BigInt::from(2);
        assert_eq!(int_pow(&two, &BigInt::from(10)).unwrap(), BigInt::from(1024));
        assert_eq!(int_pow(&two, &BigInt::from(-3)).unwrap(), BigInt::one());
        assert_eq!(int_pow(&two, &BigInt::zero()).unwrap(), BigInt::one());
        let huge = BigInt::from(u64::MAX);
        assert_eq!(int_pow(&BigInt::from(-1), &huge).unwrap(), BigInt::from(-1));
        assert_eq!(int_pow(&BigInt::zero(), &huge).unwrap(), BigInt::zero());
        assert!(matches!(
            int_pow(&two, &huge),
            Err(ReduceError::ExponentTooLarge(_))
        ));
    }

    #[test]
    fn test_float_mod_follows_divisor() {
        assert_eq!(float_mod(5.5, 2.0), 1.5);
        assert_eq!(float_mod(-5.5, 2.0), 0.5);
        assert_eq!(float_mod(5.5, -2.0), -0.5);
    }

    #[test]
    fn test_parse_fallbacks() {
        assert_eq!(parse_int(" -42 "), BigInt::from(-42));
        assert_eq!(parse_int("4x2"), BigInt::zero());
        assert_eq!(parse_float("2.5"), 2.5);
        assert_eq!(parse_float("two"), 0.0);
    }
}
