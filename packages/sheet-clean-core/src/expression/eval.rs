//! Interpreter for compiled filter expressions.
//!
//! Values follow the loose scripting semantics generated expressions are
//! written for: missing fields are `undefined`, comparisons coerce numeric
//! strings, and any value has a truthiness.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::parsers::parse_leading_number;
use crate::row::{format_float, Row};

use super::parser::{BinaryOp, Expr, Function, Method, UnaryOp};

/// Runtime value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Val {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Val>),
    Object(Map<String, Value>),
}

/// Evaluation failure for one row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("cannot read '{member}' of {target}")]
    NullAccess { member: String, target: &'static str },
    #[error("'{method}' is not available on {target}")]
    BadReceiver {
        method: &'static str,
        target: &'static str,
    },
    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<&Value> for Val {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Val::Null,
            Value::Bool(b) => Val::Bool(*b),
            Value::Number(n) => Val::Num(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Val::Str(s.clone()),
            Value::Array(items) => Val::List(items.iter().map(Val::from).collect()),
            Value::Object(map) => Val::Object(map.clone()),
        }
    }
}

impl Val {
    fn type_name(&self) -> &'static str {
        match self {
            Val::Undefined => "undefined",
            Val::Null => "null",
            Val::Bool(_) => "boolean",
            Val::Num(_) => "number",
            Val::Str(_) => "string",
            Val::List(_) => "array",
            Val::Object(_) => "object",
        }
    }

    fn is_nullish(&self) -> bool {
        matches!(self, Val::Undefined | Val::Null)
    }

    pub(crate) fn truthy(&self) -> bool {
        match self {
            Val::Undefined | Val::Null => false,
            Val::Bool(b) => *b,
            Val::Num(n) => *n != 0.0 && !n.is_nan(),
            Val::Str(s) => !s.is_empty(),
            Val::List(_) | Val::Object(_) => true,
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Val::Undefined => f64::NAN,
            Val::Null => 0.0,
            Val::Bool(b) => f64::from(u8::from(*b)),
            Val::Num(n) => *n,
            Val::Str(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Val::List(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
            Val::Object(_) => f64::NAN,
        }
    }

    fn to_text(&self) -> String {
        match self {
            Val::Undefined => "undefined".to_string(),
            Val::Null => "null".to_string(),
            Val::Bool(b) => b.to_string(),
            Val::Num(n) if n.is_nan() => "NaN".to_string(),
            Val::Num(n) => format_float(*n),
            Val::Str(s) => s.clone(),
            Val::List(items) => items
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_text() })
                .collect::<Vec<_>>()
                .join(","),
            Val::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Text of a scalar receiver; `undefined`/`null` cannot receive methods.
    fn receiver_text(&self, method: &'static str) -> Result<String, EvalError> {
        match self {
            Val::Str(s) => Ok(s.clone()),
            Val::Num(_) | Val::Bool(_) => Ok(self.to_text()),
            other => Err(EvalError::BadReceiver {
                method,
                target: other.type_name(),
            }),
        }
    }
}

/// Loose equality: nullish values equal each other, numbers compare
/// numerically against numeric strings and booleans.
fn loose_eq(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Val::Str(a), Val::Str(b)) => a == b,
        (Val::Bool(a), Val::Bool(b)) => a == b,
        (Val::List(_) | Val::Object(_), _) | (_, Val::List(_) | Val::Object(_)) => left == right,
        (a, b) => {
            let (x, y) = (a.to_number(), b.to_number());
            !x.is_nan() && x == y
        }
    }
}

fn relational(op: BinaryOp, left: &Val, right: &Val) -> bool {
    if let (Val::Str(a), Val::Str(b)) = (left, right) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
    }
    let (a, b) = (left.to_number(), right.to_number());
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Clamps a JS-style index argument into `0..=len`; negative counts from the end
/// when `from_end` is set.
fn index_arg(value: Option<&Val>, len: usize, default: usize, from_end: bool) -> usize {
    let Some(value) = value.filter(|v| !matches!(v, Val::Undefined)) else {
        return default;
    };
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        if from_end {
            len.saturating_sub((-n) as usize)
        } else {
            0
        }
    } else {
        (n as usize).min(len)
    }
}

pub(crate) struct Evaluator<'r> {
    row: &'r Row,
}

impl<'r> Evaluator<'r> {
    pub(crate) fn new(row: &'r Row) -> Self {
        Self { row }
    }

    pub(crate) fn eval(&self, expr: &Expr) -> Result<Val, EvalError> {
        Ok(match expr {
            Expr::Literal(v) => v.clone(),
            Expr::Row => Val::Object(self.row.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            Expr::Field(name) => match self.row.get(name) {
                Some(value) => Val::from(value),
                None if self.row.has_key(name) => Val::Null,
                None => Val::Undefined,
            },
            Expr::Member(base, name) => member(self.eval(base)?, name)?,
            Expr::Index(base, index) => {
                let base = self.eval(base)?;
                let index = self.eval(index)?;
                let position = match index {
                    Val::Num(n) if n >= 0.0 && n.fract() == 0.0 => Some(n as usize),
                    _ => None,
                };
                match (base, position) {
                    (Val::List(items), Some(i)) => items.get(i).cloned().unwrap_or(Val::Undefined),
                    (Val::Str(s), Some(i)) => s
                        .chars()
                        .nth(i)
                        .map_or(Val::Undefined, |c| Val::Str(c.to_string())),
                    (base, _) => member(base, &index.to_text())?,
                }
            }
            Expr::Array(items) => Val::List(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Val::Bool(!value.truthy()),
                    UnaryOp::Neg => Val::Num(-value.to_number()),
                    UnaryOp::Plus => Val::Num(value.to_number()),
                }
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if left.truthy() {
                    self.eval(right)?
                } else {
                    left
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if left.truthy() {
                    left
                } else {
                    self.eval(right)?
                }
            }
            Expr::Conditional(test, then, otherwise) => {
                if self.eval(test)?.truthy() {
                    self.eval(then)?
                } else {
                    self.eval(otherwise)?
                }
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right)
            }
            Expr::Call(function, args) => {
                let args = self.eval_args(args)?;
                call(*function, &args)?
            }
            Expr::Method(receiver, method, args) => {
                let receiver = self.eval(receiver)?;
                let args = self.eval_args(args)?;
                call_method(&receiver, *method, &args)?
            }
        })
    }

    fn eval_args(&self, args: &[Expr]) -> Result<Vec<Val>, EvalError> {
        args.iter().map(|a| self.eval(a)).collect()
    }
}

fn member(base: Val, name: &str) -> Result<Val, EvalError> {
    match base {
        Val::Undefined | Val::Null => Err(EvalError::NullAccess {
            member: name.to_string(),
            target: base.type_name(),
        }),
        Val::Object(map) => Ok(map.get(name).map_or(Val::Undefined, Val::from)),
        Val::Str(s) if name == "length" => Ok(Val::Num(s.chars().count() as f64)),
        Val::List(items) if name == "length" => Ok(Val::Num(items.len() as f64)),
        _ => Ok(Val::Undefined),
    }
}

fn binary(op: BinaryOp, left: &Val, right: &Val) -> Val {
    match op {
        BinaryOp::Eq => Val::Bool(loose_eq(left, right)),
        BinaryOp::Ne => Val::Bool(!loose_eq(left, right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            Val::Bool(relational(op, left, right))
        }
        BinaryOp::Add => match (left, right) {
            (Val::Str(_), _) | (_, Val::Str(_)) => {
                Val::Str(format!("{}{}", left.to_text(), right.to_text()))
            }
            _ => Val::Num(left.to_number() + right.to_number()),
        },
        BinaryOp::Sub => Val::Num(left.to_number() - right.to_number()),
        BinaryOp::Mul => Val::Num(left.to_number() * right.to_number()),
        BinaryOp::Div => Val::Num(left.to_number() / right.to_number()),
        BinaryOp::Rem => Val::Num(left.to_number() % right.to_number()),
    }
}

fn call(function: Function, args: &[Val]) -> Result<Val, EvalError> {
    let first = args.first().cloned().unwrap_or(Val::Undefined);
    Ok(match function {
        Function::Number => Val::Num(first.to_number()),
        Function::ParseInt => {
            let text = first.to_text();
            let text = text.trim_start();
            let sign_len = usize::from(text.starts_with(['-', '+']));
            let digits: String = text[sign_len..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                Val::Num(f64::NAN)
            } else {
                let n = digits.parse::<f64>().unwrap_or(f64::NAN);
                Val::Num(if text.starts_with('-') { -n } else { n })
            }
        }
        Function::ParseFloat => Val::Num(parse_leading_number(&first.to_text()).unwrap_or(f64::NAN)),
        Function::String => Val::Str(first.to_text()),
        Function::Boolean => Val::Bool(first.truthy()),
        Function::JsonParse => {
            let parsed = serde_json::from_str::<Value>(&first.to_text())
                .map_err(|e| EvalError::Json(e.to_string()))?;
            Val::from(&parsed)
        }
        Function::IsArray => Val::Bool(matches!(first, Val::List(_))),
    })
}

fn call_method(receiver: &Val, method: Method, args: &[Val]) -> Result<Val, EvalError> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or(Val::Undefined);
    if let Val::List(items) = receiver {
        return Ok(match method {
            Method::Includes => Val::Bool(items.iter().any(|item| loose_eq(item, &arg(0)))),
            Method::IndexOf => Val::Num(
                items
                    .iter()
                    .position(|item| loose_eq(item, &arg(0)))
                    .map_or(-1.0, |p| p as f64),
            ),
            Method::Slice => {
                let start = index_arg(args.first(), items.len(), 0, true);
                let end = index_arg(args.get(1), items.len(), items.len(), true);
                Val::List(items.get(start..end.max(start)).unwrap_or_default().to_vec())
            }
            Method::ToString => Val::Str(receiver.to_text()),
            other => {
                return Err(EvalError::BadReceiver {
                    method: method_name(other),
                    target: "array",
                })
            }
        });
    }

    let text = receiver.receiver_text(method_name(method))?;
    let len = text.chars().count();
    Ok(match method {
        Method::Includes => Val::Bool(text.contains(&arg(0).to_text())),
        Method::StartsWith => Val::Bool(text.starts_with(&arg(0).to_text())),
        Method::EndsWith => Val::Bool(text.ends_with(&arg(0).to_text())),
        Method::ToLowerCase => Val::Str(text.to_lowercase()),
        Method::ToUpperCase => Val::Str(text.to_uppercase()),
        Method::Trim => Val::Str(text.trim().to_string()),
        Method::ToString => Val::Str(text),
        Method::Split => match arg(0) {
            Val::Undefined => Val::List(vec![Val::Str(text)]),
            sep => {
                let sep = sep.to_text();
                if sep.is_empty() {
                    Val::List(text.chars().map(|c| Val::Str(c.to_string())).collect())
                } else {
                    Val::List(text.split(sep.as_str()).map(|s| Val::Str(s.to_string())).collect())
                }
            }
        },
        Method::IndexOf => Val::Num(
            text.find(&arg(0).to_text())
                .map_or(-1.0, |byte| text[..byte].chars().count() as f64),
        ),
        Method::Substring => {
            let a = index_arg(args.first(), len, 0, false);
            let b = index_arg(args.get(1), len, len, false);
            Val::Str(char_slice(&text, a.min(b), a.max(b)))
        }
        Method::Slice => {
            let a = index_arg(args.first(), len, 0, true);
            let b = index_arg(args.get(1), len, len, true);
            Val::Str(char_slice(&text, a, b))
        }
    })
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Includes => "includes",
        Method::StartsWith => "startsWith",
        Method::EndsWith => "endsWith",
        Method::ToLowerCase => "toLowerCase",
        Method::ToUpperCase => "toUpperCase",
        Method::Trim => "trim",
        Method::Split => "split",
        Method::IndexOf => "indexOf",
        Method::Substring => "substring",
        Method::Slice => "slice",
        Method::ToString => "toString",
    }
}
