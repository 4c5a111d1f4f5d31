/*
 * AEVUMDB COMMUNITY LICENSE
 * Version 1.0, February 2026
 *
 * Copyright (c) 2026 Ananda Firmansyah.
 * Official Organization: AevumDB (https://github.com/aevumdb)
 *
 * This source code is licensed under the AevumDB Community License.
 * You may not use this file except in compliance with the License.
 * A copy of the License is located at the root of this repository.
 *
 * UNLESS REQUIRED BY APPLICABLE LAW OR AGREED TO IN WRITING, SOFTWARE
 * DISTRIBUTED UNDER THE LICENSE IS PROVIDED "AS IS", WITHOUT WARRANTY
 * OF ANY KIND, EITHER EXPRESS OR IMPLIED.
 */

//! # Evaluator
//!
//! Two entry points walk a compiled [`Node`] tree against a document:
//! [`eval_match`] (boolean, match-mode semantics) and [`eval_expr`]
//! (value-producing, expression-mode semantics). They are kept as separate
//! functions rather than one unified tree-walk because `$eq`'s match-mode
//! "matches the field or any element of it" fallback must never leak into
//! expression mode's strict equality — that's the entire reason `$expr`
//! exists as a distinct entry point in the source grammar.
//!
//! A document that raises an [`EvalError`] partway through a match is
//! treated as non-matching by [`eval_match`], never propagated — the
//! Filter Driver only ever sees compile errors or source errors.

use std::cmp::Ordering;

use crate::compiler::Node;
use crate::error::EvalError;
use crate::regex_cache::RegexCache;
use crate::registry::OpCode;
use crate::value::{Fields, Value};
use crate::path::resolve_path;

/// Evaluates `node` against `doc` in match mode. Any internal evaluation
/// error is swallowed and reported as a non-match.
pub fn eval_match(doc: &Value, node: &Node, cache: &RegexCache) -> bool {
    eval_match_inner(doc, node, cache).unwrap_or(false)
}

/// Evaluates `node` against `doc` in expression mode, producing a `Value`.
pub fn eval_expr(doc: &Value, node: &Node, cache: &RegexCache) -> Result<Value, EvalError> {
    eval_expr_inner(doc, node, cache)
}

// ============================================================================
// MATCH MODE
// ============================================================================

fn eval_match_inner(doc: &Value, node: &Node, cache: &RegexCache) -> Result<bool, EvalError> {
    match node {
        Node::Operator(OpCode::And, children) => {
            for c in children {
                if !eval_match_inner(doc, c, cache)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Node::Operator(OpCode::Or, children) => {
            for c in children {
                if eval_match_inner(doc, c, cache)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Node::Operator(OpCode::Nor, children) => {
            for c in children {
                if eval_match_inner(doc, c, cache)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Node::Operator(OpCode::Not, children) => Ok(!eval_match_inner(doc, &children[0], cache)?),
        Node::Operator(OpCode::Expr, children) => {
            let v = eval_expr_inner(doc, &children[0], cache)?;
            Ok(v.to_bool_loose())
        }
        Node::Operator(op, children) => eval_field_predicate(doc, *op, children, cache),
        other => Err(EvalError::Other(format!("{other:?} is not a valid match node"))),
    }
}

fn eval_field_predicate(
    doc: &Value,
    op: OpCode,
    children: &[Node],
    cache: &RegexCache,
) -> Result<bool, EvalError> {
    let path = match &children[0] {
        Node::FieldRef(p) => p.as_str(),
        other => return Err(EvalError::Other(format!("expected field ref, got {other:?}"))),
    };
    let arg = match &children[1] {
        Node::Literal(v) => v,
        other => return Err(EvalError::Other(format!("expected literal argument, got {other:?}"))),
    };
    let field_val = resolve_path(doc, path);

    match op {
        OpCode::Eq => Ok(eq_with_fanout(&field_val, arg)),
        OpCode::Ne => Ok(!eq_with_fanout(&field_val, arg)),
        OpCode::Gt => Ok(cmp_match(&field_val, arg, |o| o == Ordering::Greater)),
        OpCode::Gte => Ok(cmp_match(&field_val, arg, |o| o != Ordering::Less)),
        OpCode::Lt => Ok(cmp_match(&field_val, arg, |o| o == Ordering::Less)),
        OpCode::Lte => Ok(cmp_match(&field_val, arg, |o| o != Ordering::Greater)),
        OpCode::In => Ok(in_with_fanout(&field_val, arg)),
        OpCode::Nin => Ok(!in_with_fanout(&field_val, arg)),
        OpCode::Exists => {
            let want = matches!(arg, Value::Bool(true));
            Ok(!field_val.is_missing() == want)
        }
        OpCode::Type => Ok(type_matches(&field_val, arg)),
        OpCode::Size => {
            let want = arg.as_i64().unwrap_or(-1);
            Ok(matches!(&field_val, Value::Array(a) if a.len() as i64 == want))
        }
        OpCode::All => Ok(all_matches(&field_val, arg)),
        OpCode::Mod => Ok(mod_match_fanout(&field_val, arg)),
        OpCode::Matches => matches_regex_fanout(&field_val, arg, cache),
        other => Err(EvalError::Other(format!("{other:?} is not a field-predicate operator"))),
    }
}

fn eq_with_fanout(field_val: &Value, arg: &Value) -> bool {
    if field_val.deep_eq(arg) {
        return true;
    }
    if let Value::Array(elems) = field_val {
        return elems.iter().any(|e| e.deep_eq(arg));
    }
    false
}

fn in_with_fanout(field_val: &Value, arg: &Value) -> bool {
    let Value::Array(candidates) = arg else {
        return false;
    };
    if candidates.iter().any(|c| c.deep_eq(field_val)) {
        return true;
    }
    if let Value::Array(elems) = field_val {
        return elems.iter().any(|e| candidates.iter().any(|c| c.deep_eq(e)));
    }
    false
}

fn cmp_match(field_val: &Value, arg: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    if field_val.is_missing() {
        return false;
    }
    if let Value::Array(elems) = field_val {
        return elems.iter().any(|e| accept(e.cmp_canonical(arg)));
    }
    accept(field_val.cmp_canonical(arg))
}

/// `"boolean"` is accepted as a synonym for the canonical `"bool"` type name.
fn normalize_type_name(name: &str) -> &str {
    if name == "boolean" {
        "bool"
    } else {
        name
    }
}

fn type_matches(field_val: &Value, arg: &Value) -> bool {
    let Some(ty) = field_val.type_name() else {
        return false;
    };
    match arg {
        Value::Str(s) => normalize_type_name(s) == ty,
        Value::Array(names) => names
            .iter()
            .any(|n| matches!(n, Value::Str(s) if normalize_type_name(s) == ty)),
        _ => false,
    }
}

fn all_matches(field_val: &Value, arg: &Value) -> bool {
    let (Value::Array(wanted), Value::Array(have)) = (arg, field_val) else {
        return false;
    };
    wanted.iter().all(|w| have.iter().any(|h| h.deep_eq(w)))
}

fn mod_divisor_remainder(arg: &Value) -> Option<(i64, i64)> {
    let Value::Array(pair) = arg else { return None };
    if pair.len() != 2 {
        return None;
    }
    Some((pair[0].as_i64()?, pair[1].as_i64()?))
}

fn mod_match_fanout(field_val: &Value, arg: &Value) -> bool {
    let Some((d, r)) = mod_divisor_remainder(arg) else {
        return false;
    };
    if d == 0 {
        return false;
    }
    let test = |v: &Value| v.as_i64().map(|n| n % d == r).unwrap_or(false);
    if let Value::Array(elems) = field_val {
        elems.iter().any(test)
    } else {
        test(field_val)
    }
}

fn matches_regex_fanout(field_val: &Value, arg: &Value, cache: &RegexCache) -> Result<bool, EvalError> {
    let Value::Str(pattern) = arg else {
        return Ok(false);
    };
    let re = cache.get_or_compile(pattern)?;
    let test = |v: &Value| matches!(v, Value::Str(s) if re.is_match(s));
    Ok(match field_val {
        Value::Array(elems) => elems.iter().any(test),
        other => test(other),
    })
}

// ============================================================================
// EXPRESSION MODE
// ============================================================================

fn eval_expr_inner(doc: &Value, node: &Node, cache: &RegexCache) -> Result<Value, EvalError> {
    match node {
        Node::Literal(v) => Ok(v.clone()),
        Node::FieldRef(path) => Ok(resolve_path(doc, path)),
        Node::Cond(if_, then, else_) => {
            let cond = eval_expr_inner(doc, if_, cache)?;
            if cond.to_bool_loose() {
                eval_expr_inner(doc, then, cache)
            } else {
                eval_expr_inner(doc, else_, cache)
            }
        }
        Node::BranchSwitch(branches, default) => {
            for (case, then) in branches {
                let c = eval_expr_inner(doc, case, cache)?;
                if c.to_bool_loose() {
                    return eval_expr_inner(doc, then, cache);
                }
            }
            match default {
                Some(d) => eval_expr_inner(doc, d, cache),
                None => Err(EvalError::Other("$switch: no branch matched and no default given".to_string())),
            }
        }
        Node::Operator(op, children) => eval_operator(doc, *op, children, cache),
    }
}

fn eval_children(doc: &Value, children: &[Node], cache: &RegexCache) -> Result<Vec<Value>, EvalError> {
    children.iter().map(|c| eval_expr_inner(doc, c, cache)).collect()
}

fn eval_operator(doc: &Value, op: OpCode, children: &[Node], cache: &RegexCache) -> Result<Value, EvalError> {
    match op {
        OpCode::ArrayLit => Ok(Value::Array(eval_children(doc, children, cache)?)),
        OpCode::ObjectLit => {
            let vals = eval_children(doc, children, cache)?;
            let mut fields = Fields::new();
            for pair in vals.chunks(2) {
                if let [Value::Str(k), v] = pair {
                    fields.insert(k.clone(), v.clone());
                }
            }
            Ok(Value::Object(fields))
        }
        OpCode::IfNull => {
            let a = eval_expr_inner(doc, &children[0], cache)?;
            if !a.is_nullish() {
                return Ok(a);
            }
            eval_expr_inner(doc, &children[1], cache)
        }

        // --- Comparison: strict, no array fan-out ---
        OpCode::Eq | OpCode::Ne | OpCode::Gt | OpCode::Gte | OpCode::Lt | OpCode::Lte | OpCode::Cmp => {
            let vals = eval_children(doc, children, cache)?;
            let ord = vals[0].cmp_canonical(&vals[1]);
            Ok(match op {
                OpCode::Eq => Value::Bool(ord == Ordering::Equal),
                OpCode::Ne => Value::Bool(ord != Ordering::Equal),
                OpCode::Gt => Value::Bool(ord == Ordering::Greater),
                OpCode::Gte => Value::Bool(ord != Ordering::Less),
                OpCode::Lt => Value::Bool(ord == Ordering::Less),
                OpCode::Lte => Value::Bool(ord != Ordering::Greater),
                OpCode::Cmp => Value::Int(match ord {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                }),
                _ => unreachable!(),
            })
        }
        OpCode::In | OpCode::Nin => {
            let vals = eval_children(doc, children, cache)?;
            let found = match &vals[1] {
                Value::Array(arr) => arr.iter().any(|e| e.deep_eq(&vals[0])),
                _ => false,
            };
            Ok(Value::Bool(if op == OpCode::In { found } else { !found }))
        }

        // --- Logical ---
        OpCode::And => {
            let vals = eval_children(doc, children, cache)?;
            Ok(Value::Bool(vals.iter().all(|v| v.to_bool_loose())))
        }
        OpCode::Or => {
            let vals = eval_children(doc, children, cache)?;
            Ok(Value::Bool(vals.iter().any(|v| v.to_bool_loose())))
        }
        OpCode::Not => {
            let v = eval_expr_inner(doc, &children[0], cache)?;
            Ok(Value::Bool(!v.to_bool_loose()))
        }

        // --- Arithmetic ---
        OpCode::Add | OpCode::Subtract | OpCode::Multiply | OpCode::Divide => {
            eval_binary_arith(doc, op, children, cache)
        }
        OpCode::Abs | OpCode::Ceil | OpCode::Floor | OpCode::Sqrt => {
            let v = eval_expr_inner(doc, &children[0], cache)?;
            if v.is_nullish() {
                return Ok(Value::Null);
            }
            let n = require_number(&v, op.info().name)?;
            Ok(match op {
                OpCode::Abs => Value::from_f64_preferring_int(n.abs()),
                OpCode::Ceil => Value::from_f64_preferring_int(n.ceil()),
                OpCode::Floor => Value::from_f64_preferring_int(n.floor()),
                OpCode::Sqrt => {
                    if n < 0.0 {
                        Value::Float(f64::NAN)
                    } else {
                        Value::from_f64_preferring_int(n.sqrt())
                    }
                }
                _ => unreachable!(),
            })
        }
        OpCode::Round | OpCode::Trunc => {
            let v = eval_expr_inner(doc, &children[0], cache)?;
            if v.is_nullish() {
                return Ok(Value::Null);
            }
            let n = require_number(&v, op.info().name)?;
            let places = if children.len() > 1 {
                let p = eval_expr_inner(doc, &children[1], cache)?;
                if p.is_nullish() {
                    return Ok(Value::Null);
                }
                p.as_i64().unwrap_or(0)
            } else {
                0
            };
            let factor = 10f64.powi(places as i32);
            let scaled = n * factor;
            let result = if op == OpCode::Round {
                round_half_to_even(scaled)
            } else {
                scaled.trunc()
            };
            Ok(Value::from_f64_preferring_int(result / factor))
        }
        OpCode::Max | OpCode::Min => {
            let vals = eval_children(doc, children, cache)?;
            let mut best: Option<Value> = None;
            for v in vals {
                if v.is_nullish() {
                    continue;
                }
                best = Some(match best {
                    None => v,
                    Some(b) => {
                        let ord = v.cmp_canonical(&b);
                        let take_new = if op == OpCode::Max { ord == Ordering::Greater } else { ord == Ordering::Less };
                        if take_new { v } else { b }
                    }
                });
            }
            Ok(best.unwrap_or(Value::Null))
        }

        OpCode::Mod => {
            let vals = eval_children(doc, children, cache)?;
            if vals[0].is_nullish() || vals[1].is_nullish() {
                return Ok(Value::Null);
            }
            let a = require_number(&vals[0], "$mod")?;
            let b = require_number(&vals[1], "$mod")?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero { op: "$mod".to_string() });
            }
            Ok(Value::from_f64_preferring_int(a % b))
        }

        // --- String ---
        OpCode::ToLower => Ok(Value::Str(require_str(&eval_expr_inner(doc, &children[0], cache)?, "$toLower")?.to_lowercase())),
        OpCode::ToUpper => Ok(Value::Str(require_str(&eval_expr_inner(doc, &children[0], cache)?, "$toUpper")?.to_uppercase())),
        OpCode::Concat => {
            let vals = eval_children(doc, children, cache)?;
            let mut out = String::new();
            for v in &vals {
                if v.is_nullish() {
                    return Ok(Value::Null);
                }
                out.push_str(&to_display_string(v));
            }
            Ok(Value::Str(out))
        }
        OpCode::Split => {
            let vals = eval_children(doc, children, cache)?;
            let s = require_str(&vals[0], "$split")?;
            let delim = require_str(&vals[1], "$split")?;
            Ok(Value::Array(s.split(delim).map(|p| Value::Str(p.to_string())).collect()))
        }
        OpCode::Substr | OpCode::SubstrBytes => {
            let vals = eval_children(doc, children, cache)?;
            let s = require_str(&vals[0], op.info().name)?;
            let start = vals[1].as_i64().unwrap_or(0);
            let len = vals[2].as_i64().unwrap_or(-1);
            Ok(Value::Str(substring(s, start, len, op == OpCode::SubstrBytes)))
        }
        OpCode::StrLenBytes => {
            let s = require_str(&eval_expr_inner(doc, &children[0], cache)?, "$strLenBytes")?;
            Ok(Value::Int(s.len() as i64))
        }
        OpCode::Strcasecmp => {
            let vals = eval_children(doc, children, cache)?;
            let a = require_str(&vals[0], "$strcasecmp")?;
            let b = require_str(&vals[1], "$strcasecmp")?;
            Ok(Value::Int(Value::strcasecmp(a, b)))
        }
        OpCode::Contains => {
            let vals = eval_children(doc, children, cache)?;
            let a = require_str(&vals[0], "$contains")?;
            let b = require_str(&vals[1], "$contains")?;
            Ok(Value::Bool(a.contains(b)))
        }
        OpCode::StartsWith => {
            let vals = eval_children(doc, children, cache)?;
            let a = require_str(&vals[0], "$startsWith")?;
            let b = require_str(&vals[1], "$startsWith")?;
            Ok(Value::Bool(a.starts_with(b)))
        }
        OpCode::EndsWith => {
            let vals = eval_children(doc, children, cache)?;
            let a = require_str(&vals[0], "$endsWith")?;
            let b = require_str(&vals[1], "$endsWith")?;
            Ok(Value::Bool(a.ends_with(b)))
        }
        OpCode::Trim | OpCode::Ltrim | OpCode::Rtrim => {
            let vals = eval_children(doc, children, cache)?;
            let s = require_str(&vals[0], op.info().name)?;
            let chars: Option<&str> = if vals.len() > 1 { Some(require_str(&vals[1], op.info().name)?) } else { None };
            let pat: &[char] = &chars.map(|c| c.chars().collect::<Vec<_>>()).unwrap_or_else(|| vec![' ', '\t', '\n', '\r']);
            Ok(Value::Str(
                match op {
                    OpCode::Trim => s.trim_matches(pat),
                    OpCode::Ltrim => s.trim_start_matches(pat),
                    OpCode::Rtrim => s.trim_end_matches(pat),
                    _ => unreachable!(),
                }
                .to_string(),
            ))
        }

        // --- Type conversion ---
        OpCode::IsNumber => Ok(Value::Bool(eval_expr_inner(doc, &children[0], cache)?.is_number())),
        OpCode::ToStringOp => Ok(Value::Str(to_display_string(&eval_expr_inner(doc, &children[0], cache)?))),
        OpCode::ToBool => Ok(Value::Bool(eval_expr_inner(doc, &children[0], cache)?.to_bool_loose())),
        OpCode::ToBoolEx => Ok(Value::Bool(eval_expr_inner(doc, &children[0], cache)?.to_bool_strict())),
        OpCode::ToLong | OpCode::ToInt => {
            let v = eval_expr_inner(doc, &children[0], cache)?;
            if v.is_nullish() {
                return Ok(Value::Null);
            }
            match &v {
                Value::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| EvalError::UnsupportedType { op: op.info().name.to_string(), ty: "string" }),
                other => require_number(other, op.info().name).map(|n| Value::Int(n as i64)),
            }
        }
        OpCode::ToDecimal => {
            let v = eval_expr_inner(doc, &children[0], cache)?;
            if v.is_nullish() {
                return Ok(Value::Null);
            }
            match &v {
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| EvalError::UnsupportedType { op: "$toDecimal".to_string(), ty: "string" }),
                other => require_number(other, "$toDecimal").map(Value::Float),
            }
        }

        other => Err(EvalError::Other(format!("{other:?} is not valid in expression mode"))),
    }
}

fn eval_binary_arith(doc: &Value, op: OpCode, children: &[Node], cache: &RegexCache) -> Result<Value, EvalError> {
    let vals = eval_children(doc, children, cache)?;
    if vals.iter().any(|v| v.is_nullish()) {
        return Ok(Value::Null);
    }
    let name = op.info().name;
    match op {
        OpCode::Add => {
            let mut sum = 0.0;
            for v in &vals {
                sum += require_number(v, name)?;
            }
            Ok(Value::from_f64_preferring_int(sum))
        }
        OpCode::Multiply => {
            let mut prod = 1.0;
            for v in &vals {
                prod *= require_number(v, name)?;
            }
            Ok(Value::from_f64_preferring_int(prod))
        }
        OpCode::Subtract => {
            let a = require_number(&vals[0], name)?;
            let b = require_number(&vals[1], name)?;
            Ok(Value::from_f64_preferring_int(a - b))
        }
        OpCode::Divide => {
            let a = require_number(&vals[0], name)?;
            let b = require_number(&vals[1], name)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero { op: name.to_string() });
            }
            Ok(Value::from_f64_preferring_int(a / b))
        }
        _ => unreachable!(),
    }
}

fn round_half_to_even(x: f64) -> f64 {
    let floor = x.floor();
    let diff = x - floor;
    if (diff - 0.5).abs() < f64::EPSILON {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        x.round()
    }
}

/// `$substrBytes` slices by raw byte offset (clamped to a UTF-8 boundary);
/// `$substr` slices by Unicode scalar value.
fn substring(s: &str, start: i64, len: i64, by_bytes: bool) -> String {
    if by_bytes {
        let total = s.len() as i64;
        let start = start.clamp(0, total) as usize;
        let end = if len < 0 { total } else { (start as i64 + len).min(total) } as usize;
        if start >= end {
            return String::new();
        }
        let mut start = start;
        let mut end = end;
        while start < s.len() && !s.is_char_boundary(start) {
            start += 1;
        }
        while end < s.len() && !s.is_char_boundary(end) {
            end += 1;
        }
        s.get(start..end).unwrap_or_default().to_string()
    } else {
        let units: Vec<char> = s.chars().collect();
        let total = units.len() as i64;
        let start = start.clamp(0, total);
        let end = if len < 0 { total } else { (start + len).min(total) };
        if start >= end {
            return String::new();
        }
        units[start as usize..end as usize].iter().collect()
    }
}

fn require_number(v: &Value, op: &str) -> Result<f64, EvalError> {
    v.as_f64().ok_or_else(|| EvalError::UnsupportedType {
        op: op.to_string(),
        ty: v.type_name().unwrap_or("missing"),
    })
}

fn require_str<'a>(v: &'a Value, op: &str) -> Result<&'a str, EvalError> {
    v.as_str().ok_or_else(|| EvalError::UnsupportedType {
        op: op.to_string(),
        ty: v.type_name().unwrap_or("missing"),
    })
}

fn to_display_string(v: &Value) -> String {
    match v {
        Value::Str(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Missing => String::new(),
        other => serde_json::Value::from(other.clone()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::Config;
    use serde_json::json;

    fn cache() -> RegexCache {
        RegexCache::default()
    }

    fn doc(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    #[test]
    fn implicit_eq_matches_scalar_field() {
        let node = compile(&json!({"status": "completed"}), &Config::default()).unwrap();
        let d = doc(json!({"status": "completed"}));
        assert!(eval_match(&d, &node, &cache()));
        let d2 = doc(json!({"status": "failed"}));
        assert!(!eval_match(&d2, &node, &cache()));
    }

    #[test]
    fn eq_matches_any_array_element() {
        let node = compile(&json!({"tags": "urgent"}), &Config::default()).unwrap();
        let d = doc(json!({"tags": ["low", "urgent", "high"]}));
        assert!(eval_match(&d, &node, &cache()));
    }

    #[test]
    fn gt_operator_field_predicate() {
        let node = compile(&json!({"attemptsMade": {"$gt": 2}}), &Config::default()).unwrap();
        assert!(eval_match(&doc(json!({"attemptsMade": 3})), &node, &cache()));
        assert!(!eval_match(&doc(json!({"attemptsMade": 2})), &node, &cache()));
    }

    #[test]
    fn exists_distinguishes_missing_from_null() {
        let node = compile(&json!({"failedReason": {"$exists": true}}), &Config::default()).unwrap();
        assert!(eval_match(&doc(json!({"failedReason": null})), &node, &cache()));
        assert!(!eval_match(&doc(json!({})), &node, &cache()));
    }

    #[test]
    fn implicit_eq_null_matches_present_null_and_absent() {
        let node = compile(&json!({"item": null}), &Config::default()).unwrap();
        assert!(eval_match(&doc(json!({"item": null})), &node, &cache()));
        assert!(eval_match(&doc(json!({})), &node, &cache()));
    }

    #[test]
    fn in_with_null_matches_absent_field() {
        let node = compile(&json!({"item": {"$in": [null, "widget"]}}), &Config::default()).unwrap();
        assert!(eval_match(&doc(json!({})), &node, &cache()));
        assert!(eval_match(&doc(json!({"item": null})), &node, &cache()));
        assert!(eval_match(&doc(json!({"item": "widget"})), &node, &cache()));
        assert!(!eval_match(&doc(json!({"item": "gadget"})), &node, &cache()));
    }

    #[test]
    fn type_bool_and_boolean_are_synonyms() {
        let bool_node = compile(&json!({"active": {"$type": "bool"}}), &Config::default()).unwrap();
        let boolean_node = compile(&json!({"active": {"$type": "boolean"}}), &Config::default()).unwrap();
        let d = doc(json!({"active": true}));
        assert!(eval_match(&d, &bool_node, &cache()));
        assert!(eval_match(&d, &boolean_node, &cache()));
    }

    #[test]
    fn and_or_nor_combinators() {
        let node = compile(
            &json!({"$or": [{"status": "completed"}, {"priority": {"$gt": 5}}]}),
            &Config::default(),
        )
        .unwrap();
        assert!(eval_match(&doc(json!({"priority": 10})), &node, &cache()));
        assert!(!eval_match(&doc(json!({"priority": 1})), &node, &cache()));
    }

    #[test]
    fn expr_cross_field_comparison() {
        let node = compile(
            &json!({"$expr": {"$gt": ["$processedOn", "$timestamp"]}}),
            &Config::default(),
        )
        .unwrap();
        assert!(eval_match(&doc(json!({"processedOn": 20, "timestamp": 10})), &node, &cache()));
        assert!(!eval_match(&doc(json!({"processedOn": 5, "timestamp": 10})), &node, &cache()));
    }

    #[test]
    fn arithmetic_null_propagation() {
        let node = compile_expr_helper(&json!({"$add": ["$a", "$b"]}));
        let result = eval_expr(&doc(json!({"a": 1})), &node, &cache()).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn max_ignores_nullish_operands() {
        let node = compile_expr_helper(&json!({"$max": ["$a", "$b", 7]}));
        let result = eval_expr(&doc(json!({"a": 3})), &node, &cache()).unwrap();
        assert_eq!(result, Value::Int(7));
    }

    #[test]
    fn round_half_to_even_matches_banker_rounding() {
        let node = compile_expr_helper(&json!({"$round": [2.5]}));
        assert_eq!(eval_expr(&doc(json!({})), &node, &cache()).unwrap(), Value::Int(2));
        let node = compile_expr_helper(&json!({"$round": [3.5]}));
        assert_eq!(eval_expr(&doc(json!({})), &node, &cache()).unwrap(), Value::Int(4));
    }

    #[test]
    fn trunc_rounds_toward_zero() {
        let node = compile_expr_helper(&json!({"$trunc": [-2.7]}));
        assert_eq!(eval_expr(&doc(json!({})), &node, &cache()).unwrap(), Value::Int(-2));
    }

    #[test]
    fn sqrt_of_negative_is_nan_not_error() {
        let node = compile_expr_helper(&json!({"$sqrt": [-4]}));
        match eval_expr(&doc(json!({})), &node, &cache()).unwrap() {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected NaN float, got {other:?}"),
        }
    }

    #[test]
    fn to_bool_and_to_bool_ex_diverge_on_empty_string() {
        let node = compile_expr_helper(&json!({"$toBool": ""}));
        assert_eq!(eval_expr(&doc(json!({})), &node, &cache()).unwrap(), Value::Bool(true));
        let node = compile_expr_helper(&json!({"$toBoolEx": ""}));
        assert_eq!(eval_expr(&doc(json!({})), &node, &cache()).unwrap(), Value::Bool(false));
    }

    #[test]
    fn cond_picks_branch() {
        let node = compile_expr_helper(&json!({"$cond": [{"$gt": ["$qty", 100]}, "bulk", "retail"]}));
        assert_eq!(
            eval_expr(&doc(json!({"qty": 120})), &node, &cache()).unwrap(),
            Value::Str("bulk".into())
        );
        assert_eq!(
            eval_expr(&doc(json!({"qty": 10})), &node, &cache()).unwrap(),
            Value::Str("retail".into())
        );
    }

    #[test]
    fn switch_falls_through_to_default() {
        let node = compile_expr_helper(&json!({
            "$switch": {
                "branches": [{"case": {"$eq": ["$x", 1]}, "then": "one"}],
                "default": "other"
            }
        }));
        assert_eq!(
            eval_expr(&doc(json!({"x": 2})), &node, &cache()).unwrap(),
            Value::Str("other".into())
        );
    }

    #[test]
    fn matches_regex_field_predicate() {
        let node = compile(&json!({"name": {"$matches": "^send.*"}}), &Config::default()).unwrap();
        assert!(eval_match(&doc(json!({"name": "sendEmail"})), &node, &cache()));
        assert!(!eval_match(&doc(json!({"name": "renderPdf"})), &node, &cache()));
    }

    fn compile_expr_helper(v: &serde_json::Value) -> Node {
        crate::compiler::compile_expr(v, 0, &Config::default()).unwrap()
    }
}
