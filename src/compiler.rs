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

//! # Expression Compiler
//!
//! Parses a query document into an executable [`Node`] tree, validating
//! arity and operator/mode compatibility synchronously, before any
//! evaluation occurs. A query document is compiled in **match mode** at
//! top level; `$expr` switches its subtree into **expression mode**. The
//! distinction is structural: match-mode field values are always literal
//! (no `"$path"` field-ref expansion) — that's precisely why `$expr`
//! exists as the bridge into the richer, field-ref-aware expression
//! grammar.

use std::str::FromStr;

use serde_json::Value as Json;

use crate::config::Config;
use crate::error::CompileError;
use crate::registry::{ModeKind, OpCode};
use crate::value::Value;

/// The compiled, document-independent query tree. Immutable after
/// compilation; may be evaluated against many documents concurrently.
#[derive(Debug, Clone)]
pub enum Node {
    Literal(Value),
    FieldRef(String),
    Operator(OpCode, Vec<Node>),
    BranchSwitch(Vec<(Node, Node)>, Option<Box<Node>>),
    Cond(Box<Node>, Box<Node>, Box<Node>),
}

/// Compiles a top-level query document in match mode.
pub fn compile(query: &Json, config: &Config) -> Result<Node, CompileError> {
    compile_match(query, 0, config)
}

fn check_depth(depth: usize, config: &Config) -> Result<(), CompileError> {
    if depth > config.max_depth {
        Err(CompileError::DepthExceeded(config.max_depth))
    } else {
        Ok(())
    }
}

// ============================================================================
// MATCH MODE
// ============================================================================

fn compile_match(value: &Json, depth: usize, config: &Config) -> Result<Node, CompileError> {
    check_depth(depth, config)?;
    let obj = value.as_object().ok_or_else(|| {
        CompileError::Other("match query must be a JSON object".to_string())
    })?;

    let mut children = Vec::with_capacity(obj.len());
    for (key, val) in obj {
        if let Some(stripped) = key.strip_prefix('$') {
            children.push(compile_match_combinator(stripped, key, val, depth, config)?);
        } else {
            children.push(compile_match_field(key, val, depth, config)?);
        }
    }
    Ok(Node::Operator(OpCode::And, children))
}

fn compile_match_combinator(
    stripped: &str,
    raw_key: &str,
    val: &Json,
    depth: usize,
    config: &Config,
) -> Result<Node, CompileError> {
    let op = OpCode::from_str(&format!("${stripped}"))
        .map_err(|_| CompileError::UnknownOperator(raw_key.to_string()))?;
    match op {
        OpCode::And | OpCode::Or | OpCode::Nor => {
            let arr = val.as_array().ok_or_else(|| CompileError::MalformedBranch {
                op: raw_key.to_string(),
                reason: "expects an array of subqueries".to_string(),
            })?;
            let children = arr
                .iter()
                .map(|v| compile_match(v, depth + 1, config))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Operator(op, children))
        }
        OpCode::Not => {
            let inner = compile_match(val, depth + 1, config)?;
            Ok(Node::Operator(OpCode::Not, vec![inner]))
        }
        OpCode::Expr => {
            let inner = compile_expr(val, depth + 1, config)?;
            Ok(Node::Operator(OpCode::Expr, vec![inner]))
        }
        _ => Err(CompileError::WrongMode {
            op: raw_key.to_string(),
            mode: "match",
        }),
    }
}

fn compile_match_field(
    field: &str,
    val: &Json,
    depth: usize,
    config: &Config,
) -> Result<Node, CompileError> {
    check_depth(depth, config)?;
    if let Some(obj) = val.as_object() {
        if obj.keys().next().map(|k| k.starts_with('$')).unwrap_or(false) {
            let mut clauses = Vec::with_capacity(obj.len());
            for (opname, opval) in obj {
                clauses.push(compile_match_field_op(field, opname, opval, depth, config)?);
            }
            return Ok(Node::Operator(OpCode::And, clauses));
        }
    }
    // Bare value shorthand: implicit $eq against a literal (no field-ref
    // expansion — match-mode values are always literal).
    Ok(Node::Operator(
        OpCode::Eq,
        vec![Node::FieldRef(field.to_string()), Node::Literal(Value::from(val.clone()))],
    ))
}

fn compile_match_field_op(
    field: &str,
    opname: &str,
    opval: &Json,
    depth: usize,
    config: &Config,
) -> Result<Node, CompileError> {
    if opname == "$not" {
        let inner = compile_match_field(field, opval, depth + 1, config)?;
        return Ok(Node::Operator(OpCode::Not, vec![inner]));
    }
    let op = OpCode::from_str(opname).map_err(|_| CompileError::UnknownOperator(opname.to_string()))?;
    if op.info().mode == ModeKind::ExprOnly {
        return Err(CompileError::WrongMode {
            op: opname.to_string(),
            mode: "match",
        });
    }
    validate_match_arg(op, opname, opval)?;
    Ok(Node::Operator(
        op,
        vec![
            Node::FieldRef(field.to_string()),
            Node::Literal(Value::from(opval.clone())),
        ],
    ))
}

fn validate_match_arg(op: OpCode, opname: &str, arg: &Json) -> Result<(), CompileError> {
    let malformed = |reason: &str| {
        Err(CompileError::MalformedBranch {
            op: opname.to_string(),
            reason: reason.to_string(),
        })
    };
    match op {
        OpCode::Exists => {
            if !arg.is_boolean() {
                return malformed("requires a boolean argument");
            }
        }
        OpCode::Size => {
            if !arg.is_i64() && !arg.is_u64() {
                return malformed("requires an integer argument");
            }
        }
        OpCode::Type => {
            let ok = arg.is_string()
                || arg.as_array().map(|a| a.iter().all(|v| v.is_string())).unwrap_or(false);
            if !ok {
                return malformed("requires a string or array of strings");
            }
        }
        OpCode::Mod => {
            if arg.as_array().map(|a| a.len() == 2).unwrap_or(false) {
                // ok
            } else {
                return malformed("requires a 2-element array [divisor, remainder]");
            }
        }
        OpCode::All => {
            if !arg.is_array() {
                return malformed("requires an array argument");
            }
        }
        OpCode::Matches => {
            if !arg.is_string() {
                return malformed("requires a string pattern");
            }
        }
        _ => {}
    }
    Ok(())
}

// ============================================================================
// EXPRESSION MODE
// ============================================================================

pub(crate) fn compile_expr(value: &Json, depth: usize, config: &Config) -> Result<Node, CompileError> {
    check_depth(depth, config)?;
    match value {
        Json::String(s) => {
            if let Some(path) = s.strip_prefix('$') {
                if !path.is_empty() {
                    return Ok(Node::FieldRef(path.to_string()));
                }
            }
            Ok(Node::Literal(Value::Str(s.clone())))
        }
        Json::Null | Json::Bool(_) | Json::Number(_) => Ok(Node::Literal(Value::from(value.clone()))),
        Json::Array(elems) => {
            let children = elems
                .iter()
                .map(|e| compile_expr(e, depth + 1, config))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Operator(OpCode::ArrayLit, children))
        }
        Json::Object(obj) => compile_expr_object(obj, depth, config),
    }
}

fn compile_expr_object(
    obj: &serde_json::Map<String, Json>,
    depth: usize,
    config: &Config,
) -> Result<Node, CompileError> {
    if obj.len() == 1 {
        let (key, val) = obj.iter().next().unwrap();
        if key == "$literal" {
            return Ok(Node::Literal(Value::from(val.clone())));
        }
        if key == "$cond" {
            return compile_cond(val, depth, config);
        }
        if key == "$switch" {
            return compile_switch(val, depth, config);
        }
        if key == "$ifNull" {
            let args = extract_args(val);
            if args.len() != 2 {
                return Err(CompileError::Arity {
                    op: "$ifNull".to_string(),
                    expected: 2,
                });
            }
            let children = args
                .iter()
                .map(|v| compile_expr(v, depth + 1, config))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Node::Operator(OpCode::IfNull, children));
        }
        if key.starts_with('$') {
            if let Ok(op) = OpCode::from_str(key) {
                if op.info().mode == ModeKind::MatchOnly {
                    return Err(CompileError::WrongMode {
                        op: key.clone(),
                        mode: "expression",
                    });
                }
                let args = extract_args(val);
                if !op.info().expr_arity.accepts(args.len()) {
                    return Err(CompileError::Arity {
                        op: key.clone(),
                        expected: op.info().expr_arity.reported(),
                    });
                }
                let children = args
                    .iter()
                    .map(|v| compile_expr(v, depth + 1, config))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Node::Operator(op, children));
            }
            return Err(CompileError::UnknownOperator(key.clone()));
        }
    } else if obj.keys().next().map(|k| k.starts_with('$')).unwrap_or(false) {
        // A subdocument opening with an operator key but carrying more than
        // one entry is malformed (mixing an operator with sibling fields).
        return Err(CompileError::MalformedBranch {
            op: obj.keys().next().cloned().unwrap_or_default(),
            reason: "operator subdocuments must have exactly one key".to_string(),
        });
    }

    // A literal object: recurse element-wise so nested "$path" strings are
    // still resolved, but the shape itself is preserved as a literal.
    let mut children = Vec::with_capacity(obj.len() * 2);
    for (k, v) in obj {
        children.push(Node::Literal(Value::Str(k.clone())));
        children.push(compile_expr(v, depth + 1, config)?);
    }
    Ok(Node::Operator(OpCode::ObjectLit, children))
}

fn extract_args(val: &Json) -> Vec<Json> {
    match val {
        Json::Array(a) => a.clone(),
        other => vec![other.clone()],
    }
}

fn compile_cond(val: &Json, depth: usize, config: &Config) -> Result<Node, CompileError> {
    let (if_, then, else_) = if let Some(arr) = val.as_array() {
        if arr.len() != 3 {
            return Err(CompileError::Arity {
                op: "$cond".to_string(),
                expected: 3,
            });
        }
        (&arr[0], &arr[1], &arr[2])
    } else if let Some(obj) = val.as_object() {
        let get = |k: &str| {
            obj.get(k).ok_or_else(|| CompileError::MalformedBranch {
                op: "$cond".to_string(),
                reason: format!("missing `{k}`"),
            })
        };
        return Ok(Node::Cond(
            Box::new(compile_expr(get("if")?, depth + 1, config)?),
            Box::new(compile_expr(get("then")?, depth + 1, config)?),
            Box::new(compile_expr(get("else")?, depth + 1, config)?),
        ));
    } else {
        return Err(CompileError::MalformedBranch {
            op: "$cond".to_string(),
            reason: "expects an array [if, then, else] or an {if, then, else} object".to_string(),
        });
    };
    Ok(Node::Cond(
        Box::new(compile_expr(if_, depth + 1, config)?),
        Box::new(compile_expr(then, depth + 1, config)?),
        Box::new(compile_expr(else_, depth + 1, config)?),
    ))
}

fn compile_switch(val: &Json, depth: usize, config: &Config) -> Result<Node, CompileError> {
    let obj = val.as_object().ok_or_else(|| CompileError::MalformedBranch {
        op: "$switch".to_string(),
        reason: "expects an object with `branches` and optional `default`".to_string(),
    })?;
    let branches_json = obj
        .get("branches")
        .and_then(|b| b.as_array())
        .ok_or_else(|| CompileError::MalformedBranch {
            op: "$switch".to_string(),
            reason: "missing `branches` array".to_string(),
        })?;

    let mut branches = Vec::with_capacity(branches_json.len());
    for b in branches_json {
        let b_obj = b.as_object().ok_or_else(|| CompileError::MalformedBranch {
            op: "$switch".to_string(),
            reason: "each branch must be an object with `case` and `then`".to_string(),
        })?;
        let case = b_obj.get("case").ok_or_else(|| CompileError::MalformedBranch {
            op: "$switch".to_string(),
            reason: "branch missing `case`".to_string(),
        })?;
        let then = b_obj.get("then").ok_or_else(|| CompileError::MalformedBranch {
            op: "$switch".to_string(),
            reason: "branch missing `then`".to_string(),
        })?;
        branches.push((
            compile_expr(case, depth + 1, config)?,
            compile_expr(then, depth + 1, config)?,
        ));
    }

    let default = match obj.get("default") {
        Some(d) => Some(Box::new(compile_expr(d, depth + 1, config)?)),
        None => None,
    };

    Ok(Node::BranchSwitch(branches, default))
}
